use crate::object::SceneObject;
use crate::V3;

/// Host-provided wind emitter. Force may be stochastic, see `Fan`.
pub trait WindSource {
	fn force_at(&self, world_pos: V3) -> V3;
}

/// Read-only view of the host scene. The solver samples it at sub-step
/// boundaries only; implementations apply their own animation tracks
/// when asked for a specific time.
pub trait SceneQuery {
	/// Snapshot of every object at its current pose.
	fn objects(&self) -> Vec<SceneObject>;

	/// One object with its animation applied at `time`.
	fn object_at(&self, id: usize, time: f64) -> Option<SceneObject>;

	/// World-space origin of the object at `time`, the signal used for
	/// the moved-between-samples check. Rotation-only motion is
	/// invisible here, a documented limitation of the sampling scheme.
	fn origin_at(&self, id: usize, time: f64) -> Option<V3>;

	fn wind_sources(&self) -> Vec<&dyn WindSource>;
}
