use serde::{Deserialize, Serialize};

/// Full cloth state at one instant: the triangulated surface with the
/// per-vertex dynamic state. Springs are not stored, they are
/// reconstructed from the face topology on load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshRecord {
	pub vertices: Vec<[f64; 3]>,
	pub velocities: Vec<[f64; 3]>,
	pub faces: Vec<[usize; 3]>,
	pub pinned: Vec<bool>,
	pub vertex_mass: f64,
}
