use std::collections::HashMap;

use crate::fan::Fan;
use crate::object::SceneObject;
use crate::query::{SceneQuery, WindSource};
use crate::transform::Transform;
use crate::V3;

/// Self-contained `SceneQuery` implementation: a fixed object list with
/// optional per-object origin tracks (piecewise-linear) and a set of
/// fans. Used by the bench driver and the tests; a host editor plugs in
/// its own adapter instead.
#[derive(Default)]
pub struct StaticScene {
	objects: Vec<SceneObject>,
	tracks: HashMap<usize, Vec<(f64, V3)>>,
	fans: Vec<Fan>,
}

impl StaticScene {
	pub fn add_object(&mut self, obj: SceneObject) {
		self.objects.push(obj);
	}

	/// Attach an origin track to an object. Keys must be sorted by time.
	pub fn add_track(&mut self, id: usize, keys: Vec<(f64, V3)>) {
		self.tracks.insert(id, keys);
	}

	pub fn add_fan(&mut self, fan: Fan) {
		self.fans.push(fan);
	}

	fn track_origin(&self, id: usize, time: f64) -> Option<V3> {
		let keys = self.tracks.get(&id)?;
		let (first, last) = (keys.first()?, keys.last()?);
		if time <= first.0 {
			return Some(first.1);
		}
		if time >= last.0 {
			return Some(last.1);
		}
		let i = keys.partition_point(|k| k.0 <= time) - 1;
		let (t0, p0) = keys[i];
		let (t1, p1) = keys[i + 1];
		let s = (time - t0) / (t1 - t0);
		Some(p0 + (p1 - p0) * s)
	}
}

impl SceneQuery for StaticScene {
	fn objects(&self) -> Vec<SceneObject> {
		self.objects.clone()
	}

	fn object_at(&self, id: usize, time: f64) -> Option<SceneObject> {
		let obj = self.objects.iter().find(|o| o.id == id)?;
		let mut obj = obj.clone();
		if let Some(origin) = self.track_origin(id, time) {
			let delta = origin - obj.transform.origin();
			let shift = Transform::translation(delta);
			obj.transform = Transform {
				from_local: shift.from_local * obj.transform.from_local,
				to_local: obj.transform.to_local * shift.to_local,
			};
		}
		Some(obj)
	}

	fn origin_at(&self, id: usize, time: f64) -> Option<V3> {
		if let Some(origin) = self.track_origin(id, time) {
			return Some(origin);
		}
		self.objects
			.iter()
			.find(|o| o.id == id)
			.map(|o| o.transform.origin())
	}

	fn wind_sources(&self) -> Vec<&dyn WindSource> {
		self.fans.iter().map(|f| f as &dyn WindSource).collect()
	}
}
