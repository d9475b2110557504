use std::collections::BTreeMap;

use record::frame::{FrameRecord, TimelineRecord};

use crate::error::Error;
use crate::mesh::ClothMesh;
use crate::params::SimParams;

/// Immutable snapshot of the cloth at one frame. The mesh is deep
/// copied at construction so later simulation cannot corrupt history.
pub struct SimFrame {
	pub frame: i32,
	pub time: f64,
	pub mesh: ClothMesh,
}

impl SimFrame {
	pub fn new(frame: i32, fps: f64, mesh: &ClothMesh) -> Self {
		Self {
			frame,
			time: frame as f64 / fps,
			mesh: mesh.duplicate(),
		}
	}
}

/// Frame store keyed by frame number, plus the single-slot drape
/// register holding the last intermediate sub-step (cheap to recompute,
/// expensive to keep at full fidelity).
#[derive(Default)]
pub struct Timeline {
	frames: BTreeMap<i32, SimFrame>,
	last_drape: Option<SimFrame>,
}

impl Timeline {
	pub fn get(&self, frame: i32) -> Option<&SimFrame> {
		self.frames.get(&frame)
	}

	/// Insert or replace; re-simulating a frame supersedes its snapshot.
	pub fn put(&mut self, frame: SimFrame) {
		self.frames.insert(frame.frame, frame);
	}

	/// Closest cached frame strictly before `frame`, the resume point
	/// for the solver.
	pub fn nearest_before(&self, frame: i32) -> Option<&SimFrame> {
		self.frames.range(..frame).next_back().map(|(_, f)| f)
	}

	/// Drop every entry after `frame`; `frame` itself stays.
	pub fn truncate_after(&mut self, frame: i32) {
		if let Some(first_dropped) = frame.checked_add(1) {
			self.frames.split_off(&first_dropped);
		}
	}

	pub fn clear(&mut self) {
		self.frames.clear();
		self.last_drape = None;
	}

	pub fn len(&self) -> usize {
		self.frames.len()
	}

	pub fn is_empty(&self) -> bool {
		self.frames.is_empty()
	}

	pub fn drape(&self) -> Option<&SimFrame> {
		self.last_drape.as_ref()
	}

	pub fn set_drape(&mut self, frame: SimFrame) {
		self.last_drape = Some(frame);
	}

	pub fn record(&self) -> TimelineRecord {
		TimelineRecord {
			frames: self
				.frames
				.values()
				.map(|f| FrameRecord {
					frame: f.frame,
					mesh: f.mesh.record(),
				})
				.collect(),
		}
	}

	/// Rebuild a timeline from its serialized form. Fails closed: any
	/// bad frame leaves the timeline untouched.
	pub fn from_record(rec: &TimelineRecord, params: &SimParams) -> Result<Self, Error> {
		let mut timeline = Self::default();
		for f in &rec.frames {
			let mesh = ClothMesh::from_record(&f.mesh)?;
			timeline.put(SimFrame::new(f.frame, params.fps, &mesh));
		}
		Ok(timeline)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::V3;
	use scene::surface::TriSurface;

	fn mesh_at(y: f64) -> ClothMesh {
		let mut surface = TriSurface::grid(2, 2, 0.2, 0.);
		for v in surface.vertices.iter_mut() {
			v[1] = y;
		}
		ClothMesh::from_surface(surface, 0.5).unwrap()
	}

	#[test]
	fn test_put_get_round_trip() {
		let mut timeline = Timeline::default();
		let mesh = mesh_at(0.7);
		timeline.put(SimFrame::new(3, 30., &mesh));
		let got = timeline.get(3).unwrap();
		assert_eq!(got.mesh.positions(), mesh.positions());
		assert_eq!(got.time, 0.1);
		assert!(timeline.get(4).is_none());
	}

	#[test]
	fn test_put_replaces() {
		let mut timeline = Timeline::default();
		timeline.put(SimFrame::new(1, 30., &mesh_at(0.)));
		timeline.put(SimFrame::new(1, 30., &mesh_at(9.)));
		assert_eq!(timeline.len(), 1);
		assert_eq!(timeline.get(1).unwrap().mesh.positions()[0][1], 9.);
	}

	#[test]
	fn test_nearest_before_is_strict() {
		let mut timeline = Timeline::default();
		for f in [-2, 0, 4] {
			timeline.put(SimFrame::new(f, 30., &mesh_at(f as f64)));
		}
		assert_eq!(timeline.nearest_before(4).unwrap().frame, 0);
		assert_eq!(timeline.nearest_before(5).unwrap().frame, 4);
		assert_eq!(timeline.nearest_before(0).unwrap().frame, -2);
		assert!(timeline.nearest_before(-2).is_none());
	}

	#[test]
	fn test_truncate_after() {
		let mut timeline = Timeline::default();
		for f in 0..6 {
			timeline.put(SimFrame::new(f, 30., &mesh_at(f as f64)));
		}
		timeline.truncate_after(2);
		assert_eq!(timeline.len(), 3);
		assert!(timeline.get(2).is_some());
		assert!(timeline.get(3).is_none());
	}

	#[test]
	fn test_snapshot_is_independent() {
		let mut timeline = Timeline::default();
		let mut mesh = mesh_at(1.0);
		timeline.put(SimFrame::new(0, 30., &mesh));
		let moved: Vec<V3> = mesh
			.positions()
			.iter()
			.map(|p| p + V3::new(0., -5., 0.))
			.collect();
		mesh.set_positions(&moved);
		assert_eq!(timeline.get(0).unwrap().mesh.positions()[0][1], 1.0);
	}

	#[test]
	fn test_timeline_record_round_trip() {
		let mut timeline = Timeline::default();
		for f in [-1, 0, 2] {
			timeline.put(SimFrame::new(f, 30., &mesh_at(f as f64)));
		}
		let params = SimParams::default();
		let back = Timeline::from_record(&timeline.record(), &params).unwrap();
		assert_eq!(back.len(), 3);
		assert_eq!(
			back.get(2).unwrap().mesh.positions(),
			timeline.get(2).unwrap().mesh.positions()
		);
	}
}
