use std::sync::atomic::{AtomicBool, Ordering};

use record::frame::TimelineRecord;
use record::network::NetworkRecord;
use scene::bound::BoundBox;
use scene::query::SceneQuery;
use scene::transform::Transform;

use crate::collision::CollisionDetector;
use crate::error::Error;
use crate::mesh::ClothMesh;
use crate::params::SimParams;
use crate::timeline::{SimFrame, Timeline};
use crate::V3;

/// The stepping driver: owns the live cloth, its parameters, the frame
/// timeline and the scene adapter. One instance per simulated cloth.
///
/// Frames are indexed at sub-step granularity; only indices aligned to
/// the sub-step factor land in the long-term cache (keyed by display
/// frame), everything else lives in the drape register.
pub struct ClothWorld {
	params: SimParams,
	cloth: ClothMesh,
	cloth_id: usize,
	transform: Transform,
	timeline: Timeline,
	scene: Box<dyn SceneQuery>,
}

impl ClothWorld {
	pub fn new(cloth: ClothMesh, scene: Box<dyn SceneQuery>) -> Self {
		Self {
			params: SimParams::default(),
			cloth,
			cloth_id: usize::MAX,
			transform: Transform::default(),
			timeline: Timeline::default(),
			scene,
		}
	}

	pub fn with_params(mut self, params: SimParams) -> Self {
		self.params = params;
		self
	}

	/// Scene id of the cloth's own object, excluded from candidate
	/// pruning.
	pub fn with_cloth_id(mut self, id: usize) -> Self {
		self.cloth_id = id;
		self
	}

	pub fn with_transform(mut self, transform: Transform) -> Self {
		self.transform = transform;
		self
	}

	pub fn params(&self) -> &SimParams {
		&self.params
	}

	pub fn cloth(&self) -> &ClothMesh {
		&self.cloth
	}

	pub fn timeline(&self) -> &Timeline {
		&self.timeline
	}

	/// Parameter edits invalidate everything simulated under the old
	/// values.
	pub fn set_params(&mut self, params: SimParams) {
		if params != self.params {
			self.params = params;
			self.timeline.clear();
		}
	}

	/// Pin flags may change mid-run; the fixed/free classification is
	/// recomputed every sub-step, so no cache invalidation is needed.
	pub fn set_pinned(&mut self, flags: &[bool]) {
		self.cloth.set_pinned(flags);
	}

	/// State to resume frame `frame` from: the drape register for
	/// pre-roll and intermediate sub-steps, the nearest earlier cached
	/// frame otherwise.
	fn load_prev(&self, frame: i32) -> Option<ClothMesh> {
		let sub = self.params.substeps as i32;
		if frame <= 0 || frame % sub != 0 {
			self.timeline.drape().map(|f| f.mesh.duplicate())
		} else {
			self.timeline
				.nearest_before(frame / sub)
				.map(|f| f.mesh.duplicate())
		}
	}

	/// One sub-step: load the previous state, accumulate forces, take a
	/// clamped semi-implicit Euler step, correct against collisions,
	/// commit the result to the timeline.
	pub fn step_frame(&mut self, frame: i32) {
		let sub = self.params.substeps as i32;
		let dt = self.params.dt();
		let time = frame as f64 * dt;
		let prev = self
			.load_prev(frame)
			.unwrap_or_else(|| self.cloth.duplicate());
		let pinned = self.cloth.pinned().to_vec();

		let n = prev.particle_count();
		let prev_world: Vec<V3> = prev
			.particles()
			.iter()
			.map(|p| self.transform.point(p.pos))
			.collect();
		let mut new_pos = prev_world.clone();
		let mut new_vel: Vec<V3> = prev.particles().iter().map(|p| p.vel).collect();

		let g = self.params.gravity_vec();
		let k = self.params.spring_k;
		let c = self.params.damping;
		let clamp_value = self.params.step_clamp();
		let margin = self.params.collision_margin;
		// collision sampling runs at a finer time resolution than the
		// sub-step itself
		let sub_time = time / sub as f64;
		let sub_increment = dt * sub as f64;
		let detector = CollisionDetector::new(self.scene.as_ref());
		let winds = self.scene.wind_sources();

		for pt in 0..n {
			if pinned[pt] || prev.incident(pt).is_empty() {
				// pinned or isolated: zero net force, no motion
				continue;
			}
			let p = prev_world[pt];
			let m = prev.particles()[pt].mass;
			let u = prev.particles()[pt].vel;

			let mut f = g * m - u * c;
			for wind in winds.iter() {
				f += wind.force_at(p);
			}
			for &si in prev.incident(pt) {
				let spring = &prev.springs()[si];
				f += spring.force(p, prev_world[spring.other(pt)], k);
			}

			let a = f / m;
			let s = clamp(u * dt + a * (0.5 * dt * dt), clamp_value);
			let mut pos = p + s;
			let mut vel = u + a * dt;

			let travel = pos - p;
			let travel_len = travel.magnitude();
			if travel_len > 0.0 {
				let dir = travel / travel_len;
				let region =
					BoundBox::from_corners(p, pos + dir * margin);
				let candidates = detector.find_candidates(
					self.cloth_id,
					&region,
					sub_time,
					margin,
					sub_increment,
				);
				if let Some(hit) = detector.detect_collision(
					p,
					pos,
					&candidates,
					sub_time,
					sub_increment,
					travel_len + margin,
					margin,
				) {
					pos = hit.point;
					vel = V3::zeros();
				}
			}

			if self.params.self_collision
				&& detector.detect_self_collision(
					&prev,
					pt,
					self.params.point_radius,
				) {
				// hold near the previous position, nudged off the exact
				// overlap; velocity is kept
				pos = prev_world[pt];
				pos[2] += self.params.point_radius / 1e4;
				vel = u + a * dt;
			}

			if self.params.floor_collision && pos[1] < self.params.floor {
				pos[1] = self.params.floor + margin;
			}

			new_pos[pt] = pos;
			new_vel[pt] = vel;
		}

		let local: Vec<V3> = new_pos
			.iter()
			.map(|p| self.transform.point_to_local(*p))
			.collect();
		let mut mesh = prev;
		mesh.set_positions(&local);
		mesh.set_velocities(&new_vel);
		mesh.set_pinned(&pinned);

		let display = frame / sub;
		if frame >= 0 && frame % sub == 0 {
			self.timeline
				.put(SimFrame::new(display, self.params.fps, &mesh));
		}
		self.timeline
			.set_drape(SimFrame::new(display, self.params.fps, &mesh));
		self.cloth = mesh;
	}

	/// Drive the whole configured range, pre-roll included. The cancel
	/// flag is honored between frames only so no frame is ever left
	/// half committed. Returns false when cancelled.
	pub fn run(&mut self, cancel: &AtomicBool) -> bool {
		let sub = self.params.substeps as i32;
		let first = -(self.params.drape_frames as i32) * sub;
		let last = self.params.sim_frames as i32 * sub;
		for frame in first..=last {
			if cancel.load(Ordering::Relaxed) {
				eprintln!("INFO: simulation cancelled before frame {}", frame);
				return false;
			}
			self.step_frame(frame);
		}
		true
	}

	/// Playback path: cached state for a display frame, never touching
	/// the solver. Scrub positions past the cached range resolve to the
	/// nearest earlier frame.
	pub fn playback(&self, frame: i32) -> Option<&SimFrame> {
		self.timeline
			.get(frame)
			.or_else(|| self.timeline.nearest_before(frame))
	}

	pub fn network_record(&self) -> NetworkRecord {
		NetworkRecord {
			mesh: self.cloth.record(),
			params: self.params.record(),
		}
	}

	pub fn from_network_record(
		rec: &NetworkRecord,
		scene: Box<dyn SceneQuery>,
	) -> Result<Self, Error> {
		let mesh = ClothMesh::from_record(&rec.mesh)?;
		let params = SimParams::from_record(&rec.params);
		Ok(Self::new(mesh, scene).with_params(params))
	}

	pub fn timeline_record(&self) -> TimelineRecord {
		self.timeline.record()
	}

	pub fn load_timeline(&mut self, rec: &TimelineRecord) -> Result<(), Error> {
		self.timeline = Timeline::from_record(rec, &self.params)?;
		Ok(())
	}
}

/// Cap the displacement magnitude, keeping its direction.
fn clamp(s: V3, clamp_value: f64) -> V3 {
	let len = s.magnitude();
	if len > clamp_value {
		s / len * clamp_value
	} else {
		s
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use approx::assert_relative_eq;
	use scene::fan::Fan;
	use scene::object::{ObjectKind, SceneObject};
	use scene::static_scene::StaticScene;
	use scene::surface::TriSurface;

	fn empty_scene() -> Box<StaticScene> {
		Box::new(StaticScene::default())
	}

	fn triangle_cloth() -> ClothMesh {
		let surface = TriSurface::new(
			vec![
				V3::new(0., 0., 0.),
				V3::new(0.2, 0., 0.),
				V3::new(0., 0., 0.2),
			],
			vec![[0, 1, 2]],
		);
		ClothMesh::from_surface(surface, 0.5).unwrap()
	}

	fn grid_params() -> SimParams {
		SimParams::default()
			.with_gravity(-9.8)
			.with_fps(30.)
			.with_substeps(1)
			.with_self_collision(false)
	}

	#[test]
	fn test_clamp_preserves_direction() {
		let s = clamp(V3::new(3., 4., 0.), 1.0);
		assert_relative_eq!(s.magnitude(), 1.0, epsilon = 1e-12);
		assert_relative_eq!(s[0] / s[1], 0.75, epsilon = 1e-12);
		let small = V3::new(0.001, 0., 0.);
		assert_eq!(clamp(small, 1.0), small);
	}

	#[test]
	fn test_free_vertex_falls_like_projectile() {
		// springs start at rest length, so for the first sub-step the
		// only force on the free vertex is gravity
		let mut cloth = triangle_cloth();
		cloth.set_pinned(&[false, true, true]);
		let params = grid_params().with_fps(60.);
		let mut world = ClothWorld::new(cloth, empty_scene()).with_params(params);
		world.step_frame(0);
		let dt: f64 = 1.0 / 60.0;
		let expected = 0.5 * (-9.8) * dt * dt; // within the clamp at 60 fps
		let y = world.cloth().particles()[0].pos[1];
		assert_relative_eq!(y, expected, epsilon = 1e-12);
		let v = world.cloth().particles()[0].vel[1];
		assert_relative_eq!(v, -9.8 * dt, epsilon = 1e-12);
	}

	#[test]
	fn test_displacement_clamp_caps_fast_steps() {
		let mut cloth = triangle_cloth();
		cloth.set_pinned(&[false, true, true]);
		// at 30 fps the projectile step would exceed the clamp
		let mut world =
			ClothWorld::new(cloth, empty_scene()).with_params(grid_params());
		world.step_frame(0);
		let y = world.cloth().particles()[0].pos[1];
		assert_relative_eq!(y, -0.005, epsilon = 1e-12);
	}

	#[test]
	fn test_isolated_vertex_does_not_move() {
		let surface = TriSurface::new(
			vec![
				V3::new(0., 0., 0.),
				V3::new(0.2, 0., 0.),
				V3::new(0., 0., 0.2),
				V3::new(5., 5., 5.),
			],
			vec![[0, 1, 2]],
		);
		let cloth = ClothMesh::from_surface(surface, 0.5).unwrap();
		let mut world =
			ClothWorld::new(cloth, empty_scene()).with_params(grid_params());
		for frame in 0..5 {
			world.step_frame(frame);
		}
		assert_eq!(world.cloth().particles()[3].pos, V3::new(5., 5., 5.));
	}

	#[test]
	fn test_fully_pinned_cloth_never_moves() {
		let mut cloth = triangle_cloth();
		cloth.set_pinned(&[true, true, true]);
		let before = cloth.positions();
		let mut world =
			ClothWorld::new(cloth, empty_scene()).with_params(grid_params());
		let cancel = AtomicBool::new(false);
		world.run(&cancel);
		assert_eq!(world.cloth().positions(), before);
	}

	#[test]
	fn test_duplicate_resimulates_bit_identical() {
		let surface = TriSurface::grid(4, 4, 0.2, 0.);
		let mut cloth = ClothMesh::from_surface(surface, 0.5).unwrap();
		let mut pins = vec![false; 16];
		pins[0] = true;
		pins[4] = true;
		cloth.set_pinned(&pins);
		let dup = cloth.duplicate();

		let mut w1 =
			ClothWorld::new(cloth, empty_scene()).with_params(grid_params());
		let mut w2 =
			ClothWorld::new(dup, empty_scene()).with_params(grid_params());
		w1.step_frame(0);
		w2.step_frame(0);
		assert_eq!(w1.cloth().positions(), w2.cloth().positions());
	}

	#[test]
	fn test_flat_sheet_settles_monotonically() {
		// 3x3 sheet, one edge pinned, gravity on y, 30 frames at
		// 30 fps / 1 substep
		let surface = TriSurface::grid(3, 3, 0.2, 0.);
		let mut cloth = ClothMesh::from_surface(surface, 0.5).unwrap();
		let mut pins = vec![false; 9];
		for i in 0..3 {
			pins[i] = true;
		}
		cloth.set_pinned(&pins);
		let mut world =
			ClothWorld::new(cloth, empty_scene()).with_params(grid_params());
		let cancel = AtomicBool::new(false);
		assert!(world.run(&cancel));

		for f in 1..=30 {
			let prev = world.playback(f - 1).unwrap().mesh.positions();
			let cur = world.playback(f).unwrap().mesh.positions();
			for i in 3..9 {
				assert!(
					cur[i][1] < prev[i][1],
					"vertex {} stalled at frame {}",
					i,
					f
				);
			}
			for i in 0..3 {
				assert_eq!(cur[i][1], 0.0);
			}
		}
		// displacement cap bounds the total drop
		for p in world.cloth().positions() {
			assert!(p[1] > -0.16);
		}
	}

	#[test]
	fn test_cloth_lands_on_panel() {
		let surface = TriSurface::new(
			vec![
				V3::new(0., 0.5, 0.),
				V3::new(0.2, 0.5, 0.),
				V3::new(0., 0.5, 0.2),
			],
			vec![[0, 1, 2]],
		);
		let cloth = ClothMesh::from_surface(surface, 0.5).unwrap();
		let panel = TriSurface::new(
			vec![
				V3::new(-1., 0.3, -1.),
				V3::new(1., 0.3, -1.),
				V3::new(1., 0.3, 1.),
				V3::new(-1., 0.3, 1.),
			],
			vec![[0, 1, 2], [0, 2, 3]],
		);
		let mut scene = StaticScene::default();
		scene.add_object(SceneObject::new(0, ObjectKind::Mesh(panel)));
		let params = grid_params().with_frames(0, 60);
		let mut world =
			ClothWorld::new(cloth, Box::new(scene)).with_params(params);
		let cancel = AtomicBool::new(false);
		world.run(&cancel);
		for p in world.cloth().positions() {
			assert_relative_eq!(p[1], 0.3, epsilon = 1e-9);
		}
	}

	#[test]
	fn test_floor_keeps_cloth_above_minimum() {
		let cloth = triangle_cloth();
		let params = grid_params().with_floor(true, -0.01).with_frames(0, 40);
		let mut world =
			ClothWorld::new(cloth, empty_scene()).with_params(params);
		let cancel = AtomicBool::new(false);
		world.run(&cancel);
		for f in 0..=40 {
			for p in world.playback(f).unwrap().mesh.positions() {
				assert!(p[1] >= -0.01, "below floor at frame {}", f);
			}
		}
	}

	#[test]
	fn test_wind_pushes_cloth() {
		let cloth = triangle_cloth();
		let mut scene = StaticScene::default();
		// fan at the cloth, blowing along +z
		scene.add_fan(Fan::seeded(Transform::default(), 0.25, 10.0, 11));
		let mut world = ClothWorld::new(cloth, Box::new(scene))
			.with_params(grid_params());
		world.step_frame(0);
		for p in world.cloth().positions() {
			assert!(p[2] > 0.0);
		}
	}

	#[test]
	fn test_substep_caching_granularity() {
		let cloth = triangle_cloth();
		let params = grid_params().with_substeps(2).with_frames(1, 2);
		let mut world =
			ClothWorld::new(cloth, empty_scene()).with_params(params);
		let cancel = AtomicBool::new(false);
		world.run(&cancel); // frames -2..=4
		// only aligned, non-negative frames persist: 0, 1, 2
		assert_eq!(world.timeline().len(), 3);
		assert_eq!(world.playback(1).unwrap().frame, 1);
		// the drape register holds the final sub-step
		assert!(world.timeline().drape().is_some());
	}

	#[test]
	fn test_cancellation_between_frames() {
		let cloth = triangle_cloth();
		let mut world =
			ClothWorld::new(cloth, empty_scene()).with_params(grid_params());
		let cancel = AtomicBool::new(true);
		assert!(!world.run(&cancel));
		assert!(world.timeline().is_empty());
	}

	#[test]
	fn test_set_params_invalidates_cache() {
		let cloth = triangle_cloth();
		let mut world =
			ClothWorld::new(cloth, empty_scene()).with_params(grid_params());
		let cancel = AtomicBool::new(false);
		world.run(&cancel);
		assert!(!world.timeline().is_empty());
		world.set_params(grid_params().with_gravity(-1.0));
		assert!(world.timeline().is_empty());
	}

	#[test]
	fn test_network_record_round_trip() {
		let mut cloth = triangle_cloth();
		cloth.set_pinned(&[true, false, false]);
		let world = ClothWorld::new(cloth, empty_scene())
			.with_params(grid_params().with_substeps(3));
		let bytes = world.network_record().to_bytes();
		let rec = NetworkRecord::from_bytes(&bytes).unwrap();
		let restored =
			ClothWorld::from_network_record(&rec, empty_scene()).unwrap();
		assert_eq!(restored.cloth().positions(), world.cloth().positions());
		assert_eq!(restored.cloth().pinned(), world.cloth().pinned());
		assert_eq!(restored.params(), world.params());
	}

	#[test]
	fn test_timeline_record_round_trip() {
		let cloth = triangle_cloth();
		let mut world =
			ClothWorld::new(cloth, empty_scene()).with_params(grid_params());
		let cancel = AtomicBool::new(false);
		world.run(&cancel);
		let bytes = world.timeline_record().to_bytes();
		let rec = TimelineRecord::from_bytes(&bytes).unwrap();
		let frames = world.timeline().len();
		let last = world.playback(30).unwrap().mesh.positions();
		world.load_timeline(&rec).unwrap();
		assert_eq!(world.timeline().len(), frames);
		assert_eq!(world.playback(30).unwrap().mesh.positions(), last);
	}
}
