use record::network::ParamsRecord;

use crate::V3;

/// Reference displacement cap per step at the reference frame rate;
/// scaled by `REFERENCE_FPS / fps` so stability does not depend on the
/// configured rate.
const REFERENCE_STEP: f64 = 0.0025;
const REFERENCE_FPS: f64 = 60.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GravityAxis {
	X,
	Y,
	Z,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimParams {
	pub mesh_tolerance: f64,
	pub spacing: f64,
	pub spring_k: f64,
	pub damping: f64,
	pub vertex_mass: f64,
	pub collision_margin: f64,
	pub gravity: f64,
	pub gravity_axis: GravityAxis,
	pub fps: f64,
	pub substeps: usize,
	pub drape_frames: usize,
	pub sim_frames: usize,
	pub self_collision: bool,
	pub point_radius: f64,
	pub floor_collision: bool,
	pub floor: f64,
}

impl Default for SimParams {
	fn default() -> Self {
		Self {
			mesh_tolerance: 0.1,
			spacing: 0.2,
			spring_k: 7.1,
			damping: 2.8,
			vertex_mass: 0.5,
			collision_margin: 0.025,
			gravity: -0.08,
			gravity_axis: GravityAxis::Y,
			fps: 30.0,
			substeps: 10,
			drape_frames: 0,
			sim_frames: 30,
			self_collision: true,
			point_radius: 0.1,
			floor_collision: false,
			floor: 0.0,
		}
	}
}

impl SimParams {
	pub fn with_gravity(mut self, gravity: f64) -> Self {
		self.gravity = gravity;
		self
	}

	pub fn with_gravity_axis(mut self, axis: GravityAxis) -> Self {
		self.gravity_axis = axis;
		self
	}

	pub fn with_spring_k(mut self, k: f64) -> Self {
		self.spring_k = k;
		self
	}

	pub fn with_damping(mut self, c: f64) -> Self {
		self.damping = c;
		self
	}

	pub fn with_vertex_mass(mut self, mass: f64) -> Self {
		self.vertex_mass = mass;
		self
	}

	pub fn with_collision_margin(mut self, margin: f64) -> Self {
		self.collision_margin = margin;
		self
	}

	pub fn with_fps(mut self, fps: f64) -> Self {
		self.fps = fps;
		self
	}

	pub fn with_substeps(mut self, substeps: usize) -> Self {
		self.substeps = substeps.max(1);
		self
	}

	pub fn with_frames(mut self, drape_frames: usize, sim_frames: usize) -> Self {
		self.drape_frames = drape_frames;
		self.sim_frames = sim_frames;
		self
	}

	pub fn with_self_collision(mut self, enabled: bool) -> Self {
		self.self_collision = enabled;
		self
	}

	pub fn with_floor(mut self, enabled: bool, floor: f64) -> Self {
		self.floor_collision = enabled;
		self.floor = floor;
		self
	}

	/// Sub-step duration: the frame interval divided by the sub-step
	/// factor.
	pub fn dt(&self) -> f64 {
		1.0 / (self.fps * self.substeps as f64)
	}

	pub fn step_clamp(&self) -> f64 {
		REFERENCE_STEP * REFERENCE_FPS / self.fps
	}

	pub fn gravity_vec(&self) -> V3 {
		match self.gravity_axis {
			GravityAxis::X => V3::new(self.gravity, 0.0, 0.0),
			GravityAxis::Y => V3::new(0.0, self.gravity, 0.0),
			GravityAxis::Z => V3::new(0.0, 0.0, self.gravity),
		}
	}

	pub fn record(&self) -> ParamsRecord {
		ParamsRecord {
			mesh_tolerance: self.mesh_tolerance,
			spacing: self.spacing,
			spring_k: self.spring_k,
			damping: self.damping,
			vertex_mass: self.vertex_mass,
			collision_margin: self.collision_margin,
			gravity: self.gravity,
			gravity_axis: match self.gravity_axis {
				GravityAxis::X => 0,
				GravityAxis::Y => 1,
				GravityAxis::Z => 2,
			},
			fps: self.fps,
			substeps: self.substeps as u32,
			drape_frames: self.drape_frames as u32,
			sim_frames: self.sim_frames as u32,
			self_collision: self.self_collision,
			point_radius: self.point_radius,
			floor_collision: self.floor_collision,
			floor: self.floor,
		}
	}

	pub fn from_record(rec: &ParamsRecord) -> Self {
		Self {
			mesh_tolerance: rec.mesh_tolerance,
			spacing: rec.spacing,
			spring_k: rec.spring_k,
			damping: rec.damping,
			vertex_mass: rec.vertex_mass,
			collision_margin: rec.collision_margin,
			gravity: rec.gravity,
			gravity_axis: match rec.gravity_axis {
				0 => GravityAxis::X,
				2 => GravityAxis::Z,
				_ => GravityAxis::Y,
			},
			fps: rec.fps,
			substeps: (rec.substeps as usize).max(1),
			drape_frames: rec.drape_frames as usize,
			sim_frames: rec.sim_frames as usize,
			self_collision: rec.self_collision,
			point_radius: rec.point_radius,
			floor_collision: rec.floor_collision,
			floor: rec.floor,
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use approx::assert_relative_eq;

	#[test]
	fn test_dt() {
		let p = SimParams::default().with_fps(30.).with_substeps(10);
		assert_relative_eq!(p.dt(), 1.0 / 300.0);
	}

	#[test]
	fn test_step_clamp_scales_with_fps() {
		let p30 = SimParams::default().with_fps(30.);
		let p60 = SimParams::default().with_fps(60.);
		assert_relative_eq!(p30.step_clamp(), 0.005, epsilon = 1e-12);
		assert_relative_eq!(p60.step_clamp(), 0.0025, epsilon = 1e-12);
	}

	#[test]
	fn test_gravity_vec_axis() {
		let p = SimParams::default()
			.with_gravity(-9.8)
			.with_gravity_axis(GravityAxis::Z);
		assert_eq!(p.gravity_vec(), V3::new(0., 0., -9.8));
	}

	#[test]
	fn test_record_round_trip() {
		let p = SimParams::default()
			.with_gravity_axis(GravityAxis::X)
			.with_substeps(4)
			.with_floor(true, -0.5);
		assert_eq!(SimParams::from_record(&p.record()), p);
	}
}
