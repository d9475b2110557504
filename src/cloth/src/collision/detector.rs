use scene::bound::BoundBox;
use scene::object::{ObjectKind, SceneObject};
use scene::query::SceneQuery;
use scene::surface::TriSurface;
use scene::transform::Transform;

use super::primitive;
use super::triangle::Triangle;
use super::Hit;
use crate::mesh::ClothMesh;
use crate::V3;

/// Collision queries against a scene snapshot. Two independent
/// families: external-object queries (prune candidates, then exact
/// per-primitive distance) and the O(n^2) self-collision scan.
pub struct CollisionDetector<'a> {
	scene: &'a dyn SceneQuery,
}

impl<'a> CollisionDetector<'a> {
	pub fn new(scene: &'a dyn SceneQuery) -> Self {
		Self { scene }
	}

	/// Objects close enough to the swept region to deserve an exact
	/// test. Invisible objects, non-collidable kinds and the cloth
	/// itself never qualify; an object that moved since the previous
	/// sample stays a candidate even without box overlap.
	pub fn find_candidates(
		&self,
		cloth_id: usize,
		region: &BoundBox,
		time: f64,
		margin: f64,
		time_increment: f64,
	) -> Vec<SceneObject> {
		let mut result = vec![];
		for candidate in self.scene.objects() {
			if !candidate.visible
				|| !candidate.collidable()
				|| candidate.id == cloth_id
			{
				continue;
			}
			let overlaps = candidate
				.bounds()
				.map(|b| b.inflate(margin).intersects(region))
				.unwrap_or(false);
			if overlaps
				|| self.object_moved(candidate.id, time - time_increment, time)
			{
				result.push(candidate);
			}
		}
		result
	}

	/// Origin comparison between the two sample times. Rotation-only
	/// motion is invisible here, a documented limitation of the
	/// sampling scheme.
	pub fn object_moved(&self, id: usize, time_prev: f64, time_now: f64) -> bool {
		let time_prev = if time_prev <= 0.0 { 0.001 } else { time_prev };
		if time_prev >= time_now {
			return false;
		}
		match (
			self.scene.origin_at(id, time_prev),
			self.scene.origin_at(id, time_now),
		) {
			(Some(a), Some(b)) => a != b,
			_ => false,
		}
	}

	/// World-space displacement of the object between the two sample
	/// times.
	pub fn object_movement(&self, id: usize, time_prev: f64, time_now: f64) -> V3 {
		let time_prev = if time_prev <= 0.0 { 0.001 } else { time_prev };
		if time_prev >= time_now {
			return V3::zeros();
		}
		match (
			self.scene.origin_at(id, time_prev),
			self.scene.origin_at(id, time_now),
		) {
			(Some(a), Some(b)) => b - a,
			_ => V3::zeros(),
		}
	}

	/// Exact distance query, dispatched by primitive kind. Analytic
	/// kinds get quadric solves; everything else goes through the
	/// triangulated surface, or is skipped when the host could not
	/// convert it.
	pub fn distance_to_object(
		&self,
		point: V3,
		nominee: &SceneObject,
		dir: V3,
		margin: f64,
	) -> Option<Hit> {
		match &nominee.kind {
			ObjectKind::Ellipsoid { radii } => primitive::ellipsoid_hit(
				point,
				dir,
				&nominee.transform,
				*radii,
				margin,
			),
			ObjectKind::Cylinder {
				rx,
				rz,
				ratio,
				height,
			} => primitive::cylinder_hit(
				point,
				dir,
				&nominee.transform,
				*rx,
				*rz,
				*ratio,
				*height,
				margin,
			),
			_ => {
				let surface = nominee.surface()?;
				mesh_hit(point, dir, surface, &nominee.transform)
			}
		}
	}

	/// Test the swept segment `prev` -> `candidate_pos` against every
	/// candidate, sampling obstacle motion between the two sub-step
	/// times. Returns the nearest contact within `max_distance`.
	#[allow(clippy::too_many_arguments)]
	pub fn detect_collision(
		&self,
		prev: V3,
		candidate_pos: V3,
		candidates: &[SceneObject],
		time: f64,
		time_increment: f64,
		max_distance: f64,
		margin: f64,
	) -> Option<Hit> {
		let travel = candidate_pos - prev;
		let len = travel.magnitude();
		if len == 0.0 {
			return None;
		}
		let dir = travel / len;
		let prev_time = time - time_increment;
		let mut nearest: Option<Hit> = None;
		for obj in candidates {
			let move_vec = self.object_movement(obj.id, prev_time, time);
			let obj_now = self
				.scene
				.object_at(obj.id, time)
				.unwrap_or_else(|| obj.clone());
			let origin = prev + move_vec;
			if let Some(hit) =
				self.distance_to_object(origin, &obj_now, dir, margin)
			{
				if hit.distance < max_distance
					&& nearest
						.as_ref()
						.map_or(true, |n| hit.distance < n.distance)
				{
					nearest = Some(hit);
				}
			}
		}
		nearest
	}

	/// True when any particle not joined to `pt` by a spring sits
	/// within twice the point radius. O(n^2) over the cloth, the
	/// dominant cost on large meshes.
	pub fn detect_self_collision(
		&self,
		mesh: &ClothMesh,
		pt: usize,
		point_radius: f64,
	) -> bool {
		let p = mesh.particles()[pt].pos;
		for i in 0..mesh.particle_count() {
			if i == pt || mesh.connected(pt, i) {
				continue;
			}
			let d = (mesh.particles()[i].pos - p).magnitude();
			if d <= point_radius * 2.0 {
				return true;
			}
		}
		false
	}
}

fn mesh_hit(
	point: V3,
	dir: V3,
	surface: &TriSurface,
	transform: &Transform,
) -> Option<Hit> {
	let verts: Vec<V3> = surface
		.vertices
		.iter()
		.map(|v| transform.point(*v))
		.collect();
	let distance = face_scan(&verts, &surface.faces, point, dir)?;
	Some(Hit {
		distance,
		point: point + dir * distance,
	})
}

#[cfg(not(debug_assertions))]
fn face_scan(verts: &[V3], faces: &[[usize; 3]], point: V3, dir: V3) -> Option<f64> {
	use rayon::prelude::*;
	faces
		.par_iter()
		.filter_map(|f| {
			let tri = Triangle::new(verts[f[0]], verts[f[1]], verts[f[2]])?;
			tri.collision_distance(point, dir)
		})
		.min_by(|a, b| a.total_cmp(b))
}

#[cfg(debug_assertions)]
fn face_scan(verts: &[V3], faces: &[[usize; 3]], point: V3, dir: V3) -> Option<f64> {
	faces
		.iter()
		.filter_map(|f| {
			let tri = Triangle::new(verts[f[0]], verts[f[1]], verts[f[2]])?;
			tri.collision_distance(point, dir)
		})
		.min_by(|a, b| a.total_cmp(b))
}
