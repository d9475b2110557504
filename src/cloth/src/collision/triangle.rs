use nalgebra::Rotation3;

use crate::V3;

/// One world-space face with its unit normal precomputed.
#[derive(Clone, Copy, Debug)]
pub struct Triangle {
	pub p0: V3,
	pub p1: V3,
	pub p2: V3,
	normal: V3,
}

impl Triangle {
	/// `None` for degenerate faces (near-zero area), which collision
	/// queries skip.
	pub fn new(p0: V3, p1: V3, p2: V3) -> Option<Self> {
		let n = (p1 - p0).cross(&(p2 - p0));
		let len = n.magnitude();
		if len < 1e-12 {
			return None;
		}
		Some(Self {
			p0,
			p1,
			p2,
			normal: n / len,
		})
	}

	pub fn normal(&self) -> V3 {
		self.normal
	}

	/// Distance from `pt` along `dir` to the face, `None` when the
	/// direction is parallel to the plane (zero denominator) or the
	/// plane crossing falls outside the face.
	pub fn collision_distance(&self, pt: V3, dir: V3) -> Option<f64> {
		let denominator = dir.dot(&self.normal);
		if denominator == 0.0 {
			return None;
		}
		let numerator = (pt - self.p0).dot(&self.normal);
		let dist = (numerator / denominator).abs();
		let crossing = pt + dir * dist;
		if self.contains(crossing, dir) {
			Some(dist)
		} else {
			None
		}
	}

	/// Same-side test against each edge after rotating everything into
	/// the plane perpendicular to the travel direction.
	fn contains(&self, p: V3, dir: V3) -> bool {
		let rot = align_with_y(dir);
		let p0 = rot * self.p0;
		let p1 = rot * self.p1;
		let p2 = rot * self.p2;
		let p = rot * p;
		same_side(p, p0, p1, p2)
			&& same_side(p, p1, p2, p0)
			&& same_side(p, p2, p0, p1)
	}
}

/// Two points are on the same side of the line a-b when the cross
/// products of the edge with each point have a non-negative dot product.
fn same_side(point1: V3, point2: V3, a: V3, b: V3) -> bool {
	let cross1 = (b - a).cross(&(point1 - a));
	let cross2 = (b - a).cross(&(point2 - a));
	cross1.dot(&cross2) >= 0.0
}

/// Rotation taking `dir` toward the y axis: first about x into the xy
/// plane, then about z.
fn align_with_y(dir: V3) -> Rotation3<f64> {
	let rx = Rotation3::from_axis_angle(&V3::x_axis(), x_rotate(dir));
	let rz = Rotation3::from_axis_angle(&V3::z_axis(), z_rotate(dir));
	rx * rz
}

fn x_rotate(dir: V3) -> f64 {
	let y = dir[1];
	let z = dir[2];
	if y != 0.0 {
		let mut ret = (-z / y).atan();
		if y < 0.0 {
			ret += std::f64::consts::PI;
		}
		ret
	} else if z > 0.0 {
		-std::f64::consts::FRAC_PI_2
	} else if z < 0.0 {
		std::f64::consts::FRAC_PI_2
	} else {
		0.0
	}
}

fn z_rotate(dir: V3) -> f64 {
	let x = dir[0];
	let yz = (dir[1] * dir[1] + dir[2] * dir[2]).sqrt();
	if yz != 0.0 {
		(x / yz).atan()
	} else if x > 0.0 {
		std::f64::consts::FRAC_PI_2
	} else if x < 0.0 {
		-std::f64::consts::FRAC_PI_2
	} else {
		0.0
	}
}
