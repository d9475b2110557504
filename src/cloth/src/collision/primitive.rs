use scene::transform::Transform;

use super::{Hit, TOL};
use crate::V3;

/// Ray/ellipsoid intersection solved as a quadric in the obstacle's
/// local frame scaled to the unit sphere. Radii are inflated by the
/// collision margin.
pub fn ellipsoid_hit(
	point: V3,
	dir: V3,
	transform: &Transform,
	radii: V3,
	margin: f64,
) -> Option<Hit> {
	let r = radii.add_scalar(margin);
	let o = transform.point_to_local(point).component_div(&r);
	let d = transform.dir_to_local(dir).component_div(&r);
	let a = d.norm_squared();
	if a < TOL {
		return None;
	}
	let b = o.dot(&d);
	let c = o.norm_squared() - 1.0;
	let disc = b * b - a * c;
	if disc < 0.0 {
		return None;
	}
	let sqrt_disc = disc.sqrt();
	let mut t = (-b - sqrt_disc) / a;
	if t < TOL {
		t = (-b + sqrt_disc) / a;
	}
	if t < TOL {
		return None;
	}
	let local = transform.point_to_local(point) + transform.dir_to_local(dir) * t;
	let world = transform.point(local);
	Some(Hit {
		distance: (world - point).magnitude(),
		point: world,
	})
}

/// Ray intersection with a cylinder or truncated cone: both end caps
/// plus the lateral quadric. `ratio` scales the top radius from `rx`
/// (0 = cone, no top cap); the elliptical cross-section is handled by
/// the rx/rz eccentricity factor.
#[allow(clippy::too_many_arguments)]
pub fn cylinder_hit(
	point: V3,
	dir: V3,
	transform: &Transform,
	rx: f64,
	rz: f64,
	ratio: f64,
	height: f64,
	margin: f64,
) -> Option<Hit> {
	let center = transform.origin();
	let height = height + margin * 2.0;
	let halfh = height / 2.0;
	let rx = rx + margin;
	let rz = rz + margin;
	let rx2 = rx * rx;
	let top_rx2 = rx2 * ratio * ratio;
	let sy = rx * (ratio - 1.0) / height;
	let sz = rx2 / (rz * rz);
	let cone = ratio == 0.0;

	// local-rotation frame, origin at the ray start, base center at v1
	let mut v1 = transform.dir_to_local(center - point);
	v1[1] -= halfh;
	let d = transform.dir_to_local(dir);

	let mut mint = f64::MAX;
	if d[1] != 0.0 {
		// bottom cap
		let t = v1[1] / d[1];
		if t > TOL {
			let a = t * d[0] - v1[0];
			let b = t * d[2] - v1[2];
			if a * a + sz * b * b < rx2 {
				mint = t;
			}
		}
		if !cone {
			let t = (v1[1] + height) / d[1];
			if t > TOL {
				let a = t * d[0] - v1[0];
				let b = t * d[2] - v1[2];
				if a * a + sz * b * b < top_rx2 {
					if mint < f64::MAX {
						// both caps crossed, the sides cannot be nearer
						let near = t.min(mint);
						return Some(Hit {
							distance: near,
							point: point + dir * near,
						});
					}
					mint = t;
				}
			}
		}
	}

	// lateral surface
	let (b, c, zc, yc) = if sy == 0.0 {
		let zc = sz * d[2];
		let b = d[0] * v1[0] + zc * v1[2];
		let c = v1[0] * v1[0] + sz * v1[2] * v1[2] - rx2;
		(b, c, zc, 0.0)
	} else {
		let zc = sz * d[2];
		let yc = sy * d[1];
		let radius = rx - sy * v1[1];
		let b = d[0] * v1[0] + radius * sy * d[1] + zc * v1[2];
		let c = v1[0] * v1[0] + sz * v1[2] * v1[2] - radius * radius;
		(b, c, zc, yc)
	};
	let a = d[0] * d[0] + zc * d[2] - yc * yc;
	let mut side_t = f64::MAX;
	if a.abs() > TOL {
		let e = b * b - a * c;
		if e >= 0.0 {
			let sq = e.sqrt();
			if c > TOL {
				// ray origin outside, nearer root if pointing inward
				if b > 0.0 {
					side_t = (b - sq) / a;
				}
			} else if c < -TOL {
				// inside, exit through the far root
				side_t = (b + sq) / a;
			} else if b > 0.0 {
				side_t = (b + sq) / a;
			}
		}
	}
	if side_t < mint {
		let h = side_t * d[1] - v1[1];
		if h > 0.0 && h < height {
			let raw = point + dir * side_t;
			// park the contact exactly on the tapered radius
			let dx = raw[0] - center[0];
			let dz = raw[2] - center[2];
			let r = rx + sy * (raw[1] - center[1] + halfh);
			let denom = (dx * dx + sz * dz * dz).sqrt();
			let p = if denom > TOL {
				V3::new(
					center[0] + dx * r / denom,
					raw[1],
					center[2] + dz * r / denom,
				)
			} else {
				raw
			};
			return Some(Hit {
				distance: side_t,
				point: p,
			});
		}
	}
	if mint == f64::MAX {
		return None;
	}
	Some(Hit {
		distance: mint,
		point: point + dir * mint,
	})
}
