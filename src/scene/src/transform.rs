use crate::{M4, V3};

/// World/local matrix pair for a scene object. Both directions are kept
/// so queries never invert on the hot path.
#[derive(Clone, Copy, Debug)]
pub struct Transform {
	pub from_local: M4,
	pub to_local: M4,
}

impl Default for Transform {
	fn default() -> Self {
		Self {
			from_local: M4::identity(),
			to_local: M4::identity(),
		}
	}
}

impl Transform {
	pub fn from_matrix(from_local: M4) -> Option<Self> {
		let to_local = from_local.try_inverse()?;
		Some(Self {
			from_local,
			to_local,
		})
	}

	pub fn translation(offset: V3) -> Self {
		Self {
			from_local: M4::new_translation(&offset),
			to_local: M4::new_translation(&-offset),
		}
	}

	pub fn point(&self, p: V3) -> V3 {
		self.from_local.transform_point(&p.into()).coords
	}

	pub fn point_to_local(&self, p: V3) -> V3 {
		self.to_local.transform_point(&p.into()).coords
	}

	pub fn dir(&self, d: V3) -> V3 {
		self.from_local.transform_vector(&d)
	}

	pub fn dir_to_local(&self, d: V3) -> V3 {
		self.to_local.transform_vector(&d)
	}

	pub fn origin(&self) -> V3 {
		let m = &self.from_local;
		V3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]) / m[(3, 3)]
	}

	/// Z axis of the local frame in world space, the facing direction of
	/// emitter-like objects.
	pub fn z_dir(&self) -> V3 {
		let d = self.dir(V3::new(0., 0., 1.));
		let l = d.magnitude();
		if l == 0. {
			V3::new(0., 0., 1.)
		} else {
			d / l
		}
	}
}
