use crate::bound::BoundBox;
use crate::surface::TriSurface;
use crate::transform::Transform;
use crate::V3;

/// Geometry carried by a scene object snapshot. Analytic kinds keep
/// their parameters so collision can run exact quadric tests; anything
/// else the host converts to a `TriSurface` or marks unconvertible.
#[derive(Clone, Debug)]
pub enum ObjectKind {
	Mesh(TriSurface),
	/// Semi-axis radii along local x/y/z.
	Ellipsoid { radii: V3 },
	/// Base radii rx/rz, top radius rx * ratio (0 = cone), height along
	/// local y.
	Cylinder {
		rx: f64,
		rz: f64,
		ratio: f64,
		height: f64,
	},
	Light,
	Camera,
	Null,
	ReferenceImage,
	/// Host reported the object cannot be triangulated.
	Unconvertible,
}

#[derive(Clone, Debug)]
pub struct SceneObject {
	pub id: usize,
	pub visible: bool,
	pub transform: Transform,
	pub kind: ObjectKind,
}

impl SceneObject {
	pub fn new(id: usize, kind: ObjectKind) -> Self {
		Self {
			id,
			visible: true,
			transform: Transform::default(),
			kind,
		}
	}

	pub fn with_transform(mut self, transform: Transform) -> Self {
		self.transform = transform;
		self
	}

	pub fn with_visible(mut self, visible: bool) -> Self {
		self.visible = visible;
		self
	}

	/// Cameras, lights and marker objects never take part in collision.
	pub fn collidable(&self) -> bool {
		!matches!(
			self.kind,
			ObjectKind::Light
				| ObjectKind::Camera
				| ObjectKind::Null
				| ObjectKind::ReferenceImage
		)
	}

	pub fn surface(&self) -> Option<&TriSurface> {
		match &self.kind {
			ObjectKind::Mesh(s) => Some(s),
			_ => None,
		}
	}

	/// World-space bounds, conservative for the analytic kinds.
	pub fn bounds(&self) -> Option<BoundBox> {
		match &self.kind {
			ObjectKind::Mesh(s) => {
				let pts: Vec<V3> =
					s.vertices.iter().map(|v| self.transform.point(*v)).collect();
				BoundBox::from_points(&pts)
			}
			ObjectKind::Ellipsoid { radii } => {
				let r = radii[0].max(radii[1]).max(radii[2]);
				let c = self.transform.origin();
				Some(BoundBox::from_corners(c, c).inflate(r))
			}
			ObjectKind::Cylinder {
				rx,
				rz,
				ratio,
				height,
			} => {
				let r_top = rx * ratio;
				let radial = rx.max(*rz).max(r_top);
				let r = (radial * radial + height * height * 0.25).sqrt();
				let c = self.transform.origin();
				Some(BoundBox::from_corners(c, c).inflate(r))
			}
			_ => None,
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_collidable_kinds() {
		assert!(!SceneObject::new(0, ObjectKind::Light).collidable());
		assert!(!SceneObject::new(1, ObjectKind::Camera).collidable());
		assert!(!SceneObject::new(2, ObjectKind::Null).collidable());
		let sphere = SceneObject::new(3, ObjectKind::Ellipsoid {
			radii: V3::new(1., 1., 1.),
		});
		assert!(sphere.collidable());
	}

	#[test]
	fn test_ellipsoid_bounds_translated() {
		let obj = SceneObject::new(0, ObjectKind::Ellipsoid {
			radii: V3::new(1., 2., 1.),
		})
		.with_transform(Transform::translation(V3::new(10., 0., 0.)));
		let b = obj.bounds().unwrap();
		assert!(b.min[0] <= 8. && b.max[0] >= 12.);
	}
}
