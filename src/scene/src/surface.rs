use crate::bound::BoundBox;
use crate::V3;

/// Triangulated surface snapshot, the only geometry representation the
/// simulation core reads. Hosts convert their objects to this at some
/// tolerance or report that they cannot.
#[derive(Clone, Debug)]
pub struct TriSurface {
	pub vertices: Vec<V3>,
	pub faces: Vec<[usize; 3]>,
}

impl TriSurface {
	pub fn new(vertices: Vec<V3>, faces: Vec<[usize; 3]>) -> Self {
		Self { vertices, faces }
	}

	/// Undirected edges, three per face, duplicates included. Consumers
	/// that need uniqueness dedup on the unordered pair.
	pub fn face_edges(&self) -> impl Iterator<Item = [usize; 2]> + '_ {
		self.faces.iter().flat_map(|f| {
			[[f[0], f[1]], [f[1], f[2]], [f[2], f[0]]]
		})
	}

	pub fn bounds(&self) -> Option<BoundBox> {
		BoundBox::from_points(&self.vertices)
	}

	/// Flat rectangular test sheet in the y = `height` plane,
	/// `nx` x `nz` vertices separated by `spacing`.
	pub fn grid(nx: usize, nz: usize, spacing: f64, height: f64) -> Self {
		let mut vertices = Vec::with_capacity(nx * nz);
		for ix in 0..nx {
			for iz in 0..nz {
				vertices.push(V3::new(
					spacing * ix as f64,
					height,
					spacing * iz as f64,
				));
			}
		}
		let mut faces = vec![];
		for ix in 1..nx {
			for iz in 1..nz {
				let v00 = (ix - 1) * nz + iz - 1;
				let v01 = (ix - 1) * nz + iz;
				let v10 = ix * nz + iz - 1;
				let v11 = ix * nz + iz;
				faces.push([v00, v10, v11]);
				faces.push([v00, v11, v01]);
			}
		}
		Self { vertices, faces }
	}
}
