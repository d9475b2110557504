use std::sync::Arc;

use fnv::FnvHashSet;

use record::snapshot::MeshRecord;
use scene::surface::TriSurface;

use crate::error::Error;
use crate::particle::Particle;
use crate::spring::Spring;
use crate::V3;

/// Immutable spring network: the springs themselves plus the incident
/// spring list of every particle. Shared by reference between a cloth
/// and its duplicates, only particle state is ever copied.
pub struct Topology {
	springs: Vec<Spring>,
	incident: Vec<Vec<usize>>,
}

#[derive(Clone)]
pub struct ClothMesh {
	surface: TriSurface,
	particles: Vec<Particle>,
	pinned: Vec<bool>,
	topology: Arc<Topology>,
}

impl ClothMesh {
	/// Build the mass/spring network for a triangulated surface: one
	/// particle per vertex, one spring per unique unordered edge pair
	/// with the edge's build-time length as rest length. First layer
	/// springs only, no shear or bending layer.
	pub fn from_surface(surface: TriSurface, vertex_mass: f64) -> Result<Self, Error> {
		if surface.vertices.is_empty() || surface.faces.is_empty() {
			return Err(Error::UnconvertibleGeometry);
		}
		let n = surface.vertices.len();
		let particles: Vec<Particle> = surface
			.vertices
			.iter()
			.enumerate()
			.map(|(id, pos)| Particle::new(id, *pos, vertex_mass))
			.collect();

		let mut springs = vec![];
		let mut incident = vec![vec![]; n];
		let mut seen = FnvHashSet::default();
		for [a, b] in surface.face_edges() {
			if a == b {
				continue;
			}
			let key = if a < b { (a, b) } else { (b, a) };
			if !seen.insert(key) {
				continue;
			}
			let rest_length =
				(surface.vertices[a] - surface.vertices[b]).magnitude();
			if rest_length == 0.0 {
				eprintln!("WARN: degenerate edge {}-{} skipped", a, b);
				continue;
			}
			let idx = springs.len();
			springs.push(Spring::new(a, b, rest_length));
			incident[a].push(idx);
			incident[b].push(idx);
		}

		Ok(Self {
			surface,
			particles,
			pinned: vec![false; n],
			topology: Arc::new(Topology { springs, incident }),
		})
	}

	/// Fresh particle array, shared spring topology.
	pub fn duplicate(&self) -> Self {
		self.clone()
	}

	pub fn particle_count(&self) -> usize {
		self.particles.len()
	}

	pub fn particles(&self) -> &[Particle] {
		&self.particles
	}

	pub fn springs(&self) -> &[Spring] {
		&self.topology.springs
	}

	pub fn incident(&self, idx: usize) -> &[usize] {
		&self.topology.incident[idx]
	}

	pub fn surface(&self) -> &TriSurface {
		&self.surface
	}

	pub fn pinned(&self) -> &[bool] {
		&self.pinned
	}

	pub fn set_pinned(&mut self, flags: &[bool]) {
		assert_eq!(flags.len(), self.pinned.len());
		self.pinned.copy_from_slice(flags);
	}

	/// Excluded from force-driven motion: pinned, or no spring can act
	/// on it. Recomputed from current state on every call so pin edits
	/// mid-run take effect immediately.
	pub fn is_fixed(&self, idx: usize) -> bool {
		self.pinned[idx] || self.topology.incident[idx].is_empty()
	}

	pub fn connected(&self, i: usize, j: usize) -> bool {
		self.topology.incident[i]
			.iter()
			.any(|&s| self.topology.springs[s].connects(i, j))
	}

	pub fn positions(&self) -> Vec<V3> {
		self.particles.iter().map(|p| p.pos).collect()
	}

	/// Move every particle, keeping the underlying surface in sync
	/// (particle count equals vertex count at all times).
	pub fn set_positions(&mut self, positions: &[V3]) {
		assert_eq!(positions.len(), self.particles.len());
		for (i, pos) in positions.iter().enumerate() {
			self.particles[i].pos = *pos;
			self.surface.vertices[i] = *pos;
		}
	}

	pub fn set_velocities(&mut self, velocities: &[V3]) {
		assert_eq!(velocities.len(), self.particles.len());
		for (i, vel) in velocities.iter().enumerate() {
			self.particles[i].vel = *vel;
		}
	}

	pub fn record(&self) -> MeshRecord {
		MeshRecord {
			vertices: self.particles.iter().map(|p| p.pos.into()).collect(),
			velocities: self.particles.iter().map(|p| p.vel.into()).collect(),
			faces: self.surface.faces.clone(),
			pinned: self.pinned.clone(),
			vertex_mass: self.particles.first().map_or(0.0, |p| p.mass),
		}
	}

	pub fn from_record(rec: &MeshRecord) -> Result<Self, Error> {
		let n = rec.vertices.len();
		if rec.velocities.len() != n || rec.pinned.len() != n {
			return Err(Error::Decode(record::DecodeError::Malformed));
		}
		if rec
			.faces
			.iter()
			.any(|f| f.iter().any(|&v| v >= n))
		{
			return Err(Error::Decode(record::DecodeError::Malformed));
		}
		let surface = TriSurface::new(
			rec.vertices.iter().map(|v| V3::from(*v)).collect(),
			rec.faces.clone(),
		);
		let mut mesh = Self::from_surface(surface, rec.vertex_mass)?;
		let velocities: Vec<V3> =
			rec.velocities.iter().map(|v| V3::from(*v)).collect();
		mesh.set_velocities(&velocities);
		mesh.set_pinned(&rec.pinned);
		Ok(mesh)
	}
}
