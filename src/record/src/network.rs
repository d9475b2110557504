use serde::{Deserialize, Serialize};

use crate::snapshot::MeshRecord;
use crate::{decode, encode, DecodeError};

/// Everything of the configuration surface that affects cached results.
/// Loading a network with different params invalidates its timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamsRecord {
	pub mesh_tolerance: f64,
	pub spacing: f64,
	pub spring_k: f64,
	pub damping: f64,
	pub vertex_mass: f64,
	pub collision_margin: f64,
	pub gravity: f64,
	pub gravity_axis: u8,
	pub fps: f64,
	pub substeps: u32,
	pub drape_frames: u32,
	pub sim_frames: u32,
	pub self_collision: bool,
	pub point_radius: f64,
	pub floor_collision: bool,
	pub floor: f64,
}

/// Serialized spring/particle network: the surface plus pinned flags the
/// network is reconstructible from, and the parameters it was built
/// with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
	pub mesh: MeshRecord,
	pub params: ParamsRecord,
}

impl NetworkRecord {
	pub fn to_bytes(&self) -> Vec<u8> {
		encode(self)
	}

	pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
		decode(bytes)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::FORMAT_VERSION;

	fn sample() -> NetworkRecord {
		NetworkRecord {
			mesh: MeshRecord {
				vertices: vec![[0., 0., 0.], [1., 0., 0.]],
				velocities: vec![[0.; 3]; 2],
				faces: vec![],
				pinned: vec![false, true],
				vertex_mass: 0.5,
			},
			params: ParamsRecord {
				mesh_tolerance: 0.1,
				spacing: 0.2,
				spring_k: 7.1,
				damping: 2.8,
				vertex_mass: 0.5,
				collision_margin: 0.025,
				gravity: -0.08,
				gravity_axis: 1,
				fps: 30.,
				substeps: 10,
				drape_frames: 0,
				sim_frames: 30,
				self_collision: true,
				point_radius: 0.1,
				floor_collision: false,
				floor: 0.,
			},
		}
	}

	#[test]
	fn test_round_trip() {
		let rec = sample();
		let bytes = rec.to_bytes();
		assert_eq!(NetworkRecord::from_bytes(&bytes).unwrap(), rec);
	}

	#[test]
	fn test_version_mismatch_fails_closed() {
		let mut bytes = sample().to_bytes();
		let bogus = FORMAT_VERSION + 1;
		bytes[0..2].copy_from_slice(&bogus.to_le_bytes());
		assert_eq!(
			NetworkRecord::from_bytes(&bytes),
			Err(DecodeError::VersionMismatch { found: bogus })
		);
	}

	#[test]
	fn test_truncated_payload_is_malformed() {
		let bytes = sample().to_bytes();
		assert_eq!(
			NetworkRecord::from_bytes(&bytes[..bytes.len() - 3]),
			Err(DecodeError::Malformed)
		);
		assert_eq!(
			NetworkRecord::from_bytes(&bytes[..1]),
			Err(DecodeError::Malformed)
		);
	}
}
