use serde::{Deserialize, Serialize};

use crate::snapshot::MeshRecord;
use crate::{decode, encode, DecodeError};

/// One cached frame: `[frame number][mesh snapshot]`. Frame numbers may
/// be negative for pre-roll drape frames that a host chose to persist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
	pub frame: i32,
	pub mesh: MeshRecord,
}

/// Ordered list of cached frames. The drape register is transient and
/// never serialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineRecord {
	pub frames: Vec<FrameRecord>,
}

impl TimelineRecord {
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

	#[test]
	fn test_round_trip_preserves_order_and_sign() {
		let rec = TimelineRecord {
			frames: vec![-2, 0, 5]
				.into_iter()
				.map(|frame| FrameRecord {
					frame,
					mesh: MeshRecord {
						vertices: vec![[frame as f64, 0., 0.]],
						velocities: vec![[0.; 3]],
						faces: vec![],
						pinned: vec![false],
						vertex_mass: 0.5,
					},
				})
				.collect(),
		};
		let back = TimelineRecord::from_bytes(&rec.to_bytes()).unwrap();
		assert_eq!(back, rec);
		assert_eq!(back.frames[0].frame, -2);
	}
}
