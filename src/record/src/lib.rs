pub mod frame;
pub mod network;
pub mod snapshot;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Bumped on every incompatible change to any record layout. Decoding
/// refuses other versions outright, nothing is partially loaded.
pub const FORMAT_VERSION: u16 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
	VersionMismatch { found: u16 },
	Malformed,
}

impl std::fmt::Display for DecodeError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::VersionMismatch { found } => write!(
				f,
				"record version {} unsupported, expected {}",
				found, FORMAT_VERSION
			),
			Self::Malformed => write!(f, "malformed record payload"),
		}
	}
}

impl std::error::Error for DecodeError {}

fn encode<T: Serialize>(payload: &T) -> Vec<u8> {
	let mut bytes = FORMAT_VERSION.to_le_bytes().to_vec();
	bytes.extend(bincode::serialize(payload).unwrap());
	bytes
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
	if bytes.len() < 2 {
		return Err(DecodeError::Malformed);
	}
	let found = u16::from_le_bytes([bytes[0], bytes[1]]);
	if found != FORMAT_VERSION {
		return Err(DecodeError::VersionMismatch { found });
	}
	bincode::deserialize(&bytes[2..]).map_err(|_| DecodeError::Malformed)
}
