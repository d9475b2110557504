use record::DecodeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
	/// The source geometry cannot be triangulated; no cloth exists.
	UnconvertibleGeometry,
	/// A serialized network or timeline failed to decode.
	Decode(DecodeError),
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Self::UnconvertibleGeometry => {
				write!(f, "geometry cannot be converted to a triangle mesh")
			}
			Self::Decode(e) => write!(f, "{}", e),
		}
	}
}

impl std::error::Error for Error {}

impl From<DecodeError> for Error {
	fn from(e: DecodeError) -> Self {
		Self::Decode(e)
	}
}
