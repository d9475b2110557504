pub mod detector;
pub mod primitive;
pub mod triangle;

pub use detector::CollisionDetector;

use crate::V3;

/// Nearest valid intersection along a query direction. "No collision"
/// is `None`, never an error and never a fabricated finite distance.
#[derive(Clone, Copy, Debug)]
pub struct Hit {
	pub distance: f64,
	pub point: V3,
}

pub(crate) const TOL: f64 = 1e-12;
