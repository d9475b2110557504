pub mod bound;
pub mod fan;
pub mod object;
pub mod query;
pub mod static_scene;
pub mod surface;
pub mod transform;

pub type V3 = nalgebra::Vector3<f64>;
pub type M4 = nalgebra::Matrix4<f64>;
