pub mod polyline;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Default distance within which an element counts as lying on a divider.
pub const DEFAULT_SNAP_EPSILON: f64 = 1e-9;
