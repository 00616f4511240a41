pub mod geo;
pub mod pii;

pub use geo::GeoPoint;
pub use pii::Masked;
