pub mod geometry;
pub mod params;
pub mod profile;
pub mod record;
pub mod vector;

pub use geometry::*;
pub use params::*;
pub use profile::*;
pub use record::*;
pub use vector::*;
