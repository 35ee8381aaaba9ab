pub mod loops;
pub mod types;
pub mod winding;

pub use loops::{build_loops, build_profile, DEFAULT_TOLERANCE};
pub use types::*;
pub use winding::{sample_points, signed_area};
