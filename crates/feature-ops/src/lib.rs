pub mod chamfer;
pub mod context;
pub mod error;
pub mod extrude;
pub mod fillet;
pub mod hole;
pub mod mirror;
pub mod pattern;
pub mod registry;
pub mod revolve;
pub mod schema;
pub mod shell;
pub mod sweep;
pub mod unknown;

pub use context::{ApplyContext, StepOutput};
pub use error::{ErrorKind, FeatureError, RegistryError, SchemaViolation};
pub use registry::{FeatureOp, Registry};
pub use schema::{DecodedSlice, EnumSpec, ParamKind, ParamSchema, ParamSpec, ProfileUse};
