pub mod errors;
pub mod features;
pub mod metadata;
pub mod report;
pub mod vectors;

pub use errors::{LoadError, SaveError};
pub use features::{features_to_json, load_features, parse_features, save_features};
pub use metadata::VectorMetadata;
pub use report::{load_report, save_report, REPORT_FILE_NAME};
pub use vectors::{load_vectors, parse_vectors, save_vectors, vectors_to_json, VectorFile};
