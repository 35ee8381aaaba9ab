pub mod mock_host;
pub mod traits;
pub mod types;

pub use mock_host::{JournalEntry, MockHost};
pub use traits::CadHost;
pub use types::*;
