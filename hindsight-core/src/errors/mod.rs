mod hindsight_error;
mod replay_error;
mod store_error;

pub use hindsight_error::{HindsightError, HindsightResult};
pub use replay_error::ReplayError;
pub use store_error::StoreError;
