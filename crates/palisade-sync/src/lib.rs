mod retry;
mod worker;

pub use retry::{retry_with_backoff, RetryConfig};
pub use worker::{SyncConfig, SyncProcess};
