//! Transport-layer concerns that sit below the signed-request core in
//! [`crate::connection`]: poll backoff for resources not yet terminal.

pub mod retry;

pub use retry::{PollPolicy, RetryStrategy};
