//! `herald-history`: cumulative, append-only campaign history.
//!
//! The [`store::HistoryStore`] trait is the seam between dispatch logic and
//! persistence. [`store::JsonFileStore`] keeps a single pretty-printed JSON
//! document on disk and replaces it atomically; [`store::InMemoryStore`]
//! keeps everything in process memory.

pub mod error;
pub mod state;
pub mod store;

pub use error::{HistoryError, Result};
pub use state::{HistoryBucket, HistoryState};
pub use store::{HistoryStore, InMemoryStore, JsonFileStore};
