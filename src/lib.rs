// localstore - JSON record collections over a key-value medium

pub mod codec;
pub mod config;
pub mod error;
pub mod medium;
pub mod record;
pub mod sqlite;
pub mod store;
pub mod task;

// Re-export main types for convenience
pub use config::{Config, MediumKind};
pub use error::{StoreError, StoreResult};
pub use medium::{Medium, MemoryMedium};
pub use record::Record;
pub use sqlite::SqliteMedium;
pub use store::{KeyValueStore, RemoveOutcome, UpdateOutcome};
pub use task::{Task, TaskId};

/// Current time in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms() {
        let ts = now_ms();
        // Should be reasonable timestamp (after year 2020)
        assert!(ts > 1_600_000_000_000);
    }
}
