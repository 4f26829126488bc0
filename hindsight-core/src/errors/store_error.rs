/// Log store subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {message}")]
    SqliteError { message: String },

    #[error("migration v{version:03} failed: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("malformed log record {sequence}: {reason}")]
    MalformedRecord { sequence: u64, reason: String },
}
