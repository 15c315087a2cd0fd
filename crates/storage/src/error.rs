use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    #[snafu(display("failed to encode navigation snapshot for '{key}' at {stage}: {source}"))]
    EncodeSnapshot {
        stage: &'static str,
        key: String,
        source: serde_json::Error,
    },
    #[snafu(display("{store} lock was poisoned at {stage}"))]
    LockPoisoned {
        stage: &'static str,
        store: &'static str,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;
