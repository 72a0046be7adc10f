/// Failures reading or writing the persisted settings record.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("settings io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("settings record is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings record must be a json object")]
    NotAnObject,

    #[error("could not watch settings file: {0}")]
    Watch(#[from] notify::Error),
}

/// Failures delivering a message to the click loop. The display text is what
/// the control panel shows as its status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("No active tab")]
    NoActiveTab,

    #[error("No access")]
    NoAccess,
}
