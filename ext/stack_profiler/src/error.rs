#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The sampled value has no way of exposing its call stack.
    #[error("sample target does not expose stack introspection (not a thread?)")]
    InvalidTarget,

    /// Bad `max_frames`, sample types or other configuration values.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A metric was passed that the recorder was not configured with.
    #[error("unknown metric {0:?}")]
    UnknownMetric(String),

    #[error("failed to decode pprof data: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("malformed profile: {0}")]
    MalformedProfile(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
