use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unknown device profile '{0}' (known: rm2, rmpp)")]
    UnknownProfile(String),
    #[error("unknown absolute axis '{0}'")]
    UnknownAxis(String),
    #[error("invalid display: {0}")]
    InvalidDisplay(String),
    #[error("unsupported input_event size {0} (expected 16 or 24)")]
    InvalidEventSize(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
