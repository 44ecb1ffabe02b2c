use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapperError {
    #[error("malformed connection info: {0}")]
    MalformedConnectionInfo(String),

    #[error("invalid provision request: {0}")]
    InvalidRequest(String),

    #[error("unsupported persistent volume type '{0}'")]
    UnsupportedVolumeType(String),
}

pub type Result<T> = std::result::Result<T, MapperError>;

impl MapperError {
    /// Short label used when recording failed operations.
    pub fn kind(&self) -> &'static str {
        match self {
            MapperError::MalformedConnectionInfo(_) => "malformed_connection_info",
            MapperError::InvalidRequest(_) => "invalid_request",
            MapperError::UnsupportedVolumeType(_) => "unsupported_volume_type",
        }
    }
}
