use thiserror::Error as ThisError;

/// Broad failure categories surfaced to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind
{   InvalidInput
  , Upstream
  , MalformedResponse
  , NetworkUnavailable
  , Configuration
  , Io
  , Internal
}

/// Custom error type for gen3d operations
/// Implements Clone for sending through channels
/// and for storing inside outcome slots
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error
{   /// Rejected before any network call (bad file type,
    /// empty selection, blank prompt, out-of-range tunable)
    #[error("Invalid input: {0}")]
    InvalidInput(String)
  , /// Generation endpoint answered with a non-2xx status;
    /// message is the upstream body text
    #[error("Upstream error (HTTP {status}): {message}")]
    Upstream
    {   status: u16
      , message: String
    }
  , /// 2xx response whose body has the wrong shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String)
  , /// Transport-level failure reaching the endpoint
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String)
  , /// Invalid or missing configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String)
  , /// Local filesystem failure (download, image read)
    #[error("I/O error: {0}")]
    Io(String)
  , /// Session was shut down
    #[error("Session closed")]
    SessionClosed
}

impl Error
{   pub fn kind(&self) -> ErrorKind
    {   match self
        {   Error::InvalidInput(_) => ErrorKind::InvalidInput
          , Error::Upstream { .. } => ErrorKind::Upstream
          , Error::MalformedResponse(_) => {
              ErrorKind::MalformedResponse
            }
          , Error::NetworkUnavailable(_) => {
              ErrorKind::NetworkUnavailable
            }
          , Error::InvalidConfiguration(_) => {
              ErrorKind::Configuration
            }
          , Error::Io(_) => ErrorKind::Io
          , Error::SessionClosed => ErrorKind::Internal
        }
    }
}

impl From<std::io::Error> for Error
{   fn from(e: std::io::Error) -> Self
    {   Error::Io(e.to_string())
    }
}

impl From<reqwest::Error> for Error
{   fn from(e: reqwest::Error) -> Self
    {   Error::NetworkUnavailable(e.to_string())
    }
}
