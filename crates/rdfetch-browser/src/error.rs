use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium error: {0}")]
    ChromiumError(String),

    #[error("navigation failed: {0}")]
    NavigationError(String),

    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("browser session invalid: {0}")]
    SessionInvalid(String),

    #[error("render failed: {0}")]
    Render(String),
}

impl BrowserError {
    /// Classify a CDP error, keeping transport death distinguishable so
    /// callers can trigger session recovery instead of misreading a dead
    /// websocket as a page-level failure.
    pub(crate) fn from_cdp(err: chromiumoxide::error::CdpError) -> Self {
        use chromiumoxide::error::CdpError;
        match err {
            CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse => {
                Self::SessionInvalid(err.to_string())
            }
            CdpError::Timeout => Self::Timeout("CDP request timed out".to_string()),
            other => Self::ChromiumError(other.to_string()),
        }
    }

    /// Whether this error means the underlying session is dead.
    pub fn is_session_invalid(&self) -> bool {
        matches!(self, Self::SessionInvalid(_))
    }
}
