use std::{error::Error as StdError, fmt};

use winit::error::EventLoopError;

#[derive(Debug)]
pub enum AppError {
    Unavailable(String), // native API missing or reporting no features
    Initialization {
        stage: &'static str,
        reason: String,
    }, // backend found, context creation failed
    UnknownBackend(String), // nothing registered under that name
    AlreadyInitialized,     // initialize() without an intervening shutdown()
    Winit(EventLoopError),  // winit's EventLoopError
}

impl AppError {
    /// Creation failures the caller can handle by running without a renderer.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Initialization { .. } | Self::UnknownBackend(_)
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "graphics backend unavailable: {reason}"),
            Self::Initialization { stage, reason } => {
                write!(f, "renderer initialization failed: {reason} (stage: {stage})")
            }
            Self::UnknownBackend(name) => write!(f, "no renderer backend registered as '{name}'"),
            Self::AlreadyInitialized => write!(f, "renderer is already initialized"),
            Self::Winit(e) => write!(f, "winit: {e}"),
        }
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Winit(e) => Some(e),
            _ => None,
        }
    }
}

/// `?` conversions
impl From<EventLoopError> for AppError {
    fn from(e: EventLoopError) -> Self {
        Self::Winit(e)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Maps raw native errors (loader errors, Vulkan result codes) onto the
/// recoverable variants, tagged with the step that produced them.
pub trait ResultExt<T> {
    fn or_unavailable(self, context: &'static str) -> Result<T>;
    fn or_init_failure(self, stage: &'static str) -> Result<T>;
}

impl<T, E: fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    fn or_unavailable(self, context: &'static str) -> Result<T> {
        self.map_err(|e| AppError::Unavailable(format!("{context}: {e:?}")))
    }

    fn or_init_failure(self, stage: &'static str) -> Result<T> {
        self.map_err(|e| AppError::Initialization {
            stage,
            reason: format!("{e:?}"),
        })
    }
}
