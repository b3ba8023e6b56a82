use std::{
    error::Error,
    fmt::{self, Display},
    path::PathBuf,
};
use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a servercontrol-related operation.
pub type ServerControlResult<T> = Result<T, ServerControlError>;

/// The result of a sandbox runtime call.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// An error that occurred while orchestrating game-server instances.
#[derive(pretty_error_debug::Debug, Error)]
pub enum ServerControlError {
    /// An I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An error that can represent any error.
    #[error(transparent)]
    Custom(#[from] AnyError),

    /// An error reported by the sandbox runtime outside of a specific lifecycle operation.
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// An error that occurred while (de)serializing JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error that occurred while parsing a TOML document.
    #[error("toml parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// The configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Stored instance settings could not be used.
    #[error("settings error: {0}")]
    Settings(String),

    /// A caller-supplied argument is invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The instance name could not be generated because the clock could not be read.
    #[error("failed to generate instance name: {0}")]
    NameGeneration(String),

    /// Every port in the allocation range is occupied.
    #[error("no free port in range {start}-{end}")]
    NoCapacity {
        /// First port of the range.
        start: u16,

        /// Last port of the range (inclusive).
        end: u16,
    },

    /// The allocated game port or its query port was already bound when the sandbox tried to
    /// bind them.
    #[error(
        "port {port} or query port {query_port} is already bound{}",
        left_behind(.sandbox_id)
    )]
    PortConflict {
        /// The allocated game port.
        port: u16,

        /// The query port published alongside it.
        query_port: u16,

        /// The sandbox that failed to bind it, if one was created. It must be deleted by the
        /// caller.
        sandbox_id: Option<String>,
    },

    /// The instance image could not be pulled.
    #[error("image {image} is unavailable: {source}")]
    ImageUnavailable {
        /// The image reference.
        image: String,

        /// The underlying runtime error.
        #[source]
        source: RuntimeError,
    },

    /// The instance storage directory could not be prepared.
    #[error("failed to prepare storage directory {}: {source}", .path.display())]
    StorageError {
        /// The directory path.
        path: PathBuf,

        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The sandbox was created but could not be started. It must be deleted by the caller.
    #[error("sandbox {sandbox_id} was created but failed to start: {source}")]
    StartAfterCreateFailed {
        /// The orphaned sandbox.
        sandbox_id: String,

        /// The underlying runtime error.
        #[source]
        source: RuntimeError,
    },

    /// The runtime rejected a start request.
    #[error("failed to start instance {id}: {source}")]
    StartError {
        /// The instance id.
        id: String,

        /// The underlying runtime error.
        #[source]
        source: RuntimeError,
    },

    /// The runtime rejected a stop request.
    #[error("failed to stop instance {id}: {source}")]
    StopError {
        /// The instance id.
        id: String,

        /// The underlying runtime error.
        #[source]
        source: RuntimeError,
    },

    /// The runtime failed to remove the sandbox.
    #[error("failed to delete instance {id}: {source}")]
    DeleteError {
        /// The instance id.
        id: String,

        /// The underlying runtime error.
        #[source]
        source: RuntimeError,
    },

    /// The instance output could not be read.
    #[error("logs unavailable for instance {id}: {source}")]
    LogsUnavailable {
        /// The instance id.
        id: String,

        /// The underlying runtime error.
        #[source]
        source: RuntimeError,
    },
}

/// An error reported by a sandbox runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// No sandbox or image matches the reference.
    #[error("not found: {0}")]
    NotFound(String),

    /// The sandbox is already in the requested state.
    #[error("not modified: {0}")]
    NotModified(String),

    /// A requested host port is already bound by someone else.
    #[error("port already allocated: {0}")]
    PortAllocated(String),

    /// The request conflicts with the current state, e.g. a duplicate name.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The runtime or the registry behind it could not be reached.
    #[error("runtime unavailable: {0}")]
    Unavailable(String),

    /// Any other error response from the runtime.
    #[error("runtime responded with status {status}: {message}")]
    Api {
        /// The status code of the response.
        status: u16,

        /// The message of the response.
        message: String,
    },
}

/// An error that can represent any error.
#[derive(Debug)]
pub struct AnyError {
    error: anyhow::Error,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ServerControlError {
    /// Creates a new `Err` result.
    pub fn custom(error: impl Into<anyhow::Error>) -> ServerControlError {
        ServerControlError::Custom(AnyError {
            error: error.into(),
        })
    }

    /// A stable, machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Custom(_) => "custom",
            Self::Runtime(_) => "runtime",
            Self::Json(_) => "json",
            Self::TomlDe(_) | Self::Config(_) => "config",
            Self::Settings(_) => "settings",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NameGeneration(_) => "name_generation",
            Self::NoCapacity { .. } => "no_capacity",
            Self::PortConflict { .. } => "port_conflict",
            Self::ImageUnavailable { .. } => "image_unavailable",
            Self::StorageError { .. } => "storage_error",
            Self::StartAfterCreateFailed { .. } => "start_after_create_failed",
            Self::StartError { .. } => "start_error",
            Self::StopError { .. } => "stop_error",
            Self::DeleteError { .. } => "delete_error",
            Self::LogsUnavailable { .. } => "logs_unavailable",
        }
    }

    /// The runtime error behind this error, if any.
    pub fn runtime_source(&self) -> Option<&RuntimeError> {
        match self {
            Self::Runtime(source)
            | Self::ImageUnavailable { source, .. }
            | Self::StartAfterCreateFailed { source, .. }
            | Self::StartError { source, .. }
            | Self::StopError { source, .. }
            | Self::DeleteError { source, .. }
            | Self::LogsUnavailable { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Whether the error was caused by the target sandbox not existing.
    pub fn is_not_found(&self) -> bool {
        matches!(self.runtime_source(), Some(RuntimeError::NotFound(_)))
    }
}

impl RuntimeError {
    /// Whether the runtime itself (rather than the request) is at fault.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl AnyError {
    /// Downcasts the error to a `T`.
    pub fn downcast<T>(&self) -> Option<&T>
    where
        T: Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.downcast_ref::<T>()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn left_behind(sandbox_id: &Option<String>) -> String {
    sandbox_id
        .as_ref()
        .map(|id| format!(" (sandbox {id} was left behind)"))
        .unwrap_or_default()
}

/// Creates an `Ok` `ServerControlResult`.
#[allow(non_snake_case)]
pub fn Ok<T>(value: T) -> ServerControlResult<T> {
    Result::Ok(value)
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl PartialEq for AnyError {
    fn eq(&self, other: &Self) -> bool {
        self.error.to_string() == other.error.to_string()
    }
}

impl Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for AnyError {}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_not_found_detection() {
        let err = ServerControlError::DeleteError {
            id: "abc".to_string(),
            source: RuntimeError::NotFound("abc".to_string()),
        };
        assert!(err.is_not_found());
        assert_eq!(err.kind(), "delete_error");

        let err = ServerControlError::NoCapacity {
            start: 8211,
            end: 8213,
        };
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "no free port in range 8211-8213");
    }
}
