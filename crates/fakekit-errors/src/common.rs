//! The top-level error enum and its classification.

use core::fmt;

/// Every failure a fake, a test proxy, or the per-test context can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FakeError {
    /// `when_called` or `reset_resolver` for a name missing from the tracked set
    #[error("Method '{method}' is not tracked by this fake")]
    UnknownMethod {
        /// Requested method name
        method: String,
    },

    /// Inspecting a call that was never recorded
    #[error("Call index {index} out of range for '{method}' ({count} calls recorded)")]
    OutOfRange {
        /// Method name
        method: String,
        /// Requested index
        index: usize,
        /// Number of calls actually recorded
        count: usize,
    },

    /// Stored arguments or canned result are of a different type
    #[error("Value recorded for '{method}' is not of type {expected}")]
    ArgType {
        /// Method name
        method: String,
        /// Type the caller asked for
        expected: &'static str,
    },

    /// A resolver was resolved twice
    #[error("Resolver already resolved")]
    AlreadyResolved,

    /// The resolver backing a pending await was dropped before resolving
    #[error("Pending await for '{method}' was abandoned before it resolved")]
    Abandoned {
        /// Method name
        method: String,
    },

    /// No canned result configured for a method
    #[error("No result configured for '{method}'")]
    NoResult {
        /// Method name
        method: String,
    },

    /// One-shot event delivery with no observer bound to the channel
    #[error("No observer bound to event channel '{channel}'")]
    NoObserverBound {
        /// Channel name
        channel: String,
    },

    /// The awaited method was never called within the test-runner timeout
    #[error("Timed out after {timeout_ms}ms waiting for '{method}'")]
    UnresolvedAwait {
        /// What was awaited
        method: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Malformed test context configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Load-time key not present
    #[error("Missing load-time value '{0}'")]
    MissingKey(String),

    /// Load-time key present with a different type
    #[error("Load-time value '{key}' is not a {expected}")]
    WrongType {
        /// Key
        key: String,
        /// Expected JSON type
        expected: &'static str,
    },

    /// Simulated backend failure reported by a fake
    #[error("Backend error: {0}")]
    Backend(String),
}

impl FakeError {
    /// Get the error category for classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            FakeError::UnknownMethod { .. } | FakeError::NoResult { .. } => ErrorCategory::Setup,
            FakeError::OutOfRange { .. } | FakeError::ArgType { .. } => ErrorCategory::Inspection,
            FakeError::AlreadyResolved
            | FakeError::Abandoned { .. }
            | FakeError::UnresolvedAwait { .. } => ErrorCategory::Await,
            FakeError::NoObserverBound { .. } => ErrorCategory::Observer,
            FakeError::Config(_) | FakeError::MissingKey(_) | FakeError::WrongType { .. } => {
                ErrorCategory::Config
            }
            FakeError::Backend(_) => ErrorCategory::Backend,
        }
    }

    /// Whether a test could plausibly continue after this error.
    ///
    /// Only simulated backend failures qualify; the rest indicate a broken test.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FakeError::Backend(_))
    }

    /// Create an [`FakeError::UnknownMethod`].
    pub fn unknown_method(method: impl Into<String>) -> Self {
        FakeError::UnknownMethod {
            method: method.into(),
        }
    }

    /// Create an [`FakeError::OutOfRange`].
    pub fn out_of_range(method: impl Into<String>, index: usize, count: usize) -> Self {
        FakeError::OutOfRange {
            method: method.into(),
            index,
            count,
        }
    }

    /// Create an [`FakeError::ArgType`] naming the requested type.
    pub fn arg_type<T: ?Sized>(method: impl Into<String>) -> Self {
        FakeError::ArgType {
            method: method.into(),
            expected: core::any::type_name::<T>(),
        }
    }

    /// Create an [`FakeError::Abandoned`].
    pub fn abandoned(method: impl Into<String>) -> Self {
        FakeError::Abandoned {
            method: method.into(),
        }
    }

    /// Create an [`FakeError::NoResult`].
    pub fn no_result(method: impl Into<String>) -> Self {
        FakeError::NoResult {
            method: method.into(),
        }
    }

    /// Create an [`FakeError::NoObserverBound`].
    pub fn no_observer(channel: impl Into<String>) -> Self {
        FakeError::NoObserverBound {
            channel: channel.into(),
        }
    }

    /// Create an [`FakeError::UnresolvedAwait`].
    pub fn unresolved(method: impl Into<String>, timeout_ms: u64) -> Self {
        FakeError::UnresolvedAwait {
            method: method.into(),
            timeout_ms,
        }
    }

    /// Create a configuration error with a message.
    pub fn config(msg: impl Into<String>) -> Self {
        FakeError::Config(msg.into())
    }

    /// Create a simulated backend error with a message.
    pub fn backend(msg: impl Into<String>) -> Self {
        FakeError::Backend(msg.into())
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Fake constructed or configured incorrectly by the test
    Setup = 0,
    /// Reading recorded calls that do not exist or have another type
    Inspection = 1,
    /// Resolver and await misuse
    Await = 2,
    /// Event delivery problems
    Observer = 3,
    /// Test context configuration
    Config = 4,
    /// Simulated backend failures
    Backend = 5,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Setup => write!(f, "Setup"),
            ErrorCategory::Inspection => write!(f, "Inspection"),
            ErrorCategory::Await => write!(f, "Await"),
            ErrorCategory::Observer => write!(f, "Observer"),
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::Backend => write!(f, "Backend"),
        }
    }
}
