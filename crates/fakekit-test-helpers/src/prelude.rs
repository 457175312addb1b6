//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use fakekit_test_helpers::prelude::*;
//! ```

pub use crate::must::{describe, must, must_some, must_with};

#[cfg(feature = "async")]
pub use crate::must::{must_async, must_within, within};

#[cfg(feature = "logging")]
pub use crate::logging::init_test_logging;

pub use crate::{assert_call_args, assert_called, assert_not_called};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
