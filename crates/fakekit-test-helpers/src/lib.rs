//! Shared test utilities for fakekit.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`,
//!   plus timeout-guarded awaits
//! - [`assertions`] - Assertion macros over recorded calls
//! - [`logging`] - Tracing subscriber setup for test binaries
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! fakekit-test-helpers = { workspace = true }
//! ```
//!
//! ```rust,ignore
//! use fakekit_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod assertions;
pub mod must;
pub mod prelude;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

pub use must::*;

#[cfg(feature = "logging")]
pub use logging::init_test_logging;
