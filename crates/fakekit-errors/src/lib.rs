//! Error types for the fakekit test-double framework.
//!
//! Every failure a fake can report is a programmer or test-author error:
//! asking for a method that was never declared, reading a call that was never
//! recorded, or awaiting something that never happens. None of them are meant
//! to be recovered from; they fail the individual test loudly.
//!
//! # Modules
//!
//! - [`common`]: the [`FakeError`] enum and its [`ErrorCategory`]
//! - [`prelude`]: convenience re-exports
//!
//! # Example
//!
//! ```
//! use fakekit_errors::prelude::*;
//!
//! fn nth_call(count: usize, index: usize) -> FakeResult<usize> {
//!     if index >= count {
//!         return Err(FakeError::out_of_range("get_hotspot_info", index, count));
//!     }
//!     Ok(index)
//! }
//!
//! assert!(nth_call(1, 0).is_ok());
//! assert_eq!(
//!     nth_call(1, 3).map_err(|e| e.category()),
//!     Err(ErrorCategory::Inspection)
//! );
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod common;
pub mod prelude;

pub use common::{ErrorCategory, FakeError};

/// A specialized `Result` type for fake and test-proxy operations.
pub type FakeResult<T> = std::result::Result<T, FakeError>;
