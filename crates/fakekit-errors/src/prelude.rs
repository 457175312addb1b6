//! Prelude module for convenient error handling imports.
//!
//! ```
//! use fakekit_errors::prelude::*;
//!
//! fn lookup(tracked: &[&str], name: &str) -> FakeResult<()> {
//!     if !tracked.contains(&name) {
//!         return Err(FakeError::unknown_method(name));
//!     }
//!     Ok(())
//! }
//!
//! assert!(lookup(&["get_scanners"], "get_scanners").is_ok());
//! assert!(lookup(&["get_scanners"], "foo").is_err());
//! ```

pub use crate::{
    FakeResult,
    common::{ErrorCategory, FakeError},
};
