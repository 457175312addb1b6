//! Building blocks for fake service implementations used in UI tests.
//!
//! A fake stands in for a production client interface. It has to answer
//! three questions for the test that drives it: *was this method called, and
//! with what*, *can I wait until it is called next*, and *can I push a new
//! backend state and have every listener see it*.
//!
//! # Architecture
//!
//! - [`recorder`]: ordered log of `(method, args)` pairs
//! - [`resolver`]: single-resolution promise cells
//! - [`gate`]: per-method resolvers that re-arm after every call
//! - [`proxy`]: recorder + gate + canned results in one object
//! - [`state`]: observable backend snapshot with replay-on-subscribe
//! - [`events`]: one-shot event delivery to one bound remote or many observers
//! - [`context`]: per-test configuration replacing process-wide globals
//! - [`task`]: scheduler flush helpers
//!
//! # Example
//!
//! ```
//! use fakekit_core::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> FakeResult<()> {
//! let proxy = TestProxy::new(["set_pref"]);
//! let next = proxy.when_called::<(String, bool)>("set_pref")?;
//!
//! proxy.method_called("set_pref", ("bluetooth.enabled".to_string(), true));
//!
//! let (key, value) = next.await?;
//! assert_eq!(key, "bluetooth.enabled");
//! assert!(value);
//! assert_eq!(proxy.count_calls("set_pref"), 1);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod context;
pub mod events;
pub mod gate;
pub mod prelude;
pub mod proxy;
pub mod recorder;
pub mod resolver;
pub mod state;
pub mod task;

pub use context::{FakeOptions, LoadTimeData, TestContext};
pub use events::{EventChannel, ObserverSet};
pub use gate::MethodGate;
pub use proxy::{CallFuture, TestProxy};
pub use recorder::{CallRecorder, RecordedCall};
pub use resolver::{Promise, PromiseResolver};
pub use state::{Merge, ObservableState, ObserverId, Subscription};
pub use task::{flush_tasks, flush_tasks_n};

pub use fakekit_errors::{FakeError, FakeResult};
