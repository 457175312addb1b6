//! Prelude module for convenient imports

pub use crate::context::{FakeOptions, LoadTimeData, TestContext};
pub use crate::events::{EventChannel, ObserverSet};
pub use crate::gate::MethodGate;
pub use crate::proxy::{CallFuture, TestProxy};
pub use crate::recorder::{CallRecorder, RecordedCall};
pub use crate::resolver::{Promise, PromiseResolver};
pub use crate::state::{Merge, ObservableState, ObserverId, Subscription};
pub use crate::task::{flush_tasks, flush_tasks_n};
pub use fakekit_errors::{ErrorCategory, FakeError, FakeResult};
