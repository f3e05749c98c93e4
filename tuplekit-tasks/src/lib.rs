//! Long-running computations as cancellable, pausable tasks.
//!
//! A [`Task`](Task) wraps a unit of work that may run for minutes - such as a
//! clustering pass - and gives its owner a [`TaskHandle`](TaskHandle) to
//! cancel it, pause it, follow its progress and block for its result. The work
//! itself cooperates through the [`TaskContext`](TaskContext) it receives:
//! it polls [`checkpoint()`](TaskContext::checkpoint) at natural boundaries
//! and reports progress and messages, which the task fans out to registered
//! [`TaskListener`](TaskListener)s.
//!
//! ```rust
//! use tuplekit_tasks::{Task, TaskOutcome};
//!
//! let mut task = Task::new(|ctx| {
//!     let mut total = 0u64;
//!     for i in 0..100u64 {
//!         ctx.checkpoint()?;
//!         total += i;
//!         ctx.set_progress(i as f64 / 100.0);
//!     }
//!     Ok(total)
//! });
//! let handle = task.handle();
//! task.run().unwrap();
//! assert_eq!(handle.outcome(), TaskOutcome::Success);
//! assert_eq!(handle.get().unwrap(), 4950);
//! ```

mod task;
mod events;
pub mod errors;

pub use errors::TaskError;
pub use events::{TaskListener, TaskOutcome};
pub use task::{run_detached, Cancelable, NeverCancelled, Task, TaskContext, TaskHandle};
