use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use crate::errors::TaskError;
use crate::events::{TaskListener, TaskOutcome};

/// Anything that can be asked whether its work should be abandoned.
///
/// Long I/O collaborators (file loaders, factories) accept a `Cancelable` and
/// poll it periodically; task handles and contexts implement it, so work
/// started from a task stops when the task is cancelled.
pub trait Cancelable {
    /// Returns `true` once cancellation has been requested
    fn is_cancelled(&self) -> bool;
}

/// A [`Cancelable`](Cancelable) that never cancels, for callers outside any task.
pub struct NeverCancelled;

impl Cancelable for NeverCancelled {
    fn is_cancelled(&self) -> bool { false }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Terminal(TaskOutcome),
}

struct ControlState {
    phase: Phase,
    pause_requested: bool,
    sticky_error: Option<String>,
    progress: f64,
    begin_progress: f64,
    end_progress: f64,
}

struct Control {
    state: Mutex<ControlState>,
    cond: Condvar,
    cancelled: AtomicBool,
    listeners: Mutex<Vec<Box<dyn TaskListener>>>,
}

/// Recovers the guard when another thread panicked while holding the lock;
/// the framework's own invariants survive such a panic.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Control {
    fn new() -> Control {
        Control {
            state: Mutex::new(ControlState {
                phase: Phase::Idle,
                pause_requested: false,
                sticky_error: None,
                progress: 0.0,
                begin_progress: 0.0,
                end_progress: 1.0,
            }),
            cond: Condvar::new(),
            cancelled: AtomicBool::new(false),
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn fire<F: FnMut(&mut dyn TaskListener)>(&self, mut event: F) {
        let mut listeners = lock(&self.listeners);
        for listener in listeners.iter_mut() {
            event(listener.as_mut());
        }
    }
}

type Body<T> = Box<dyn FnMut(&TaskContext) -> Result<T, TaskError> + Send>;
type ResultSlot<T> = Mutex<Option<Result<T, TaskError>>>;

/// A single-owner long-running unit of work.
///
/// The task owns the lifecycle shell - state transitions, event dispatch,
/// panic containment - and is the sole caller of the body closure it was
/// created with. The body cooperates through the [`TaskContext`](TaskContext)
/// it receives: it calls [`checkpoint()`](TaskContext::checkpoint) at natural
/// boundaries (which is where cancellation and pausing take effect) and
/// reports progress and messages.
///
/// Observers follow a run through [`TaskListener`](TaskListener)s registered
/// with [`add_listener()`](Task::add_listener); other threads control it
/// through cloneable [`TaskHandle`](TaskHandle)s.
pub struct Task<T> {
    control: Arc<Control>,
    result: Arc<ResultSlot<T>>,
    body: Body<T>,
}

impl<T> Task<T> {
    /// Wraps a body closure as an idle task
    pub fn new<F>(body: F) -> Task<T>
    where
        F: FnMut(&TaskContext) -> Result<T, TaskError> + Send + 'static,
    {
        Task {
            control: Arc::new(Control::new()),
            result: Arc::new(Mutex::new(None)),
            body: Box::new(body),
        }
    }

    /// Returns a handle through which other threads control this task
    pub fn handle(&self) -> TaskHandle<T> {
        TaskHandle { control: self.control.clone(), result: self.result.clone() }
    }

    /// Registers a listener; events of every subsequent run are delivered to it
    pub fn add_listener(&self, listener: Box<dyn TaskListener>) {
        lock(&self.control.listeners).push(listener);
    }

    /// Narrows the window progress reports are mapped into.
    ///
    /// The body always reports fractions of its own work in `[0, 1]`; listeners
    /// observe them mapped into `[begin, end]`. Legal only while the task is
    /// idle.
    pub fn set_progress_range(&mut self, begin: f64, end: f64) -> Result<(), TaskError> {
        if !begin.is_finite() || !end.is_finite() || begin < 0.0 || end > 1.0 || begin > end || end <= 0.0 {
            return Err(TaskError::InvalidConfiguration(format!(
                "progress window [{begin}, {end}] is not within [0, 1] or is inverted"
            )));
        }
        let mut state = lock(&self.control.state);
        if state.phase != Phase::Idle {
            return Err(TaskError::InvalidState("progress window can be set only before the task starts".into()));
        }
        state.begin_progress = begin;
        state.end_progress = end;
        state.progress = begin;
        Ok(())
    }

    /// Runs the task body on the calling thread.
    ///
    /// Fires `begun`, invokes the body unless cancellation already happened,
    /// stores the result, and fires `ended` with the terminal outcome - on all
    /// exit paths, a panicking body included. Fails with
    /// [`RejectedExecution`](TaskError::RejectedExecution) when the task is
    /// already running, and with [`InvalidState`](TaskError::InvalidState)
    /// when it finished and was not [`reset()`](Task::reset).
    pub fn run(&mut self) -> Result<TaskOutcome, TaskError> {
        {
            let mut state = lock(&self.control.state);
            match state.phase {
                Phase::Idle => {
                    state.phase = Phase::Running;
                    state.progress = state.begin_progress;
                }
                Phase::Running => return Err(TaskError::RejectedExecution),
                Phase::Terminal(_) => {
                    return Err(TaskError::InvalidState("the task already finished; reset() it to run again".into()));
                }
            }
        }
        self.control.fire(|l| l.on_begun());

        let executed = if self.control.cancelled.load(Ordering::SeqCst) {
            // cancelled between construction and start: the body is never entered
            Ok(Err(TaskError::Cancelled))
        } else {
            let context = TaskContext { control: &self.control };
            catch_unwind(AssertUnwindSafe(|| (self.body)(&context)))
        };

        let result: Result<T, TaskError> = match executed {
            Ok(result) => result,
            Err(payload) => Err(TaskError::Panicked(panic_message(payload))),
        };
        let outcome = match &result {
            Ok(_) => TaskOutcome::Success,
            Err(TaskError::Cancelled) => TaskOutcome::Cancelled,
            Err(_) => TaskOutcome::Error,
        };

        {
            let mut state = lock(&self.control.state);
            *lock(&self.result) = Some(result);
            state.phase = Phase::Terminal(outcome);
        }
        self.control.cond.notify_all();
        self.control.fire(|l| l.on_ended(outcome));
        debug!("task finished: {:?}", outcome);
        Ok(outcome)
    }

    /// Returns a finished task to the idle state so it can be run again.
    ///
    /// Legal only from a terminal state.
    pub fn reset(&mut self) -> Result<(), TaskError> {
        let mut state = lock(&self.control.state);
        match state.phase {
            Phase::Terminal(_) => {
                state.phase = Phase::Idle;
                state.pause_requested = false;
                state.sticky_error = None;
                state.progress = state.begin_progress;
                self.control.cancelled.store(false, Ordering::SeqCst);
                *lock(&self.result) = None;
                Ok(())
            }
            _ => Err(TaskError::InvalidState("only a finished task can be reset".into())),
        }
    }
}

impl<T: Send + 'static> Task<T> {
    /// Moves the task onto a freshly spawned thread.
    ///
    /// Returns the join handle of that thread together with a
    /// [`TaskHandle`](TaskHandle) for control and result retrieval.
    pub fn spawn(mut self) -> (thread::JoinHandle<()>, TaskHandle<T>) {
        let handle = self.handle();
        let join = thread::spawn(move || {
            let _ = self.run();
        });
        (join, handle)
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "panic of an unknown type".to_string()
    }
}

/// Runs a closure against a detached context, outside any task.
///
/// This lets code written to cooperate with a task - checkpoints, progress
/// reports - be called synchronously when no lifecycle, events or cancellation
/// are needed: the detached context never cancels, never pauses and drops all
/// reports.
pub fn run_detached<T>(work: impl FnOnce(&TaskContext) -> T) -> T {
    let control = Control::new();
    work(&TaskContext { control: &control })
}

/// The body's window into the task that hosts it.
pub struct TaskContext<'a> {
    control: &'a Control,
}

impl TaskContext<'_> {
    /// Observes control requests; the body calls this at natural boundaries.
    ///
    /// Surfaces a pending cancellation as [`Cancelled`](TaskError::Cancelled)
    /// and an error posted from another thread as
    /// [`Failed`](TaskError::Failed). While a pause is requested the call
    /// parks, firing `paused` on the way in and `resumed` on the way out; a
    /// cancellation wakes a parked body.
    pub fn checkpoint(&self) -> Result<(), TaskError> {
        {
            let mut state = lock(&self.control.state);
            if let Some(message) = state.sticky_error.take() {
                return Err(TaskError::Failed(message));
            }
        }
        if self.control.cancelled.load(Ordering::SeqCst) {
            return Err(TaskError::Cancelled);
        }

        let pause_pending = lock(&self.control.state).pause_requested;
        if pause_pending {
            self.control.fire(|l| l.on_paused());
            let mut state = lock(&self.control.state);
            while state.pause_requested && !self.control.cancelled.load(Ordering::SeqCst) {
                state = self.control.cond.wait(state).unwrap_or_else(|poisoned| poisoned.into_inner());
            }
            drop(state);
            self.control.fire(|l| l.on_resumed());
            if self.control.cancelled.load(Ordering::SeqCst) {
                return Err(TaskError::Cancelled);
            }
        }
        Ok(())
    }

    /// Reports how far the body got, as a fraction of its own work in `[0, 1]`.
    ///
    /// The value is mapped into the configured window and reported to listeners
    /// only when it exceeds everything reported before, so observed progress
    /// never decreases.
    pub fn set_progress(&self, fraction: f64) {
        let mapped = {
            let mut state = lock(&self.control.state);
            let fraction = fraction.clamp(0.0, 1.0);
            let mapped = state.begin_progress + fraction * (state.end_progress - state.begin_progress);
            if mapped > state.progress {
                state.progress = mapped;
                Some(mapped)
            } else {
                None
            }
        };
        if let Some(progress) = mapped {
            self.control.fire(|l| l.on_progress(progress));
        }
    }

    /// Sends a status line to the listeners
    pub fn post_message(&self, message: &str) {
        debug!("{}", message);
        self.control.fire(|l| l.on_message(message));
    }

    /// Builds the error a body returns to fail deliberately.
    ///
    /// The failure is recorded as an [`Error`](TaskOutcome::Error) outcome
    /// carrying just the message, no cause chain.
    pub fn fail<S: Into<String>>(&self, message: S) -> TaskError {
        TaskError::Failed(message.into())
    }
}

impl Cancelable for TaskContext<'_> {
    fn is_cancelled(&self) -> bool { self.control.cancelled.load(Ordering::SeqCst) }
}

/// Controls a [`Task`](Task) and retrieves its result, possibly from another thread.
pub struct TaskHandle<T> {
    control: Arc<Control>,
    result: Arc<ResultSlot<T>>,
}

impl<T> Clone for TaskHandle<T> {
    fn clone(&self) -> Self {
        TaskHandle { control: self.control.clone(), result: self.result.clone() }
    }
}

impl<T> TaskHandle<T> {
    /// Requests cancellation.
    ///
    /// The running body observes the request at its next checkpoint; a paused
    /// body is woken first. Cancelling a task that never started moves it to
    /// the `Cancelled` terminal state directly, without ever entering the body.
    pub fn cancel(&self) {
        self.control.cancelled.store(true, Ordering::SeqCst);
        {
            let mut state = lock(&self.control.state);
            if state.phase == Phase::Idle {
                *lock(&self.result) = Some(Err(TaskError::Cancelled));
                state.phase = Phase::Terminal(TaskOutcome::Cancelled);
            }
        }
        self.control.cond.notify_all();
    }

    /// Asks the body to park at its next checkpoint
    pub fn pause(&self) {
        lock(&self.control.state).pause_requested = true;
    }

    /// Lets a paused body continue
    pub fn resume(&self) {
        lock(&self.control.state).pause_requested = false;
        self.control.cond.notify_all();
    }

    /// Posts an error from outside the body; the body observes it at its next
    /// checkpoint and unwinds with an `Error` outcome
    pub fn post_error<S: Into<String>>(&self, message: S) {
        lock(&self.control.state).sticky_error = Some(message.into());
        self.control.cond.notify_all();
    }

    /// Says which terminal state the task reached, if any
    pub fn outcome(&self) -> TaskOutcome {
        match lock(&self.control.state).phase {
            Phase::Terminal(outcome) => outcome,
            _ => TaskOutcome::NotFinished,
        }
    }

    /// Returns the most recently reported progress, within the configured window
    pub fn progress(&self) -> f64 {
        lock(&self.control.state).progress
    }

    /// Blocks until the task reaches a terminal state and takes its result.
    ///
    /// Cancellation surfaces as [`Cancelled`](TaskError::Cancelled), a failed
    /// body as the error it was captured with. The result can be taken once;
    /// a later call fails with [`InvalidState`](TaskError::InvalidState).
    pub fn get(&self) -> Result<T, TaskError> {
        let mut state = lock(&self.control.state);
        while !matches!(state.phase, Phase::Terminal(_)) {
            state = self.control.cond.wait(state).unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        drop(state);
        self.take_result()
    }

    /// As [`get()`](TaskHandle::get), but gives up after `timeout`
    pub fn get_timeout(&self, timeout: Duration) -> Result<T, TaskError> {
        let deadline = Instant::now() + timeout;
        let mut state = lock(&self.control.state);
        while !matches!(state.phase, Phase::Terminal(_)) {
            let now = Instant::now();
            if now >= deadline {
                return Err(TaskError::Timeout);
            }
            let (guard, _) = self
                .control
                .cond
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            state = guard;
        }
        drop(state);
        self.take_result()
    }

    fn take_result(&self) -> Result<T, TaskError> {
        match lock(&self.result).take() {
            Some(result) => result,
            None => Err(TaskError::InvalidState("the task result was already taken".into())),
        }
    }
}

impl<T> Cancelable for TaskHandle<T> {
    fn is_cancelled(&self) -> bool {
        self.control.cancelled.load(Ordering::SeqCst)
    }
}
