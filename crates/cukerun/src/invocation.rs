//! Running one step: arity checks, panic capture and backtrace filtering.

use crate::config;
use crate::error::{ExecutionError, StepError};
use crate::feature::{MultilineArgument, Step};
use crate::results::Status;
use crate::step_match::StepMatch;
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Once;

/// Panic payload raised by [`pending!`](crate::pending).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    message: Option<String>,
}

impl PendingRequest {
    /// A pending marker with an optional explanation.
    #[must_use]
    pub fn new(message: Option<String>) -> Self {
        Self { message }
    }

    /// The explanation, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Unwind out of the current step as pending. Used by [`crate::pending!`].
#[doc(hidden)]
pub fn raise_pending(message: Option<String>) {
    panic::resume_unwind(Box::new(PendingRequest::new(message)))
}

struct PanicDetails {
    location: Option<String>,
    backtrace: String,
}

thread_local! {
    static CAPTURE_DEPTH: Cell<usize> = const { Cell::new(0) };
    static LAST_PANIC: RefCell<Option<PanicDetails>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

fn install_panic_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURE_DEPTH.with(Cell::get) == 0 {
                previous(info);
                return;
            }
            let details = PanicDetails {
                location: info.location().map(ToString::to_string),
                backtrace: Backtrace::force_capture().to_string(),
            };
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(details));
        }));
    });
}

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Self {
        CAPTURE_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        CAPTURE_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Run `body`, turning panics into [`StepError`]s. A [`PendingRequest`]
/// payload becomes [`StepError::Pending`].
pub(crate) fn capture(body: impl FnOnce() -> Result<(), StepError>) -> Result<(), StepError> {
    install_panic_hook();
    LAST_PANIC.with(|slot| slot.borrow_mut().take());
    let outcome = {
        let _guard = DepthGuard::enter();
        panic::catch_unwind(AssertUnwindSafe(body))
    };
    outcome.unwrap_or_else(|payload| Err(from_panic(payload)))
}

fn from_panic(payload: Box<dyn Any + Send>) -> StepError {
    let details = LAST_PANIC.with(|slot| slot.borrow_mut().take());
    match payload.downcast::<PendingRequest>() {
        Ok(pending) => StepError::Pending(pending.message),
        Err(payload) => {
            let (location, backtrace) = details.map_or((None, None), |d| {
                (d.location, Some(filter_backtrace(&d.backtrace, config::full_backtrace())))
            });
            StepError::Panic {
                message: panic_message(payload.as_ref()),
                location,
                backtrace,
            }
        }
    }
}

/// Render a panic payload as text.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    macro_rules! try_downcast {
        ($($ty:ty),* $(,)?) => {
            $(
                if let Some(value) = payload.downcast_ref::<$ty>() {
                    return value.to_string();
                }
            )*
        };
    }

    try_downcast!(&str, String, i32, u32, i64, u64, isize, usize, f32, f64);
    format!("panic with a non-text payload (TypeId({:?}))", payload.type_id())
}

const INTERNAL_FRAMES: [&str; 8] = [
    "/rustc/",
    "/.cargo/registry/",
    "/.cargo/git/",
    "std::",
    "core::",
    "alloc::",
    "cukerun::",
    "__rust_",
];

/// Drop frames from the standard library, registry dependencies and this
/// crate unless `full` is set.
#[must_use]
pub fn filter_backtrace(backtrace: &str, full: bool) -> String {
    if full {
        return backtrace.to_owned();
    }
    let mut frames: Vec<Vec<&str>> = Vec::new();
    for line in backtrace.lines() {
        let starts_frame = line
            .trim_start()
            .split_once(':')
            .is_some_and(|(index, _)| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()));
        match frames.last_mut() {
            Some(frame) if !starts_frame => frame.push(line),
            _ => frames.push(vec![line]),
        }
    }
    frames
        .into_iter()
        .filter(|frame| {
            !frame
                .iter()
                .any(|line| INTERNAL_FRAMES.iter().any(|marker| line.contains(marker)))
        })
        .flatten()
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run the matched definition against `world`.
///
/// # Errors
/// [`ExecutionError::ArityMismatch`] when the action declares a different
/// number of parameters than the step supplies, [`ExecutionError::Pending`]
/// for pending steps and [`ExecutionError::StepFailed`] otherwise.
pub fn invoke<W>(
    step_match: &StepMatch<W>,
    world: &mut W,
    multiline: Option<&MultilineArgument>,
) -> Result<(), ExecutionError> {
    let definition = step_match.definition();
    let supplied = step_match.arguments().len() + usize::from(multiline.is_some());
    let arity = definition.arity();
    if !arity.accepts(supplied) {
        return Err(ExecutionError::ArityMismatch {
            pattern: definition.pattern().to_string(),
            expected: arity.declared().unwrap_or_default(),
            actual: supplied,
        });
    }
    capture(|| definition.call(world, step_match.arguments(), multiline)).map_err(|err| match err {
        StepError::Pending(message) => ExecutionError::Pending { message },
        source => ExecutionError::StepFailed {
            text: step_match.step_text().to_owned(),
            source,
        },
    })
}

/// One attempt to run a step within one scenario.
pub struct StepInvocation<W> {
    step: Step,
    step_match: Option<Rc<StepMatch<W>>>,
    status: Status,
    error: Option<ExecutionError>,
    background: bool,
}

impl<W> StepInvocation<W> {
    pub(crate) fn new(
        step: Step,
        step_match: Option<Rc<StepMatch<W>>>,
        status: Status,
        error: Option<ExecutionError>,
        background: bool,
    ) -> Self {
        Self {
            step,
            step_match,
            status,
            error,
            background,
        }
    }

    /// The executed step, placeholders substituted.
    #[must_use]
    pub fn step(&self) -> &Step {
        &self.step
    }

    /// The resolved match, absent for undefined or ambiguous steps.
    #[must_use]
    pub fn step_match(&self) -> Option<&Rc<StepMatch<W>>> {
        self.step_match.as_ref()
    }

    /// Outcome of the step.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Why the step did not pass.
    #[must_use]
    pub fn error(&self) -> Option<&ExecutionError> {
        self.error.as_ref()
    }

    /// Whether the step came from the feature background.
    #[must_use]
    pub fn is_background(&self) -> bool {
        self.background
    }
}

impl<W> fmt::Debug for StepInvocation<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepInvocation")
            .field("step", &self.step)
            .field("step_match", &self.step_match)
            .field("status", &self.status)
            .field("error", &self.error)
            .field("background", &self.background)
            .finish()
    }
}
