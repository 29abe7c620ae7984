//! Step matching and scenario execution for Gherkin features.
//!
//! Register step definitions on a [`StepRegistry`], parse or build
//! [`Feature`]s, and hand both to a [`Runner`]. The runner filters scenarios
//! by tag, resolves each step to exactly one definition (see [`resolve`]),
//! invokes it against a fresh world per scenario, fires hooks around it and
//! aggregates the outcome into a [`RunResult`].
//!
//! ```
//! use cukerun::{Expression, Feature, RunOptions, Runner, Status, StepRegistry};
//!
//! #[derive(Default)]
//! struct Shelf {
//!     items: u32,
//! }
//!
//! let mut steps = StepRegistry::<Shelf>::new();
//! steps.given(Expression("there are {n:u32} items"), |shelf: &mut Shelf, n: u32| shelf.items = n)?;
//! steps.when(r"^I take (\d+)$", |shelf: &mut Shelf, n: u32| shelf.items -= n)?;
//! steps.then(r"^(\d+) remain$", |shelf: &mut Shelf, n: u32| {
//!     if shelf.items == n { Ok(()) } else { Err(format!("{} remain", shelf.items)) }
//! })?;
//!
//! let feature = Feature::parse(
//!     "Feature: Shelf
//!   Scenario: Take some
//!     Given there are 5 items
//!     When I take 2
//!     Then 3 remain
//! ",
//!     "shelf.feature",
//! )?;
//! let run = Runner::with_default_world(steps).run(&[feature], &RunOptions::default())?;
//! assert!(run.is_success());
//! assert_eq!(run.step_counts.get(Status::Passed), 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cancel;
pub mod config;
pub mod context;
mod error;
mod executor;
pub mod feature;
mod invocation;
mod language;
pub mod operator;
pub mod registry;
mod resolve;
pub mod results;
mod step_fn;
mod step_match;
pub mod tags;

pub use cancel::CancellationToken;
pub use config::RunOptions;
pub use context::{CompletedStep, HookContext, ScenarioInfo, WorldContext};
pub use cukerun_patterns::{Argument, PatternError, PatternSyntax, StepKeyword, StepPattern};
pub use error::{AskError, ExecutionError, RegistryError, RunError, StepError};
pub use executor::{RUST_EXTENSION, Runner};
pub use feature::{DataTable, Feature, FeatureError, Location, MultilineArgument, Step};
#[doc(hidden)]
pub use invocation::raise_pending;
pub use invocation::{PendingRequest, StepInvocation, filter_backtrace, invoke, panic_message};
pub use language::{Languages, StepLanguage};
pub use operator::Operator;
pub use registry::{Expression, HookPhase, StepDefinition, StepRegistry};
pub use resolve::{Resolver, resolve};
pub use results::{Results, RunResult, ScenarioResult, Status, StatusCounts};
pub use step_fn::{Arity, IntoStepFn, IntoStepFnWithArgument, IntoStepResult, StepAction, StepArgs};
pub use step_match::StepMatch;
pub use tags::{TagFilter, TagFilterError, TagLimit, TagLimitViolation};

/// Mark the current step as pending.
///
/// Accepts an optional message in `format!` syntax. The step is reported as
/// pending rather than failed and the rest of the scenario is skipped.
///
/// ```
/// use cukerun::{StepRegistry, pending};
///
/// let mut steps = StepRegistry::<()>::new();
/// steps.given("^a payment gateway$", |_: &mut ()| pending!("gateway stub"))?;
/// # Ok::<(), cukerun::RegistryError>(())
/// ```
#[macro_export]
macro_rules! pending {
    () => {
        $crate::raise_pending(None)
    };
    ($($arg:tt)+) => {
        $crate::raise_pending(Some(format!($($arg)+)))
    };
}
