//! Outcome aggregation for one run.
//!
//! [`Results`] collects step invocations and scenario outcomes, ignoring a
//! second record of the same instance, and computes the run verdict under
//! the strict and wip policies.

use crate::context::ScenarioInfo;
use crate::error::ExecutionError;
use crate::invocation::StepInvocation;
use crate::registry::HookPhase;
use derive_more::{Deref, IntoIterator};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// Outcome of a step or scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "diagnostics", derive(serde::Serialize))]
#[cfg_attr(feature = "diagnostics", serde(rename_all = "lowercase"))]
pub enum Status {
    /// Ran without error.
    Passed,
    /// Raised an error or panicked.
    Failed,
    /// Not run because of an earlier outcome, a dry run or a failed
    /// background.
    Skipped,
    /// No definition matched.
    Undefined,
    /// Marked pending by the step body.
    Pending,
}

impl Status {
    /// Lower-case status name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Undefined => "undefined",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one executed scenario or outline row.
pub struct ScenarioResult<W> {
    info: ScenarioInfo,
    steps: Vec<Rc<StepInvocation<W>>>,
    hook_errors: Vec<(HookPhase, ExecutionError)>,
    status: Status,
}

impl<W> ScenarioResult<W> {
    pub(crate) fn new(
        info: ScenarioInfo,
        steps: Vec<Rc<StepInvocation<W>>>,
        hook_errors: Vec<(HookPhase, ExecutionError)>,
    ) -> Self {
        let status = scenario_status(&steps, !hook_errors.is_empty());
        Self {
            info,
            steps,
            hook_errors,
            status,
        }
    }

    /// Name, tags and location of the scenario.
    #[must_use]
    pub fn info(&self) -> &ScenarioInfo {
        &self.info
    }

    /// Background and scenario steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[Rc<StepInvocation<W>>] {
        &self.steps
    }

    /// Failures raised by hooks, in firing order.
    #[must_use]
    pub fn hook_errors(&self) -> &[(HookPhase, ExecutionError)] {
        &self.hook_errors
    }

    /// Final status of the scenario.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// The first error captured: a `Before`/`Around` hook failure, then the
    /// first step error, then any later hook failure.
    #[must_use]
    pub fn first_error(&self) -> Option<&ExecutionError> {
        let early = |phase: &HookPhase| matches!(phase, HookPhase::Before | HookPhase::Around);
        self.hook_errors
            .iter()
            .find(|(phase, _)| early(phase))
            .map(|(_, err)| err)
            .or_else(|| self.steps.iter().find_map(|step| step.error()))
            .or_else(|| self.hook_errors.first().map(|(_, err)| err))
    }
}

impl<W> fmt::Debug for ScenarioResult<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioResult")
            .field("info", &self.info)
            .field("status", &self.status)
            .field("steps", &self.steps)
            .field("hook_errors", &self.hook_errors)
            .finish()
    }
}

/// Scenario status derived from its steps. A failed step or hook fails the
/// scenario; otherwise the first undefined, pending or skipped step decides,
/// and a scenario whose steps all passed has passed.
pub(crate) fn scenario_status<W>(steps: &[Rc<StepInvocation<W>>], hook_failed: bool) -> Status {
    if hook_failed || steps.iter().any(|step| step.status() == Status::Failed) {
        return Status::Failed;
    }
    steps
        .iter()
        .map(|step| step.status())
        .find(|status| *status != Status::Passed)
        .unwrap_or(Status::Passed)
}

/// Count of outcomes per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, IntoIterator)]
pub struct StatusCounts(BTreeMap<Status, usize>);

impl StatusCounts {
    /// Count for `status`, zero when absent.
    #[must_use]
    pub fn get(&self, status: Status) -> usize {
        self.0.get(&status).copied().unwrap_or_default()
    }

    /// Total over every status.
    #[must_use]
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    fn tally(statuses: impl Iterator<Item = Status>) -> Self {
        let mut counts = BTreeMap::new();
        for status in statuses {
            *counts.entry(status).or_default() += 1;
        }
        Self(counts)
    }
}

impl fmt::Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.total())?;
        if self.0.is_empty() {
            return Ok(());
        }
        let parts: Vec<String> = self.0.iter().map(|(status, n)| format!("{n} {status}")).collect();
        write!(f, " ({})", parts.join(", "))
    }
}

/// Every step invocation and scenario recorded during a run.
pub struct Results<W> {
    steps: Vec<Rc<StepInvocation<W>>>,
    scenarios: Vec<Rc<ScenarioResult<W>>>,
    seen_steps: HashSet<*const StepInvocation<W>>,
    seen_scenarios: HashSet<*const ScenarioResult<W>>,
    strict: bool,
    wip: bool,
}

impl<W> Results<W> {
    /// Empty results judged under the given policies.
    #[must_use]
    pub fn new(strict: bool, wip: bool) -> Self {
        Self {
            steps: Vec::new(),
            scenarios: Vec::new(),
            seen_steps: HashSet::new(),
            seen_scenarios: HashSet::new(),
            strict,
            wip,
        }
    }

    /// Record a step invocation; recording the same instance again does
    /// nothing.
    pub fn record_step(&mut self, step: &Rc<StepInvocation<W>>) {
        if self.seen_steps.insert(Rc::as_ptr(step)) {
            self.steps.push(Rc::clone(step));
        }
    }

    /// Record a scenario; recording the same instance again does nothing.
    pub fn record_scenario(&mut self, scenario: &Rc<ScenarioResult<W>>) {
        if self.seen_scenarios.insert(Rc::as_ptr(scenario)) {
            self.scenarios.push(Rc::clone(scenario));
        }
    }

    /// Step invocations with `status`, or all of them for `None`.
    #[must_use]
    pub fn steps(&self, status: Option<Status>) -> Vec<Rc<StepInvocation<W>>> {
        self.steps
            .iter()
            .filter(|step| status.is_none_or(|wanted| step.status() == wanted))
            .cloned()
            .collect()
    }

    /// Scenarios with `status`, or all of them for `None`.
    #[must_use]
    pub fn scenarios(&self, status: Option<Status>) -> Vec<Rc<ScenarioResult<W>>> {
        self.scenarios
            .iter()
            .filter(|scenario| status.is_none_or(|wanted| scenario.status() == wanted))
            .cloned()
            .collect()
    }

    /// Steps per status.
    #[must_use]
    pub fn step_counts(&self) -> StatusCounts {
        StatusCounts::tally(self.steps.iter().map(|step| step.status()))
    }

    /// Scenarios per status.
    #[must_use]
    pub fn scenario_counts(&self) -> StatusCounts {
        StatusCounts::tally(self.scenarios.iter().map(|scenario| scenario.status()))
    }

    /// Whether the run failed. In wip mode any passing scenario is a
    /// failure; otherwise any failed scenario or step is, and in strict
    /// mode so is any undefined or pending step.
    #[must_use]
    pub fn overall_failure(&self) -> bool {
        if self.wip {
            return self.scenarios.iter().any(|s| s.status() == Status::Passed);
        }
        let failed = self.scenarios.iter().any(|s| s.status() == Status::Failed)
            || self.steps.iter().any(|s| s.status() == Status::Failed);
        let strict_failure = self.strict
            && self
                .steps
                .iter()
                .any(|s| matches!(s.status(), Status::Undefined | Status::Pending));
        failed || strict_failure
    }
}

impl<W> fmt::Debug for Results<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Results")
            .field("scenarios", &self.scenario_counts())
            .field("steps", &self.step_counts())
            .field("strict", &self.strict)
            .field("wip", &self.wip)
            .finish()
    }
}

/// Summary handed back by [`Runner::run`](crate::Runner::run).
pub struct RunResult<W> {
    /// `0` on success, `1` when the run failed or was cancelled.
    pub exit_code: i32,
    /// Scenarios per status.
    pub scenario_counts: StatusCounts,
    /// Steps per status.
    pub step_counts: StatusCounts,
    /// Whether cancellation cut the run short.
    pub cancelled: bool,
    /// Everything recorded.
    pub results: Results<W>,
}

impl<W> fmt::Debug for RunResult<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunResult")
            .field("exit_code", &self.exit_code)
            .field("scenario_counts", &self.scenario_counts)
            .field("step_counts", &self.step_counts)
            .field("cancelled", &self.cancelled)
            .field("results", &self.results)
            .finish()
    }
}

impl<W> RunResult<W> {
    pub(crate) fn from_results(results: Results<W>, cancelled: bool) -> Self {
        let failed = results.overall_failure() || cancelled;
        Self {
            exit_code: i32::from(failed),
            scenario_counts: results.scenario_counts(),
            step_counts: results.step_counts(),
            cancelled,
            results,
        }
    }

    /// Whether the run succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}
