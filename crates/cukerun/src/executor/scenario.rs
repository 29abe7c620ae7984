//! Execution of a single scenario: background, steps and hooks.

use crate::cancel::CancellationToken;
use crate::config::RunOptions;
use crate::context::{HookContext, ScenarioInfo};
use crate::error::{ExecutionError, StepError};
use crate::feature::Step;
use crate::invocation::{StepInvocation, invoke};
use crate::language::StepLanguage;
use crate::registry::HookPhase;
use crate::resolve::Resolver;
use crate::results::{ScenarioResult, Status, scenario_status};
use std::rc::Rc;

/// Where a planned step comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    FeatureBackground,
    RuleBackground,
    Scenario,
}

impl Origin {
    fn is_background(self) -> bool {
        self != Self::Scenario
    }
}

/// Backgrounds whose steps failed while running a scenario.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct BackgroundFailure {
    pub(super) feature: bool,
    pub(super) rule: bool,
}

pub(super) struct ScenarioExecution<'e, 'r, W> {
    language: &'e dyn StepLanguage<W>,
    resolver: &'e mut Resolver<'r, W>,
    options: &'e RunOptions,
    cancellation: &'e CancellationToken,
    info: &'e ScenarioInfo,
    feature_background: &'e [Step],
    rule_background: &'e [Step],
    steps: &'e [Step],
    invocations: Vec<Rc<StepInvocation<W>>>,
    hook_errors: Vec<(HookPhase, ExecutionError)>,
    halted: bool,
    background_failed: BackgroundFailure,
}

impl<'e, 'r, W> ScenarioExecution<'e, 'r, W> {
    pub(super) fn new(
        language: &'e dyn StepLanguage<W>,
        resolver: &'e mut Resolver<'r, W>,
        options: &'e RunOptions,
        cancellation: &'e CancellationToken,
        info: &'e ScenarioInfo,
        (feature_background, rule_background): (&'e [Step], &'e [Step]),
        steps: &'e [Step],
    ) -> Self {
        Self {
            language,
            resolver,
            options,
            cancellation,
            info,
            feature_background,
            rule_background,
            steps,
            invocations: Vec::new(),
            hook_errors: Vec::new(),
            halted: false,
            background_failed: BackgroundFailure::default(),
        }
    }

    fn cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    fn plan(&self) -> impl Iterator<Item = (&'e Step, Origin)> + use<'e, W> {
        let (feature, rule, steps) = (self.feature_background, self.rule_background, self.steps);
        feature
            .iter()
            .map(|step| (step, Origin::FeatureBackground))
            .chain(rule.iter().map(|step| (step, Origin::RuleBackground)))
            .chain(steps.iter().map(|step| (step, Origin::Scenario)))
    }

    /// Resolve every step without a world: matched steps are skipped.
    pub(super) fn skip_all(&mut self) {
        self.halted = true;
        self.run_steps(None, false);
    }

    /// Run the steps of a scenario that already ran once, without hooks.
    pub(super) fn run_without_hooks(&mut self, world: &mut W) {
        self.run_steps(Some(world), false);
    }

    /// Run the scenario inside its `Around` hooks.
    pub(super) fn run(&mut self, world: &mut W) {
        if self.cancelled() {
            return;
        }
        let language = self.language;
        let ctx = HookContext::new(self.info, None);
        let outcome = language.around(world, &ctx, &mut |world: &mut W| self.run_hooked(world));
        if let Err(source) = outcome {
            self.hook_failed(HookPhase::Around, source);
        }
    }

    fn run_hooked(&mut self, world: &mut W) {
        if self.cancelled() {
            return;
        }
        let before = self
            .language
            .fire_hook(HookPhase::Before, world, &HookContext::new(self.info, None));
        if let Err(source) = before {
            self.hook_failed(HookPhase::Before, source);
            self.halted = true;
        }
        self.run_steps(Some(&mut *world), true);
        if self.cancelled() {
            return;
        }
        let status = scenario_status(&self.invocations, !self.hook_errors.is_empty());
        let after = self
            .language
            .fire_hook(HookPhase::After, world, &HookContext::new(self.info, Some(status)));
        if let Err(source) = after {
            self.hook_failed(HookPhase::After, source);
        }
    }

    fn run_steps(&mut self, mut world: Option<&mut W>, hooks: bool) {
        let recorded = self.invocations.len();
        for (step, origin) in self.plan().skip(recorded) {
            if self.cancelled() {
                return;
            }
            let (invocation, invoked) = self.run_step(world.as_deref_mut(), step, origin);
            let status = invocation.status();
            self.invocations.push(Rc::new(invocation));
            if let Some(world) = world.as_deref_mut().filter(|_| invoked && hooks) {
                self.after_step(world, step, status);
            }
        }
    }

    fn after_step(&mut self, world: &mut W, step: &Step, status: Status) {
        if self.cancelled() {
            return;
        }
        let ctx = HookContext::after_step(self.info, step, status);
        if let Err(source) = self.language.fire_hook(HookPhase::AfterStep, world, &ctx) {
            self.hook_failed(HookPhase::AfterStep, source);
            self.halted = true;
        }
    }

    fn run_step(&mut self, world: Option<&mut W>, step: &Step, origin: Origin) -> (StepInvocation<W>, bool) {
        let background = origin.is_background();
        let report_name = format!("{} {}", step.keyword, step.text);
        let step_match = match self.resolver.step_match(&step.text, &report_name) {
            Ok(step_match) => step_match,
            Err(err @ ExecutionError::Undefined { .. }) => {
                self.halted |= self.options.is_strict();
                let invocation = StepInvocation::new(step.clone(), None, Status::Undefined, Some(err), background);
                return (invocation, false);
            }
            Err(err) => {
                self.halted = true;
                let invocation = StepInvocation::new(step.clone(), None, Status::Failed, Some(err), background);
                return (invocation, false);
            }
        };
        let halted = self.halted;
        let Some(world) = world.filter(|_| !halted) else {
            let invocation = StepInvocation::new(step.clone(), Some(step_match), Status::Skipped, None, background);
            return (invocation, false);
        };
        let (status, error) = match invoke(&step_match, world, step.argument.as_ref()) {
            Ok(()) => (Status::Passed, None),
            Err(err @ ExecutionError::Pending { .. }) => (Status::Pending, Some(err)),
            Err(err) => (Status::Failed, Some(err)),
        };
        if status != Status::Passed {
            self.halted = true;
        }
        if status == Status::Failed && background {
            log::debug!("background step {:?} failed", step.text);
            match origin {
                Origin::RuleBackground => self.background_failed.rule = true,
                _ => self.background_failed.feature = true,
            }
        }
        let invocation = StepInvocation::new(step.clone(), Some(step_match), status, error, background);
        (invocation, true)
    }

    fn hook_failed(&mut self, phase: HookPhase, source: StepError) {
        log::debug!("{phase} hook failed for {:?}: {source}", self.info.name);
        self.hook_errors.push((phase, ExecutionError::HookFailed { phase, source }));
    }

    /// Close the scenario. Steps never reached are recorded as skipped.
    /// Returns the outcome and which backgrounds failed.
    pub(super) fn finish(mut self) -> (ScenarioResult<W>, BackgroundFailure) {
        let recorded = self.invocations.len();
        let unreached: Vec<_> = self
            .plan()
            .skip(recorded)
            .map(|(step, origin)| {
                Rc::new(StepInvocation::new(step.clone(), None, Status::Skipped, None, origin.is_background()))
            })
            .collect();
        self.invocations.extend(unreached);
        let outcome = ScenarioResult::new(self.info.clone(), self.invocations, self.hook_errors);
        (outcome, self.background_failed)
    }
}
