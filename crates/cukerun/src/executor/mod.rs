//! Running features against a step language.
//!
//! A [`Runner`] owns the step languages, the world factory and the
//! cancellation token. [`Runner::run`] checks tag limits, then walks every
//! feature in document order, running each selected scenario (or outline
//! row) with its background prefixed, and returns the aggregated
//! [`RunResult`].

mod scenario;

use crate::cancel::CancellationToken;
use crate::config::RunOptions;
use crate::context::{ScenarioInfo, WorldContext};
use crate::error::RunError;
use crate::feature::{ExpandedScenario, Feature, Location, Rule};
use crate::language::Languages;
use crate::operator::Operator;
use crate::registry::StepRegistry;
use crate::resolve::Resolver;
use crate::results::{Results, RunResult};
use crate::tags::{check_limits, count_tags};
use scenario::{BackgroundFailure, ScenarioExecution};
use std::collections::HashSet;
use std::fmt;
use std::iter;
use std::rc::Rc;

type WorldFactory<W> = Box<dyn Fn(&WorldContext<'_>) -> W>;

/// Extension under which [`Runner::new`] registers its step registry.
pub const RUST_EXTENSION: &str = "rs";

/// Executes features against registered step definitions.
///
/// # Examples
/// ```
/// use cukerun::{Feature, RunOptions, Runner, StepRegistry};
///
/// #[derive(Default)]
/// struct Cart(u32);
///
/// let mut steps = StepRegistry::<Cart>::new();
/// steps.given(r"^(\d+) items$", |cart: &mut Cart, n: u32| cart.0 = n)?;
/// steps.then(r"^the cart is not empty$", |cart: &mut Cart| {
///     if cart.0 == 0 { Err("empty cart") } else { Ok(()) }
/// })?;
///
/// let feature = Feature::parse(
///     "Feature: Cart\n  Scenario: Fill\n    Given 2 items\n    Then the cart is not empty\n",
///     "cart.feature",
/// )?;
/// let run = Runner::with_default_world(steps).run(&[feature], &RunOptions::default())?;
/// assert_eq!(run.exit_code, 0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Runner<W> {
    languages: Languages<W>,
    world: WorldFactory<W>,
    operator: Option<Operator>,
    cancellation: CancellationToken,
}

impl<W> fmt::Debug for Runner<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("languages", &self.languages)
            .field("operator", &self.operator)
            .field("cancellation", &self.cancellation)
            .finish_non_exhaustive()
    }
}

impl<W: Default + 'static> Runner<W> {
    /// A runner building each scenario's world with `W::default()`.
    #[must_use]
    pub fn with_default_world(registry: StepRegistry<W>) -> Self {
        Self::new(registry, |_: &WorldContext<'_>| W::default())
    }
}

impl<W: 'static> Runner<W> {
    /// A runner using `registry` for `.rs` step files and `world` to build
    /// each scenario's world.
    pub fn new(registry: StepRegistry<W>, world: impl Fn(&WorldContext<'_>) -> W + 'static) -> Self {
        let mut languages = Languages::new();
        languages.register(RUST_EXTENSION, registry);
        Self::with_languages(languages, world)
    }

    /// A runner over several step languages.
    pub fn with_languages(languages: Languages<W>, world: impl Fn(&WorldContext<'_>) -> W + 'static) -> Self {
        Self {
            languages,
            world: Box::new(world),
            operator: None,
            cancellation: CancellationToken::new(),
        }
    }
}

impl<W> Runner<W> {
    /// Make `operator` available to world factories. Its questions are
    /// abandoned when the run is cancelled.
    #[must_use]
    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = Some(operator.with_cancellation(self.cancellation.clone()));
        self
    }

    /// Share an existing cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.operator = self.operator.map(|operator| operator.with_cancellation(token.clone()));
        self.cancellation = token;
        self
    }

    /// A handle that cancels this runner's runs.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// The step languages.
    #[must_use]
    pub fn languages(&self) -> &Languages<W> {
        &self.languages
    }

    /// The step languages, for loading code files.
    pub fn languages_mut(&mut self) -> &mut Languages<W> {
        &mut self.languages
    }

    /// Run `features` under `options`.
    ///
    /// Scenarios run one at a time in document order. Step failures are
    /// recorded rather than returned; the verdict is in
    /// [`RunResult::exit_code`].
    ///
    /// # Errors
    /// [`RunError::TagLimitExceeded`] when a tag occurs more often than its
    /// limit allows. No scenario runs in that case.
    pub fn run(&self, features: &[Feature], options: &RunOptions) -> Result<RunResult<W>, RunError> {
        let violations = check_limits(&count_tags(features), options.tag_limits());
        if !violations.is_empty() {
            return Err(RunError::TagLimitExceeded(violations));
        }
        log::info!("running {} feature(s)", features.len());
        let mut execution = Execution {
            runner: self,
            options,
            resolver: Resolver::new(&self.languages, options.is_guess()),
            results: Results::new(options.is_strict(), options.is_wip()),
            executed: HashSet::new(),
        };
        for feature in features {
            if self.cancellation.is_cancelled() {
                break;
            }
            execution.feature(feature);
        }
        let cancelled = self.cancellation.is_cancelled();
        if cancelled {
            log::warn!("run cancelled");
        }
        let run = RunResult::from_results(execution.results, cancelled);
        log::info!(
            "finished: scenarios {}, steps {}",
            run.scenario_counts,
            run.step_counts
        );
        Ok(run)
    }
}

struct Execution<'r, W> {
    runner: &'r Runner<W>,
    options: &'r RunOptions,
    resolver: Resolver<'r, W>,
    results: Results<W>,
    executed: HashSet<(Location, Option<usize>)>,
}

impl<W> Execution<'_, W> {
    fn feature(&mut self, feature: &Feature) {
        log::debug!("feature {:?} ({})", feature.name, feature.location);
        let mut feature_failed = false;
        let groups = iter::once((None, &feature.scenarios))
            .chain(feature.rules.iter().map(|rule| (Some(rule), &rule.scenarios)));
        for (rule, definitions) in groups {
            let mut rule_failed = false;
            for definition in definitions {
                for scenario in definition.expand() {
                    if self.runner.cancellation.is_cancelled() {
                        return;
                    }
                    let info = scenario_info(feature, rule, &scenario);
                    if !self.options.tag_filter().matches(info.tag_refs()) {
                        log::debug!("scenario {:?} filtered out by tags", info.name);
                        continue;
                    }
                    let failed = self.scenario(feature, rule, &info, &scenario, feature_failed || rule_failed);
                    feature_failed |= failed.feature;
                    rule_failed |= failed.rule;
                }
            }
        }
    }

    /// Run one scenario, reporting which of its backgrounds failed.
    fn scenario(
        &mut self,
        feature: &Feature,
        rule: Option<&Rule>,
        info: &ScenarioInfo,
        scenario: &ExpandedScenario,
        background_failed: bool,
    ) -> BackgroundFailure {
        log::debug!("scenario {:?} started", info.name);
        let key = (info.location.clone(), scenario.example.as_ref().map(|row| row.index));
        let replay = !self.executed.insert(key);
        let runner = self.runner;
        let mut execution = ScenarioExecution::new(
            &runner.languages,
            &mut self.resolver,
            self.options,
            &runner.cancellation,
            info,
            (feature.background_steps(), rule.map(Rule::background_steps).unwrap_or_default()),
            &scenario.steps,
        );
        if background_failed || self.options.is_dry_run() {
            execution.skip_all();
        } else {
            let mut world = (runner.world)(&WorldContext {
                scenario: info,
                operator: runner.operator.as_ref(),
            });
            if replay {
                execution.run_without_hooks(&mut world);
            } else {
                execution.run(&mut world);
            }
        }
        let (outcome, failed_background) = execution.finish();
        for step in outcome.steps() {
            self.results.record_step(step);
        }
        log::debug!("scenario {:?} {}", info.name, outcome.status());
        self.results.record_scenario(&Rc::new(outcome));
        failed_background
    }
}

/// Feature tags, then rule tags, then the scenario's own, without repeats.
fn scenario_info(feature: &Feature, rule: Option<&Rule>, scenario: &ExpandedScenario) -> ScenarioInfo {
    let mut tags: Vec<String> = Vec::new();
    let inherited = rule.map(|rule| rule.tags.as_slice()).unwrap_or_default();
    for tag in feature.tags.iter().chain(inherited).chain(&scenario.tags) {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    ScenarioInfo {
        feature: feature.name.clone(),
        name: scenario.name.clone(),
        tags,
        location: scenario.location.clone(),
        example: scenario.example.clone(),
    }
}
