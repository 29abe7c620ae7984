//! Hook registration records and firing order.

use crate::context::HookContext;
use crate::error::StepError;
use crate::feature::Location;
use crate::invocation::capture;
use crate::step_fn::IntoStepResult;
use crate::tags::TagFilter;
use std::fmt;

/// When a hook runs relative to a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "diagnostics", derive(serde::Serialize))]
#[cfg_attr(feature = "diagnostics", serde(rename_all = "snake_case"))]
pub enum HookPhase {
    /// Before the first step.
    Before,
    /// After the last step, whenever `Before` fired.
    After,
    /// After every invoked step.
    AfterStep,
    /// Around the whole before/steps/after span.
    Around,
}

impl HookPhase {
    /// Lower-case phase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::AfterStep => "after_step",
            Self::Around => "around",
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a `Before`, `After` or `AfterStep` hook.
pub type HookAction<W> = Box<dyn Fn(&mut W, &HookContext<'_>) -> Result<(), StepError>>;

/// Body of an `Around` hook. It must call the continuation to run the
/// scenario; not calling it leaves every step skipped.
pub type AroundAction<W> =
    Box<dyn Fn(&mut W, &HookContext<'_>, &mut dyn FnMut(&mut W)) -> Result<(), StepError>>;

/// A hook body of either shape.
pub enum HookBody<W> {
    /// Runs at a single point.
    Plain(HookAction<W>),
    /// Wraps the scenario.
    Around(AroundAction<W>),
}

impl<W> HookBody<W> {
    /// Wrap a `Before`/`After`/`AfterStep` closure.
    pub fn plain<F, R>(body: F) -> Self
    where
        F: Fn(&mut W, &HookContext<'_>) -> R + 'static,
        R: IntoStepResult,
    {
        Self::Plain(Box::new(move |world, ctx| body(world, ctx).into_step_result()))
    }

    /// Wrap an `Around` closure.
    pub fn around<F, R>(body: F) -> Self
    where
        F: Fn(&mut W, &HookContext<'_>, &mut dyn FnMut(&mut W)) -> R + 'static,
        R: IntoStepResult,
    {
        Self::Around(Box::new(move |world, ctx, run| {
            body(world, ctx, run).into_step_result()
        }))
    }

    fn is_around(&self) -> bool {
        matches!(self, Self::Around(_))
    }
}

impl<W> fmt::Debug for HookBody<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_around() { "Around(..)" } else { "Plain(..)" })
    }
}

/// A registered hook.
pub struct Hook<W> {
    phase: HookPhase,
    filter: TagFilter,
    location: Location,
    body: HookBody<W>,
}

impl<W> fmt::Debug for Hook<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("phase", &self.phase)
            .field("filter", &self.filter)
            .field("location", &self.location)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl<W> Hook<W> {
    pub(super) fn new(phase: HookPhase, filter: TagFilter, location: Location, body: HookBody<W>) -> Option<Self> {
        (body.is_around() == (phase == HookPhase::Around)).then_some(Self {
            phase,
            filter,
            location,
            body,
        })
    }

    /// Phase the hook is registered for.
    #[must_use]
    pub fn phase(&self) -> HookPhase {
        self.phase
    }

    /// Where the hook was registered.
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Whether the hook's tag expressions select this scenario.
    #[must_use]
    pub fn applies_to(&self, ctx: &HookContext<'_>) -> bool {
        self.filter.matches(ctx.scenario.tag_refs())
    }

    fn run(&self, world: &mut W, ctx: &HookContext<'_>) -> Result<(), StepError> {
        match &self.body {
            HookBody::Plain(action) => capture(|| action(world, ctx)),
            HookBody::Around(_) => Ok(()),
        }
    }

    fn run_around(&self, world: &mut W, ctx: &HookContext<'_>, block: &mut dyn FnMut(&mut W)) -> Result<(), StepError> {
        match &self.body {
            HookBody::Around(action) => capture(|| action(world, ctx, block)),
            HookBody::Plain(_) => {
                block(world);
                Ok(())
            }
        }
    }
}

/// Fire every applicable hook of `phase`. `Before` hooks stop at the first
/// failure; `After` and `AfterStep` hooks all run and the first failure is
/// returned.
pub(super) fn fire<W>(
    hooks: &[Hook<W>],
    phase: HookPhase,
    world: &mut W,
    ctx: &HookContext<'_>,
) -> Result<(), StepError> {
    let mut first_failure = None;
    for hook in hooks
        .iter()
        .filter(|hook| hook.phase == phase && hook.applies_to(ctx))
    {
        log::debug!("firing {phase} hook from {}", hook.location);
        if let Err(err) = hook.run(world, ctx) {
            if phase == HookPhase::Before {
                return Err(err);
            }
            first_failure.get_or_insert(err);
        }
    }
    first_failure.map_or(Ok(()), Err)
}

/// Run `block` inside every applicable `Around` hook, the first registered
/// outermost.
pub(super) fn around<W>(
    hooks: &[&Hook<W>],
    world: &mut W,
    ctx: &HookContext<'_>,
    block: &mut dyn FnMut(&mut W),
) -> Result<(), StepError> {
    let Some((outer, rest)) = hooks.split_first() else {
        block(world);
        return Ok(());
    };
    let mut inner = Ok(());
    outer.run_around(world, ctx, &mut |world: &mut W| {
        inner = around(rest, world, ctx, block);
    })?;
    inner
}

pub(super) fn applicable_around<'h, W>(hooks: &'h [Hook<W>], ctx: &HookContext<'_>) -> Vec<&'h Hook<W>> {
    hooks
        .iter()
        .filter(|hook| hook.phase == HookPhase::Around && hook.applies_to(ctx))
        .collect()
}
