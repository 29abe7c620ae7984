//! Step definition registry.
//!
//! A [`StepRegistry`] owns every step definition, hook and argument
//! transform of one world type. Definitions record their registration site
//! through `#[track_caller]`, so ambiguity reports and the registry dump
//! point at the code that registered them.

#[cfg(feature = "diagnostics")]
mod diagnostics;
mod hooks;
mod transform;

pub use hooks::{AroundAction, Hook, HookAction, HookBody, HookPhase};
pub use transform::TransformFn;

use crate::context::HookContext;
use crate::error::{RegistryError, StepError};
use crate::feature::{Location, MultilineArgument};
use crate::step_fn::{
    Arity, IntoStepFn, IntoStepFnWithArgument, IntoStepResult, StepAction, StepArgs, variadic,
};
use crate::step_match::StepMatch;
use crate::tags::TagFilter;
use cukerun_patterns::{Argument, PatternError, StepKeyword, StepPattern};
use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use transform::Transform;

/// Something that compiles into a [`StepPattern`].
///
/// Strings are raw regular expressions; wrap placeholder syntax in
/// [`Expression`].
pub trait IntoStepPattern {
    /// Compile, returning the source alongside any failure.
    ///
    /// # Errors
    /// Returns the pattern source and the compilation error.
    fn into_step_pattern(self) -> Result<StepPattern, (String, PatternError)>;
}

impl IntoStepPattern for &str {
    fn into_step_pattern(self) -> Result<StepPattern, (String, PatternError)> {
        StepPattern::regex(self).map_err(|err| (self.to_owned(), err))
    }
}

impl IntoStepPattern for String {
    fn into_step_pattern(self) -> Result<StepPattern, (String, PatternError)> {
        StepPattern::regex(self.as_str()).map_err(|err| (self, err))
    }
}

impl IntoStepPattern for StepPattern {
    fn into_step_pattern(self) -> Result<StepPattern, (String, PatternError)> {
        Ok(self)
    }
}

/// A placeholder pattern such as `there are {count:u32} items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expression<'a>(pub &'a str);

impl IntoStepPattern for Expression<'_> {
    fn into_step_pattern(self) -> Result<StepPattern, (String, PatternError)> {
        StepPattern::expression(self.0).map_err(|err| (self.0.to_owned(), err))
    }
}

/// A concrete step text observed to match a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepUsage {
    /// Step text after outline substitution.
    pub text: String,
    /// Arguments extracted from it.
    pub arguments: Vec<Argument>,
}

/// A registered step definition.
pub struct StepDefinition<W> {
    keyword: Option<StepKeyword>,
    pattern: StepPattern,
    location: Location,
    arity: Arity,
    action: StepAction<W>,
    transforms: Rc<RefCell<Vec<Transform>>>,
    usage: RefCell<Vec<StepUsage>>,
}

impl<W> StepDefinition<W> {
    /// Keyword the definition was registered with, if any. Matching ignores
    /// keywords.
    #[must_use]
    pub fn keyword(&self) -> Option<StepKeyword> {
        self.keyword
    }

    /// The compiled pattern.
    #[must_use]
    pub fn pattern(&self) -> &StepPattern {
        &self.pattern
    }

    /// Registration site.
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Parameters declared by the action.
    #[must_use]
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// `file:line:in /pattern/`, as listed in ambiguity reports.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("{}:in {}", self.location, self.pattern)
    }

    /// Step texts matched so far, in first-seen order.
    #[must_use]
    pub fn usage(&self) -> Vec<StepUsage> {
        self.usage.borrow().clone()
    }

    /// Whether any step has matched this definition.
    #[must_use]
    pub fn is_used(&self) -> bool {
        !self.usage.borrow().is_empty()
    }

    pub(crate) fn record_usage(&self, text: &str, arguments: &[Argument]) {
        let mut usage = self.usage.borrow_mut();
        if usage.iter().all(|seen| seen.text != text) {
            usage.push(StepUsage {
                text: text.to_owned(),
                arguments: arguments.to_vec(),
            });
        }
    }

    /// Run the action with transformed captures.
    pub(crate) fn call(
        &self,
        world: &mut W,
        arguments: &[Argument],
        multiline: Option<&MultilineArgument>,
    ) -> Result<(), StepError> {
        let values = {
            let transforms = self.transforms.borrow();
            arguments
                .iter()
                .map(|arg| arg.value().map(|value| transform::apply_first(&transforms, value)))
                .collect()
        };
        (self.action)(world, StepArgs::new(values, multiline))
    }
}

impl<W> fmt::Debug for StepDefinition<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("keyword", &self.keyword)
            .field("pattern", &self.pattern)
            .field("location", &self.location)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

type Loader<W> = Rc<dyn Fn(&mut StepRegistry<W>, &Path) -> Result<(), RegistryError>>;

/// All step definitions, hooks and transforms for world type `W`.
///
/// # Examples
/// ```
/// use cukerun::StepRegistry;
///
/// #[derive(Default)]
/// struct Counter(u32);
///
/// let mut steps = StepRegistry::<Counter>::new();
/// steps.given(r"^there are (\d+) items$", |w: &mut Counter, n: u32| w.0 = n)?;
/// let matches = steps.find_matches("there are 5 items", "Given there are 5 items");
/// assert_eq!(matches.len(), 1);
/// # Ok::<(), cukerun::RegistryError>(())
/// ```
pub struct StepRegistry<W> {
    definitions: Vec<Rc<StepDefinition<W>>>,
    hooks: Vec<Hook<W>>,
    transforms: Rc<RefCell<Vec<Transform>>>,
    loader: Option<Loader<W>>,
}

impl<W> Default for StepRegistry<W> {
    fn default() -> Self {
        Self {
            definitions: Vec::new(),
            hooks: Vec::new(),
            transforms: Rc::default(),
            loader: None,
        }
    }
}

impl<W> fmt::Debug for StepRegistry<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRegistry")
            .field("definitions", &self.definitions)
            .field("hooks", &self.hooks)
            .field("transforms", &self.transforms.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<W> StepRegistry<W> {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[track_caller]
    fn insert(
        &mut self,
        keyword: Option<StepKeyword>,
        pattern: impl IntoStepPattern,
        arity: Arity,
        action: StepAction<W>,
    ) -> Result<Rc<StepDefinition<W>>, RegistryError> {
        let location = Location::caller(std::panic::Location::caller());
        let pattern = pattern
            .into_step_pattern()
            .map_err(|(pattern, source)| RegistryError::Pattern {
                pattern,
                location: location.clone(),
                source,
            })?;
        log::debug!("registered step {pattern} at {location}");
        let definition = Rc::new(StepDefinition {
            keyword,
            pattern,
            location,
            arity,
            action,
            transforms: Rc::clone(&self.transforms),
            usage: RefCell::default(),
        });
        self.definitions.push(Rc::clone(&definition));
        Ok(definition)
    }

    /// Register a step definition usable with any keyword.
    ///
    /// # Errors
    /// Returns [`RegistryError::Pattern`] when the pattern does not compile.
    #[track_caller]
    pub fn register<Args>(
        &mut self,
        pattern: impl IntoStepPattern,
        action: impl IntoStepFn<W, Args>,
    ) -> Result<Rc<StepDefinition<W>>, RegistryError> {
        let arity = Arity::Exact(action.arity());
        self.insert(None, pattern, arity, action.into_action())
    }

    /// Register a step definition recording `keyword` for reports.
    ///
    /// # Errors
    /// Returns [`RegistryError::Pattern`] when the pattern does not compile.
    #[track_caller]
    pub fn define<Args>(
        &mut self,
        keyword: StepKeyword,
        pattern: impl IntoStepPattern,
        action: impl IntoStepFn<W, Args>,
    ) -> Result<Rc<StepDefinition<W>>, RegistryError> {
        let arity = Arity::Exact(action.arity());
        self.insert(Some(keyword), pattern, arity, action.into_action())
    }

    /// Register a `Given` step.
    ///
    /// # Errors
    /// Returns [`RegistryError::Pattern`] when the pattern does not compile.
    #[track_caller]
    pub fn given<Args>(
        &mut self,
        pattern: impl IntoStepPattern,
        action: impl IntoStepFn<W, Args>,
    ) -> Result<Rc<StepDefinition<W>>, RegistryError> {
        self.define(StepKeyword::Given, pattern, action)
    }

    /// Register a `When` step.
    ///
    /// # Errors
    /// Returns [`RegistryError::Pattern`] when the pattern does not compile.
    #[track_caller]
    pub fn when<Args>(
        &mut self,
        pattern: impl IntoStepPattern,
        action: impl IntoStepFn<W, Args>,
    ) -> Result<Rc<StepDefinition<W>>, RegistryError> {
        self.define(StepKeyword::When, pattern, action)
    }

    /// Register a `Then` step.
    ///
    /// # Errors
    /// Returns [`RegistryError::Pattern`] when the pattern does not compile.
    #[track_caller]
    pub fn then<Args>(
        &mut self,
        pattern: impl IntoStepPattern,
        action: impl IntoStepFn<W, Args>,
    ) -> Result<Rc<StepDefinition<W>>, RegistryError> {
        self.define(StepKeyword::Then, pattern, action)
    }

    /// Register a step whose action takes the step's table or doc string as
    /// its last parameter.
    ///
    /// # Errors
    /// Returns [`RegistryError::Pattern`] when the pattern does not compile.
    #[track_caller]
    pub fn register_with_argument<Args>(
        &mut self,
        pattern: impl IntoStepPattern,
        action: impl IntoStepFnWithArgument<W, Args>,
    ) -> Result<Rc<StepDefinition<W>>, RegistryError> {
        let arity = Arity::Exact(action.arity());
        self.insert(None, pattern, arity, action.into_action())
    }

    /// Register a step whose action reads [`StepArgs`] directly and accepts
    /// any number of captures.
    ///
    /// # Errors
    /// Returns [`RegistryError::Pattern`] when the pattern does not compile.
    #[track_caller]
    pub fn register_variadic<F, R>(
        &mut self,
        pattern: impl IntoStepPattern,
        action: F,
    ) -> Result<Rc<StepDefinition<W>>, RegistryError>
    where
        F: Fn(&mut W, &StepArgs<'_>) -> R + 'static,
        R: IntoStepResult,
    {
        self.insert(None, pattern, Arity::Variadic, variadic(action))
    }

    /// Register a hook for `phase`, limited to scenarios selected by
    /// `tag_expressions` (all scenarios when empty).
    ///
    /// # Errors
    /// Returns [`RegistryError::TagExpression`] for a malformed expression
    /// and [`RegistryError::HookShape`] when `body` does not suit `phase`.
    #[track_caller]
    pub fn register_hook(
        &mut self,
        phase: HookPhase,
        tag_expressions: &[&str],
        body: HookBody<W>,
    ) -> Result<(), RegistryError> {
        let location = Location::caller(std::panic::Location::caller());
        let filter = TagFilter::parse(tag_expressions.iter().copied())?;
        let hook = Hook::new(phase, filter, location, body).ok_or(RegistryError::HookShape { phase })?;
        log::debug!("registered {phase} hook at {}", hook.location());
        self.hooks.push(hook);
        Ok(())
    }

    /// Register a `Before` hook.
    ///
    /// # Errors
    /// Returns [`RegistryError::TagExpression`] for a malformed expression.
    #[track_caller]
    pub fn before<F, R>(&mut self, tag_expressions: &[&str], body: F) -> Result<(), RegistryError>
    where
        F: Fn(&mut W, &HookContext<'_>) -> R + 'static,
        R: IntoStepResult,
    {
        self.register_hook(HookPhase::Before, tag_expressions, HookBody::plain(body))
    }

    /// Register an `After` hook.
    ///
    /// # Errors
    /// Returns [`RegistryError::TagExpression`] for a malformed expression.
    #[track_caller]
    pub fn after<F, R>(&mut self, tag_expressions: &[&str], body: F) -> Result<(), RegistryError>
    where
        F: Fn(&mut W, &HookContext<'_>) -> R + 'static,
        R: IntoStepResult,
    {
        self.register_hook(HookPhase::After, tag_expressions, HookBody::plain(body))
    }

    /// Register an `AfterStep` hook.
    ///
    /// # Errors
    /// Returns [`RegistryError::TagExpression`] for a malformed expression.
    #[track_caller]
    pub fn after_step<F, R>(&mut self, tag_expressions: &[&str], body: F) -> Result<(), RegistryError>
    where
        F: Fn(&mut W, &HookContext<'_>) -> R + 'static,
        R: IntoStepResult,
    {
        self.register_hook(HookPhase::AfterStep, tag_expressions, HookBody::plain(body))
    }

    /// Register an `Around` hook.
    ///
    /// # Errors
    /// Returns [`RegistryError::TagExpression`] for a malformed expression.
    #[track_caller]
    pub fn around<F, R>(&mut self, tag_expressions: &[&str], body: F) -> Result<(), RegistryError>
    where
        F: Fn(&mut W, &HookContext<'_>, &mut dyn FnMut(&mut W)) -> R + 'static,
        R: IntoStepResult,
    {
        self.register_hook(HookPhase::Around, tag_expressions, HookBody::around(body))
    }

    /// Register an argument transform. Captured values matching `pattern` in
    /// full are replaced by `callback(captures)` before conversion.
    ///
    /// # Errors
    /// Returns [`RegistryError::Transform`] when `pattern` does not compile.
    pub fn register_transform(
        &mut self,
        pattern: &str,
        callback: impl Fn(&[String]) -> String + 'static,
    ) -> Result<(), RegistryError> {
        let transform = Transform::new(pattern, Box::new(callback))?;
        self.transforms.borrow_mut().push(transform);
        Ok(())
    }

    /// Install the routine that loads a code file into this registry.
    pub fn set_loader(
        &mut self,
        loader: impl Fn(&mut Self, &Path) -> Result<(), RegistryError> + 'static,
    ) {
        self.loader = Some(Rc::new(loader));
    }

    pub(crate) fn load(&mut self, path: &Path) -> Result<(), RegistryError> {
        match self.loader.clone() {
            Some(loader) => loader(self, path),
            None => {
                log::debug!("no loader installed; ignoring {}", path.display());
                Ok(())
            }
        }
    }

    /// Every definition whose pattern matches `step_text`.
    #[must_use]
    pub fn find_matches(&self, step_text: &str, report_name: &str) -> Vec<StepMatch<W>> {
        self.definitions
            .iter()
            .filter_map(|definition| {
                let arguments = definition.pattern.match_arguments(step_text)?;
                Some(StepMatch::new(Rc::clone(definition), step_text, report_name, arguments))
            })
            .collect()
    }

    /// All definitions in registration order.
    #[must_use]
    pub fn definitions(&self) -> &[Rc<StepDefinition<W>>] {
        &self.definitions
    }

    /// All hooks in registration order.
    #[must_use]
    pub fn hooks(&self) -> &[Hook<W>] {
        &self.hooks
    }

    /// Definitions no resolved step has matched.
    #[must_use]
    pub fn unmatched_definitions(&self) -> Vec<Rc<StepDefinition<W>>> {
        self.definitions
            .iter()
            .filter(|definition| !definition.is_used())
            .cloned()
            .collect()
    }

    /// Each definition paired with the step texts it matched.
    #[must_use]
    pub fn usage(&self) -> Vec<(Rc<StepDefinition<W>>, Vec<StepUsage>)> {
        self.definitions
            .iter()
            .map(|definition| (Rc::clone(definition), definition.usage()))
            .collect()
    }

    /// Serialise definitions and their observed usage as JSON.
    ///
    /// # Errors
    /// Propagates serialisation failures.
    #[cfg(feature = "diagnostics")]
    pub fn dump_registry(&self) -> serde_json::Result<String> {
        diagnostics::dump(self)
    }

    pub(crate) fn fire(&self, phase: HookPhase, world: &mut W, ctx: &HookContext<'_>) -> Result<(), StepError> {
        hooks::fire(&self.hooks, phase, world, ctx)
    }

    pub(crate) fn run_around(
        &self,
        world: &mut W,
        ctx: &HookContext<'_>,
        block: &mut dyn FnMut(&mut W),
    ) -> Result<(), StepError> {
        let applicable = hooks::applicable_around(&self.hooks, ctx);
        hooks::around(&applicable, world, ctx, block)
    }
}
