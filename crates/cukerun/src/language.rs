//! Step languages: sources of step definitions and hooks.
//!
//! The runner talks to definitions only through [`StepLanguage`], so a
//! table of languages keyed by code-file extension can sit where a single
//! [`StepRegistry`] usually does.

use crate::context::HookContext;
use crate::error::{RegistryError, StepError};
use crate::registry::{HookPhase, StepRegistry};
use crate::step_match::StepMatch;
use std::fmt;
use std::path::Path;

/// Capabilities the runner needs from a source of step definitions.
pub trait StepLanguage<W> {
    /// Load step definitions from a code file.
    ///
    /// # Errors
    /// Returns [`RegistryError`] when a definition in the file is invalid.
    fn load_code_file(&mut self, path: &Path) -> Result<(), RegistryError> {
        log::debug!("ignoring code file {}", path.display());
        Ok(())
    }

    /// Every definition matching `step_text`.
    fn step_matches(&self, step_text: &str, report_name: &str) -> Vec<StepMatch<W>>;

    /// Fire the `Before`, `After` or `AfterStep` hooks selected by `ctx`.
    ///
    /// # Errors
    /// Returns the first hook failure.
    fn fire_hook(&self, phase: HookPhase, world: &mut W, ctx: &HookContext<'_>) -> Result<(), StepError>;

    /// Run `block` inside this language's `Around` hooks.
    ///
    /// # Errors
    /// Returns an `Around` hook failure.
    fn around(
        &self,
        world: &mut W,
        ctx: &HookContext<'_>,
        block: &mut dyn FnMut(&mut W),
    ) -> Result<(), StepError>;
}

impl<W> StepLanguage<W> for StepRegistry<W> {
    fn load_code_file(&mut self, path: &Path) -> Result<(), RegistryError> {
        self.load(path)
    }

    fn step_matches(&self, step_text: &str, report_name: &str) -> Vec<StepMatch<W>> {
        self.find_matches(step_text, report_name)
    }

    fn fire_hook(&self, phase: HookPhase, world: &mut W, ctx: &HookContext<'_>) -> Result<(), StepError> {
        self.fire(phase, world, ctx)
    }

    fn around(
        &self,
        world: &mut W,
        ctx: &HookContext<'_>,
        block: &mut dyn FnMut(&mut W),
    ) -> Result<(), StepError> {
        self.run_around(world, ctx, block)
    }
}

/// Languages keyed by code-file extension, in registration order.
///
/// The table is itself a [`StepLanguage`]: matches are gathered from every
/// language, hooks fire language by language, and `Around` hooks nest with
/// the first registered language outermost.
pub struct Languages<W> {
    entries: Vec<(String, Box<dyn StepLanguage<W>>)>,
}

impl<W> Default for Languages<W> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<W> fmt::Debug for Languages<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(extension, _)| extension))
            .finish()
    }
}

impl<W> Languages<W> {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `language` for files ending in `.extension`, replacing any
    /// language already registered for it.
    pub fn register(&mut self, extension: &str, language: impl StepLanguage<W> + 'static) {
        let extension = extension.trim_start_matches('.').to_owned();
        let language: Box<dyn StepLanguage<W>> = Box::new(language);
        match self.entries.iter_mut().find(|(existing, _)| *existing == extension) {
            Some(entry) => entry.1 = language,
            None => self.entries.push((extension, language)),
        }
    }

    /// The language for `extension`, or `None` when unsupported.
    #[must_use]
    pub fn get(&self, extension: &str) -> Option<&dyn StepLanguage<W>> {
        let extension = extension.trim_start_matches('.');
        let found = self
            .entries
            .iter()
            .find(|(existing, _)| existing == extension)
            .map(|(_, language)| language.as_ref());
        if found.is_none() {
            log::debug!("no step language registered for .{extension}");
        }
        found
    }

    /// Registered extensions.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(extension, _)| extension.as_str())
    }

    fn language_for_mut(&mut self, path: &Path) -> Option<&mut Box<dyn StepLanguage<W>>> {
        let extension = path.extension()?.to_str()?;
        self.entries
            .iter_mut()
            .find(|(existing, _)| existing == extension)
            .map(|(_, language)| language)
    }
}

impl<W> StepLanguage<W> for Languages<W> {
    /// Hand `path` to the language registered for its extension. Files
    /// with an unsupported extension are logged and skipped.
    fn load_code_file(&mut self, path: &Path) -> Result<(), RegistryError> {
        match self.language_for_mut(path) {
            Some(language) => language.load_code_file(path),
            None => {
                log::warn!("unsupported step file {}", path.display());
                Ok(())
            }
        }
    }

    fn step_matches(&self, step_text: &str, report_name: &str) -> Vec<StepMatch<W>> {
        self.entries
            .iter()
            .flat_map(|(_, language)| language.step_matches(step_text, report_name))
            .collect()
    }

    fn fire_hook(&self, phase: HookPhase, world: &mut W, ctx: &HookContext<'_>) -> Result<(), StepError> {
        let mut first_failure = None;
        for (_, language) in &self.entries {
            if let Err(err) = language.fire_hook(phase, world, ctx) {
                if phase == HookPhase::Before {
                    return Err(err);
                }
                first_failure.get_or_insert(err);
            }
        }
        first_failure.map_or(Ok(()), Err)
    }

    fn around(
        &self,
        world: &mut W,
        ctx: &HookContext<'_>,
        block: &mut dyn FnMut(&mut W),
    ) -> Result<(), StepError> {
        nest(&self.entries, world, ctx, block)
    }
}

fn nest<W>(
    entries: &[(String, Box<dyn StepLanguage<W>>)],
    world: &mut W,
    ctx: &HookContext<'_>,
    block: &mut dyn FnMut(&mut W),
) -> Result<(), StepError> {
    let Some(((_, outer), rest)) = entries.split_first() else {
        block(world);
        return Ok(());
    };
    let mut inner = Ok(());
    outer.around(world, ctx, &mut |world: &mut W| {
        inner = nest(rest, world, ctx, block);
    })?;
    inner
}
