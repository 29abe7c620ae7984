//! Choosing one definition among several matches.
//!
//! [`resolve`] applies the guess-mode tie-breaks; [`Resolver`] memoises the
//! outcome per `(step text, report name)` for the lifetime of one run so
//! repeated lookups hand back the same [`StepMatch`] instance.

use crate::error::ExecutionError;
use crate::language::StepLanguage;
use crate::step_match::StepMatch;
use std::collections::HashMap;
use std::rc::Rc;

/// Pick the single match for `step_text`.
///
/// With one candidate it is returned as is. With several, guess mode prefers
/// argument-free patterns with the most literal text; failing that, the
/// candidates with the most arguments and then the fewest captured
/// characters.
///
/// # Errors
/// [`ExecutionError::Undefined`] when `matches` is empty and
/// [`ExecutionError::Ambiguous`] when no single candidate remains.
pub fn resolve<W>(
    step_text: &str,
    mut matches: Vec<StepMatch<W>>,
    guess: bool,
) -> Result<StepMatch<W>, ExecutionError> {
    if matches.len() <= 1 {
        return matches.pop().ok_or_else(|| ExecutionError::Undefined {
            text: step_text.to_owned(),
        });
    }
    if !guess {
        return Err(ambiguous(step_text, &matches, true));
    }
    let best = best_matches(matches);
    if best.len() > 1 {
        return Err(ambiguous(step_text, &best, false));
    }
    best.into_iter().next().ok_or_else(|| ExecutionError::Undefined {
        text: step_text.to_owned(),
    })
}

fn best_matches<W>(matches: Vec<StepMatch<W>>) -> Vec<StepMatch<W>> {
    if matches.iter().any(|m| m.arguments().is_empty()) {
        let literal = |m: &StepMatch<W>| m.definition().pattern().specificity().literal_chars;
        let argument_free: Vec<_> = matches.into_iter().filter(|m| m.arguments().is_empty()).collect();
        let longest = argument_free.iter().map(literal).max().unwrap_or_default();
        return argument_free.into_iter().filter(|m| literal(m) == longest).collect();
    }
    let max_args = matches.iter().map(|m| m.arguments().len()).max().unwrap_or_default();
    let widest: Vec<_> = matches.into_iter().filter(|m| m.arguments().len() == max_args).collect();
    let shortest = widest.iter().map(StepMatch::captured_chars).min().unwrap_or_default();
    widest.into_iter().filter(|m| m.captured_chars() == shortest).collect()
}

fn ambiguous<W>(step_text: &str, matches: &[StepMatch<W>], guess_hint: bool) -> ExecutionError {
    log::warn!("ambiguous step {step_text:?}: {} candidates", matches.len());
    ExecutionError::Ambiguous {
        text: step_text.to_owned(),
        candidates: matches.iter().map(|m| m.definition().describe()).collect(),
        guess_hint,
    }
}

/// Resolves steps against a language and caches successful matches.
///
/// A resolver lives for one run; create a new one for the next.
pub struct Resolver<'l, W> {
    language: &'l dyn StepLanguage<W>,
    guess: bool,
    cache: HashMap<(String, String), Rc<StepMatch<W>>>,
}

impl<'l, W> Resolver<'l, W> {
    /// A resolver with an empty cache.
    pub fn new(language: &'l dyn StepLanguage<W>, guess: bool) -> Self {
        Self {
            language,
            guess,
            cache: HashMap::new(),
        }
    }

    /// Resolve `step_text`, reusing the cached match for a repeated key.
    ///
    /// # Errors
    /// As for [`resolve`]. Failures are not cached.
    pub fn step_match(&mut self, step_text: &str, report_name: &str) -> Result<Rc<StepMatch<W>>, ExecutionError> {
        let key = (step_text.to_owned(), report_name.to_owned());
        if let Some(cached) = self.cache.get(&key) {
            return Ok(Rc::clone(cached));
        }
        log::debug!("resolving {step_text:?}");
        let candidates = self.language.step_matches(step_text, report_name);
        let chosen = Rc::new(resolve(step_text, candidates, self.guess)?);
        chosen
            .definition()
            .record_usage(chosen.step_text(), chosen.arguments());
        self.cache.insert(key, Rc::clone(&chosen));
        Ok(chosen)
    }

    /// Number of memoised matches.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StepRegistry;
    use rstest::rstest;

    fn registry(patterns: &[&str]) -> StepRegistry<()> {
        let mut registry = StepRegistry::new();
        for pattern in patterns {
            registry
                .register_variadic(*pattern, |_: &mut (), _: &crate::StepArgs<'_>| {})
                .unwrap_or_else(|err| panic!("{pattern} should compile: {err}"));
        }
        registry
    }

    fn chosen(patterns: &[&str], text: &str, guess: bool) -> Result<String, ExecutionError> {
        let registry = registry(patterns);
        resolve(text, registry.find_matches(text, text), guess)
            .map(|m| m.definition().pattern().source().to_owned())
    }

    #[test]
    fn no_candidates_is_undefined() {
        assert!(matches!(
            chosen(&["^other$"], "Simple lucid test", true),
            Err(ExecutionError::Undefined { .. })
        ));
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    fn a_single_candidate_needs_no_guessing(#[case] guess: bool) {
        assert_eq!(chosen(&["Simple (.*)"], "Simple lucid", guess).ok().as_deref(), Some("Simple (.*)"));
    }

    #[test]
    fn several_candidates_without_guessing_suggest_guess_mode() {
        let Err(ExecutionError::Ambiguous { candidates, guess_hint, .. }) =
            chosen(&["Simple (.*) test", "Simple (.*)"], "Simple lucid test", false)
        else {
            panic!("expected an ambiguity");
        };
        assert_eq!(candidates.len(), 2);
        assert!(guess_hint);
    }

    #[test]
    fn guessing_prefers_the_shortest_capture() {
        let picked = chosen(&["Simple (.*)", "Simple (.*) test"], "Simple lucid test", true);
        assert_eq!(picked.ok().as_deref(), Some("Simple (.*) test"));
    }

    #[test]
    fn identical_patterns_stay_ambiguous_when_guessing() {
        let Err(ExecutionError::Ambiguous { candidates, guess_hint, .. }) =
            chosen(&["Simple (.*)", "Simple (.*)"], "Simple lucid test", true)
        else {
            panic!("identical patterns cannot be told apart");
        };
        assert_eq!(candidates.len(), 2);
        assert!(!guess_hint);
    }

    #[test]
    fn guessing_prefers_argument_free_literal_patterns() {
        let picked = chosen(&["^I am (.*)$", "^I am here$", "here$"], "I am here", true);
        assert_eq!(picked.ok().as_deref(), Some("^I am here$"));
    }

    #[test]
    fn guessing_prefers_more_arguments() {
        let picked = chosen(&[r"^(\w+) and (\w+)$", r"^(.+)$"], "salt and pepper", true);
        assert_eq!(picked.ok().as_deref(), Some(r"^(\w+) and (\w+)$"));
    }

    #[test]
    fn resolver_returns_the_same_instance_for_a_repeated_key() {
        let registry = registry(&["^Simple (.*)$"]);
        let mut resolver = Resolver::new(&registry, false);
        let first = resolver
            .step_match("Simple lucid", "Given Simple lucid")
            .unwrap_or_else(|err| panic!("{err}"));
        let second = resolver
            .step_match("Simple lucid", "Given Simple lucid")
            .unwrap_or_else(|err| panic!("{err}"));
        assert!(Rc::ptr_eq(&first, &second));
        let other_name = resolver
            .step_match("Simple lucid", "And Simple lucid")
            .unwrap_or_else(|err| panic!("{err}"));
        assert!(!Rc::ptr_eq(&first, &other_name));
        assert!(Rc::ptr_eq(first.definition(), other_name.definition()));
        assert_eq!(resolver.cached(), 2);
    }

    #[test]
    fn resolver_records_usage_and_skips_caching_failures() {
        let registry = registry(&["^Simple (.*)$", "^unused$"]);
        let mut resolver = Resolver::new(&registry, false);
        assert!(resolver.step_match("missing", "").is_err());
        assert_eq!(resolver.cached(), 0);
        assert!(resolver.step_match("Simple x", "").is_ok());
        let unmatched = registry.unmatched_definitions();
        assert_eq!(unmatched.len(), 1);
        assert!(unmatched.iter().all(|d| d.pattern().source() == "^unused$"));
    }
}
