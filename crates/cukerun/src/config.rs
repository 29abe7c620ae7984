//! Run configuration.
//!
//! [`RunOptions`] carries the per-run policy switches. The full-backtrace
//! flag is process wide because panic capture happens far below the run
//! entry point; it can be forced in-process or read from
//! `CUKERUN_FULL_BACKTRACE`.

use crate::tags::{TagFilter, TagFilterError, TagLimit};
use std::sync::atomic::{AtomicU8, Ordering};

const OVERRIDE_UNSET: u8 = 0;
const OVERRIDE_FALSE: u8 = 1;
const OVERRIDE_TRUE: u8 = 2;

static FULL_BACKTRACE_OVERRIDE: AtomicU8 = AtomicU8::new(OVERRIDE_UNSET);

fn parse_env_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().as_deref().and_then(parse_env_bool)
}

/// Whether captured backtraces keep framework and dependency frames.
#[must_use]
pub fn full_backtrace() -> bool {
    let forced = match FULL_BACKTRACE_OVERRIDE.load(Ordering::Relaxed) {
        OVERRIDE_FALSE => Some(false),
        OVERRIDE_TRUE => Some(true),
        _ => None,
    };
    forced
        .or_else(|| env_flag("CUKERUN_FULL_BACKTRACE"))
        .unwrap_or(false)
}

/// Force the full-backtrace flag for the current process.
pub fn set_full_backtrace(enabled: bool) {
    let value = if enabled {
        OVERRIDE_TRUE
    } else {
        OVERRIDE_FALSE
    };
    FULL_BACKTRACE_OVERRIDE.store(value, Ordering::Relaxed);
}

/// Fall back to the environment for the full-backtrace flag.
pub fn clear_full_backtrace_override() {
    FULL_BACKTRACE_OVERRIDE.store(OVERRIDE_UNSET, Ordering::Relaxed);
}

/// Policy switches for one run.
///
/// # Examples
/// ```
/// use cukerun::RunOptions;
///
/// let options = RunOptions::default()
///     .strict(true)
///     .with_tags("~@wip")?;
/// assert!(options.is_strict());
/// # Ok::<(), cukerun::TagFilterError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    strict: bool,
    wip: bool,
    guess: bool,
    dry_run: bool,
    filter: TagFilter,
    limits: Vec<TagLimit>,
}

impl RunOptions {
    /// Seed options from `CUKERUN_STRICT`, `CUKERUN_WIP`, `CUKERUN_GUESS`,
    /// `CUKERUN_DRY_RUN` and `CUKERUN_TAGS` (tag options separated by `;`).
    ///
    /// # Errors
    /// Returns [`TagFilterError`] when `CUKERUN_TAGS` holds a malformed option.
    pub fn from_env() -> Result<Self, TagFilterError> {
        let mut options = Self::default()
            .strict(env_flag("CUKERUN_STRICT").unwrap_or(false))
            .wip(env_flag("CUKERUN_WIP").unwrap_or(false))
            .guess(env_flag("CUKERUN_GUESS").unwrap_or(false))
            .dry_run(env_flag("CUKERUN_DRY_RUN").unwrap_or(false));
        if let Ok(tags) = std::env::var("CUKERUN_TAGS") {
            for option in tags.split(';').filter(|option| !option.trim().is_empty()) {
                options = options.with_tags(option)?;
            }
        }
        Ok(options)
    }

    /// Treat undefined and pending steps as failures.
    #[must_use]
    pub fn strict(mut self, enabled: bool) -> Self {
        self.strict = enabled;
        self
    }

    /// Invert the verdict: the run fails if any scenario passes.
    #[must_use]
    pub fn wip(mut self, enabled: bool) -> Self {
        self.wip = enabled;
        self
    }

    /// Break ties between matching step definitions heuristically.
    #[must_use]
    pub fn guess(mut self, enabled: bool) -> Self {
        self.guess = enabled;
        self
    }

    /// Resolve every step without invoking steps or hooks.
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Add one tag option. Repeated options are combined with AND; any
    /// `@tag:N` limits in a legacy option are collected as well.
    ///
    /// # Errors
    /// Returns [`TagFilterError`] when the option cannot be parsed.
    pub fn with_tags(mut self, option: &str) -> Result<Self, TagFilterError> {
        let limits = self.filter.push_option(option)?;
        self.limits.extend(limits);
        Ok(self)
    }

    /// Add an occurrence cap for `tag` without filtering on it.
    #[must_use]
    pub fn with_limit(mut self, limit: TagLimit) -> Self {
        self.limits.push(limit);
        self
    }

    /// Whether strict mode is on.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Whether wip mode is on.
    #[must_use]
    pub fn is_wip(&self) -> bool {
        self.wip
    }

    /// Whether guess mode is on.
    #[must_use]
    pub fn is_guess(&self) -> bool {
        self.guess
    }

    /// Whether this is a dry run.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Tag filter deciding which scenarios are visited.
    #[must_use]
    pub fn tag_filter(&self) -> &TagFilter {
        &self.filter
    }

    /// Declared tag occurrence caps.
    #[must_use]
    pub fn tag_limits(&self) -> &[TagLimit] {
        &self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serial_test::serial;

    #[test]
    #[serial]
    fn full_backtrace_defaults_off() {
        clear_full_backtrace_override();
        if std::env::var_os("CUKERUN_FULL_BACKTRACE").is_none() {
            assert!(!full_backtrace());
        }
    }

    #[test]
    #[serial]
    fn override_wins_over_environment() {
        set_full_backtrace(true);
        assert!(full_backtrace());
        set_full_backtrace(false);
        assert!(!full_backtrace());
        clear_full_backtrace_override();
    }

    #[rstest]
    #[case("1", Some(true))]
    #[case(" Yes ", Some(true))]
    #[case("ON", Some(true))]
    #[case("false", Some(false))]
    #[case("Off", Some(false))]
    #[case("0", Some(false))]
    #[case("sometimes", None)]
    fn parses_boolean_words(#[case] raw: &str, #[case] expected: Option<bool>) {
        assert_eq!(parse_env_bool(raw), expected);
    }

    #[test]
    fn tag_options_collect_limits() {
        let Ok(options) = RunOptions::default().with_tags("@smoke:2,@fast") else {
            panic!("tag option should parse");
        };
        assert_eq!(options.tag_limits().len(), 1);
        assert_eq!(
            options.tag_limits().first().map(TagLimit::tag),
            Some("@smoke")
        );
    }
}
