//! A step text paired with the definition it matched.

use crate::registry::StepDefinition;
use cukerun_patterns::{Argument, format_arguments};
use std::fmt;
use std::rc::Rc;

/// One definition matched against one step text.
pub struct StepMatch<W> {
    definition: Rc<StepDefinition<W>>,
    step_text: String,
    report_name: String,
    arguments: Vec<Argument>,
}

impl<W> StepMatch<W> {
    pub(crate) fn new(
        definition: Rc<StepDefinition<W>>,
        step_text: &str,
        report_name: &str,
        arguments: Vec<Argument>,
    ) -> Self {
        Self {
            definition,
            step_text: step_text.to_owned(),
            report_name: report_name.to_owned(),
            arguments,
        }
    }

    /// The matched definition.
    #[must_use]
    pub fn definition(&self) -> &Rc<StepDefinition<W>> {
        &self.definition
    }

    /// Captured arguments in group order.
    #[must_use]
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// The step text that was matched.
    #[must_use]
    pub fn step_text(&self) -> &str {
        &self.step_text
    }

    /// Name the caller reports the step under.
    #[must_use]
    pub fn report_name(&self) -> &str {
        &self.report_name
    }

    /// Captured values that participated in the match.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.arguments.iter().filter_map(Argument::value)
    }

    /// Total characters captured, the tie-breaker between equally
    /// specific candidates.
    #[must_use]
    pub fn captured_chars(&self) -> usize {
        self.values().map(|value| value.chars().count()).sum()
    }

    /// Step text with every argument passed through `wrapper`.
    ///
    /// # Examples
    /// ```
    /// use cukerun::StepRegistry;
    ///
    /// let mut steps = StepRegistry::<()>::new();
    /// steps.register(r"^I pay (\d+) coins$", |_: &mut (), _: u32| {})?;
    /// let matches = steps.find_matches("I pay 12 coins", "");
    /// let formatted: Vec<String> = matches.iter().map(|m| m.format(|v| format!("<{v}>"))).collect();
    /// assert_eq!(formatted, ["I pay <12> coins"]);
    /// # Ok::<(), cukerun::RegistryError>(())
    /// ```
    #[must_use]
    pub fn format(&self, wrapper: impl Fn(&str) -> String) -> String {
        format_arguments(&self.step_text, &self.arguments, wrapper)
    }
}

impl<W> fmt::Debug for StepMatch<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepMatch")
            .field("definition", &self.definition)
            .field("step_text", &self.step_text)
            .field("report_name", &self.report_name)
            .field("arguments", &self.arguments)
            .finish()
    }
}
