//! Tag occurrence caps checked before a run starts.

use crate::feature::{Feature, Location, ScenarioDefinition};
use std::collections::BTreeMap;
use std::fmt;

/// Maximum number of times a tag may be declared across a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLimit {
    tag: String,
    max: usize,
}

impl TagLimit {
    /// Cap `tag` (with or without `@`) at `max` occurrences.
    #[must_use]
    pub fn new(tag: String, max: usize) -> Self {
        Self {
            tag: super::normalise_tag(&tag),
            max,
        }
    }

    /// The `@`-prefixed tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The cap.
    #[must_use]
    pub fn max(&self) -> usize {
        self.max
    }
}

/// A tag declared more often than its cap allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLimitViolation {
    /// The offending tag.
    pub tag: String,
    /// Declared cap.
    pub limit: usize,
    /// Every place the tag is declared, in document order.
    pub locations: Vec<Location>,
}

impl fmt::Display for TagLimitViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} occurred {} times, but the limit was set to {}",
            self.tag,
            self.locations.len(),
            self.limit
        )?;
        for location in &self.locations {
            write!(f, "\n  {location}")?;
        }
        Ok(())
    }
}

/// Tally where every tag is declared: on features, rules, scenarios,
/// outlines and examples blocks.
#[must_use]
pub fn count_tags(features: &[Feature]) -> BTreeMap<String, Vec<Location>> {
    let mut counts: BTreeMap<String, Vec<Location>> = BTreeMap::new();
    for feature in features {
        tally(&mut counts, &feature.tags, &feature.location);
        tally_scenarios(&mut counts, &feature.scenarios);
        for rule in &feature.rules {
            tally(&mut counts, &rule.tags, &rule.location);
            tally_scenarios(&mut counts, &rule.scenarios);
        }
    }
    counts
}

fn tally(counts: &mut BTreeMap<String, Vec<Location>>, tags: &[String], location: &Location) {
    for tag in tags {
        counts
            .entry(super::normalise_tag(tag))
            .or_default()
            .push(location.clone());
    }
}

fn tally_scenarios(counts: &mut BTreeMap<String, Vec<Location>>, scenarios: &[ScenarioDefinition]) {
    for definition in scenarios {
        tally(counts, definition.tags(), definition.location());
        for examples in definition.examples() {
            tally(counts, &examples.tags, &examples.location);
        }
    }
}

/// Compare tallies with the declared caps, reporting one violation per
/// exceeded tag.
#[must_use]
pub fn check_limits(
    counts: &BTreeMap<String, Vec<Location>>,
    limits: &[TagLimit],
) -> Vec<TagLimitViolation> {
    limits
        .iter()
        .filter_map(|limit| {
            let locations = counts.get(limit.tag())?;
            (locations.len() > limit.max()).then(|| TagLimitViolation {
                tag: limit.tag().to_owned(),
                limit: limit.max(),
                locations: locations.clone(),
            })
        })
        .collect()
}
