//! Argument transforms applied to captured values before conversion.

use crate::error::RegistryError;
use regex::Regex;
use std::fmt;

/// Callback receiving the transform pattern's captures (or the whole value
/// when the pattern has no groups).
pub type TransformFn = Box<dyn Fn(&[String]) -> String>;

pub(crate) struct Transform {
    source: String,
    regex: Regex,
    callback: TransformFn,
}

impl Transform {
    pub(crate) fn new(source: &str, callback: TransformFn) -> Result<Self, RegistryError> {
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|err| RegistryError::Transform {
            pattern: source.to_owned(),
            source: err,
        })?;
        Ok(Self {
            source: source.to_owned(),
            regex,
            callback,
        })
    }

    /// Transformed value when the pattern matches all of `value`.
    pub(crate) fn apply(&self, value: &str) -> Option<String> {
        let captures = self.regex.captures(value)?;
        let groups: Vec<String> = if captures.len() > 1 {
            captures
                .iter()
                .skip(1)
                .map(|group| group.map_or_else(String::new, |m| m.as_str().to_owned()))
                .collect()
        } else {
            vec![value.to_owned()]
        };
        Some((self.callback)(&groups))
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform").field("source", &self.source).finish_non_exhaustive()
    }
}

/// First matching transform wins; unmatched values pass through.
pub(crate) fn apply_first(transforms: &[Transform], value: &str) -> String {
    transforms
        .iter()
        .find_map(|transform| transform.apply(value))
        .unwrap_or_else(|| value.to_owned())
}
