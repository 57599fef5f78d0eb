// ABOUTME: Instance classes and the ordered ladder used for vertical scaling.
// ABOUTME: The ladder is non-empty, duplicate-free, and ordered smallest first.

use nonempty::NonEmpty;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstanceClassError {
    #[error("instance class cannot be empty")]
    Empty,

    #[error("invalid character in instance class: '{0}'")]
    InvalidChar(char),
}

/// A compute size such as `t3.large`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceClass(String);

impl InstanceClass {
    pub fn new(value: &str) -> Result<Self, InstanceClassError> {
        if value.is_empty() {
            return Err(InstanceClassError::Empty);
        }
        if let Some(c) = value.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(InstanceClassError::InvalidChar(c));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for InstanceClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InstanceClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        InstanceClass::new(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LadderError {
    #[error("instance class ladder must contain at least one class")]
    Empty,

    #[error("instance class ladder lists '{0}' more than once")]
    Duplicate(String),

    #[error(transparent)]
    InvalidClass(#[from] InstanceClassError),
}

/// Instance classes ordered by increasing capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceClassLadder {
    classes: NonEmpty<InstanceClass>,
}

impl InstanceClassLadder {
    pub fn new(classes: Vec<InstanceClass>) -> Result<Self, LadderError> {
        let mut seen = HashSet::new();
        for class in &classes {
            if !seen.insert(class.as_str()) {
                return Err(LadderError::Duplicate(class.to_string()));
            }
        }

        let classes = NonEmpty::from_vec(classes).ok_or(LadderError::Empty)?;
        Ok(Self { classes })
    }

    /// Build a ladder from raw class names.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, LadderError> {
        let classes = names
            .iter()
            .map(|n| InstanceClass::new(n.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(classes)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn position(&self, class: &InstanceClass) -> Option<usize> {
        self.classes.iter().position(|c| c == class)
    }

    pub fn get(&self, index: usize) -> Option<&InstanceClass> {
        self.classes.get(index)
    }

    /// Class one rung above `index`, clamped at the top.
    pub fn step_up(&self, index: usize) -> &InstanceClass {
        let top = self.classes.len() - 1;
        self.classes
            .get((index + 1).min(top))
            .unwrap_or_else(|| self.classes.last())
    }

    /// Class one rung below `index`, clamped at the bottom.
    pub fn step_down(&self, index: usize) -> &InstanceClass {
        self.classes
            .get(index.saturating_sub(1))
            .unwrap_or_else(|| self.classes.first())
    }

    pub fn smallest(&self) -> &InstanceClass {
        self.classes.first()
    }

    pub fn largest(&self) -> &InstanceClass {
        self.classes.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstanceClass> {
        self.classes.iter()
    }
}

impl Serialize for InstanceClassLadder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names: Vec<&str> = self.classes.iter().map(InstanceClass::as_str).collect();
        names.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InstanceClassLadder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names: Vec<String> = Vec::deserialize(deserializer)?;
        InstanceClassLadder::parse(&names).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> InstanceClassLadder {
        InstanceClassLadder::parse(&["small", "medium", "large"]).unwrap()
    }

    #[test]
    fn rejects_empty_ladder() {
        let names: [&str; 0] = [];
        assert_eq!(InstanceClassLadder::parse(&names), Err(LadderError::Empty));
    }

    #[test]
    fn rejects_duplicates() {
        assert_eq!(
            InstanceClassLadder::parse(&["small", "large", "small"]),
            Err(LadderError::Duplicate("small".to_string()))
        );
    }

    #[test]
    fn steps_clamp_at_both_ends() {
        let ladder = ladder();
        assert_eq!(ladder.step_up(2).as_str(), "large");
        assert_eq!(ladder.step_down(0).as_str(), "small");
        assert_eq!(ladder.step_up(0).as_str(), "medium");
        assert_eq!(ladder.step_down(2).as_str(), "medium");
    }

    #[test]
    fn single_rung_ladder_never_moves() {
        let ladder = InstanceClassLadder::parse(&["only"]).unwrap();
        assert_eq!(ladder.step_up(0).as_str(), "only");
        assert_eq!(ladder.step_down(0).as_str(), "only");
    }

    #[test]
    fn deserializes_from_yaml_list() {
        let ladder: InstanceClassLadder =
            serde_yaml::from_str("[t3.medium, t3.large, t3.xlarge]").unwrap();
        assert_eq!(ladder.len(), 3);
        assert_eq!(ladder.largest().as_str(), "t3.xlarge");
    }

    #[test]
    fn deserialize_rejects_duplicates() {
        let result: Result<InstanceClassLadder, _> = serde_yaml::from_str("[a, a]");
        assert!(result.is_err());
    }
}
