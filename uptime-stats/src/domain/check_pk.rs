use serde::{Deserialize, Deserializer, Serialize};
use serde_aux::field_attributes::deserialize_string_from_number;
use std::fmt;
use std::str::FromStr;
use unicode_segmentation::UnicodeSegmentation;

/// Primary key of a monitored check. Opaque to us, but it is spliced into
/// request paths, so user-supplied keys are validated before any call.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CheckPk(String);

impl CheckPk {
    pub fn parse(s: String) -> Result<Self, String> {
        let forbidden_characters = ['/', '?', '#', '&', '%', '\\', ' '];

        if s.trim().is_empty() {
            Err(format!("Check key '{}' has no non-whitespace characters.", s))
        } else if s.graphemes(true).count() > 64 {
            Err(format!("Check key {} is too long.", s))
        } else if s.chars().any(|g| forbidden_characters.contains(&g)) {
            Err(format!("Check key '{}' contains forbidden characters.", s))
        } else {
            Ok(Self(s))
        }
    }
}

impl AsRef<str> for CheckPk {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckPk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CheckPk {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.trim().to_owned())
    }
}

// The API reports keys as integers; we only ever treat them as text.
impl<'de> Deserialize<'de> for CheckPk {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_string_from_number(deserializer).map(Self)
    }
}

/// Which checks a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckSelection {
    /// Every check in the account; stats calls are made without a `pk`.
    All,
    Explicit(Vec<CheckPk>),
}

impl CheckSelection {
    pub fn from_keys(keys: Vec<CheckPk>) -> Self {
        if keys.is_empty() {
            Self::All
        } else {
            Self::Explicit(keys)
        }
    }
}
