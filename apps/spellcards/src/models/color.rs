use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::CardError;

/// A six-digit RGB hex color, stored lowercase without a leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HexColor(String);

impl HexColor {
    /// Parses `"ED7D31"`, `"#ed7d31"` or the three-digit shorthand `"aaa"`.
    pub fn parse(raw: &str) -> Result<Self, CardError> {
        let trimmed = raw.trim().trim_start_matches('#');
        let expanded = match trimmed.len() {
            3 => trimmed.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => trimmed.to_string(),
            _ => {
                return Err(CardError::InvalidField {
                    field: "color",
                    value: raw.to_string(),
                })
            }
        };
        if !expanded.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CardError::InvalidField {
                field: "color",
                value: raw.to_string(),
            });
        }
        Ok(HexColor(expanded.to_ascii_lowercase()))
    }

    /// Builds a color from a literal known to be valid lowercase hex.
    pub(crate) fn from_static(hex: &'static str) -> Self {
        HexColor(hex.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        HexColor::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Black, used for class names that do not apply to a spell.
pub fn neutral_text() -> HexColor {
    HexColor::from_static("000000")
}

/// White, used for table header text on a school-colored fill.
pub fn header_text() -> HexColor {
    HexColor::from_static("ffffff")
}
