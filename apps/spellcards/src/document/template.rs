//! Card template: the two page layouts every card document is instantiated from.
//!
//! The built-in template ships with the binary. A customised copy can be printed with
//! `spellcards template`, edited and passed back with `--template`.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::{PageDocument, PageGeometry, Region, Section};
use crate::errors::CardError;
use crate::models::HexColor;

const BUILT_IN_TEMPLATE: &str = include_str!("../../resources/template.json");

/// Section index of the primary page in a freshly instantiated document.
pub const PRIMARY: usize = 0;
/// Section index of the continuation page in a freshly instantiated document.
pub const CONTINUATION: usize = 1;

/// Regions the primary page must carry, each exactly once.
pub const PRIMARY_REGIONS: [&str; 10] = [
    "name",
    "level",
    "range",
    "duration",
    "casting_time",
    "requirements",
    "material",
    "blurb",
    "classes",
    "description",
];

/// Number of marker runs in the `requirements` region.
pub const REQUIREMENT_MARKERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardTemplate {
    pub geometry: PageGeometry,
    /// Color the template uses wherever the school color belongs.
    pub placeholder_color: HexColor,
    /// Color of requirement markers that do not apply.
    pub inactive_marker_color: HexColor,
    pub primary: Vec<Region>,
    pub continuation: Vec<Region>,
}

impl CardTemplate {
    pub fn built_in() -> Result<Self, CardError> {
        Self::from_json(BUILT_IN_TEMPLATE)
    }

    /// Parses and validates a template.
    pub fn from_json(json: &str) -> Result<Self, CardError> {
        let template: CardTemplate = serde_json::from_str(json)
            .map_err(|e| CardError::Template(format!("unreadable template: {e}")))?;
        template.validate()?;
        Ok(template)
    }

    pub fn load(path: &Path) -> Result<Self, CardError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            CardError::Template(format!("cannot read template {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Checks that both pages carry the regions the page builder relies on.
    pub fn validate(&self) -> Result<(), CardError> {
        let counts = tag_counts(&self.primary);
        for tag in PRIMARY_REGIONS {
            match counts.get(tag).copied().unwrap_or(0) {
                1 => {}
                0 => {
                    return Err(CardError::Template(format!(
                        "primary page is missing the '{tag}' region"
                    )))
                }
                n => {
                    return Err(CardError::Template(format!(
                        "primary page has {n} '{tag}' regions"
                    )))
                }
            }
        }

        let counts = tag_counts(&self.continuation);
        if counts.get("name").copied().unwrap_or(0) != 1 {
            return Err(CardError::Template(
                "continuation page needs exactly one 'name' region".to_string(),
            ));
        }
        if counts.get("description").copied().unwrap_or(0) != 1 {
            return Err(CardError::Template(
                "continuation page needs exactly one 'description' region".to_string(),
            ));
        }

        let markers = self
            .primary
            .iter()
            .filter(|r| r.tag == "requirements")
            .flat_map(|r| r.runs())
            .filter(|run| !run.text.trim().is_empty())
            .count();
        if markers != REQUIREMENT_MARKERS {
            return Err(CardError::Template(format!(
                "requirements region has {markers} markers, expected {REQUIREMENT_MARKERS}"
            )));
        }

        if self.geometry.table_width == 0 || self.geometry.content_width() == 0 {
            return Err(CardError::Template("page geometry leaves no room".to_string()));
        }
        Ok(())
    }

    /// A fresh two-page document: the primary page followed by one continuation page.
    pub fn instantiate(&self, title: &str) -> PageDocument {
        PageDocument {
            title: title.to_string(),
            geometry: self.geometry,
            sections: vec![
                Section {
                    name: "primary".to_string(),
                    regions: self.primary.clone(),
                },
                Section {
                    name: "continuation".to_string(),
                    regions: self.continuation.clone(),
                },
            ],
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, CardError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn tag_counts(regions: &[Region]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for region in regions {
        *counts.entry(region.tag.as_str()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built_in() -> CardTemplate {
        CardTemplate::built_in().unwrap()
    }

    #[test]
    fn test_built_in_template_is_valid() {
        let template = built_in();
        assert_eq!(template.placeholder_color.as_str(), "ed7d31");
        assert_eq!(template.primary.len(), PRIMARY_REGIONS.len());
    }

    #[test]
    fn test_instantiate_yields_primary_then_continuation() {
        let doc = built_in().instantiate("Fireball");
        assert_eq!(doc.title, "Fireball");
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[PRIMARY].name, "primary");
        assert_eq!(
            doc.sections[CONTINUATION]
                .regions
                .iter()
                .filter(|r| r.tag == "description")
                .count(),
            1
        );
    }

    #[test]
    fn test_template_survives_json_round_trip() {
        let template = built_in();
        let json = template.to_json_pretty().unwrap();
        assert_eq!(CardTemplate::from_json(&json).unwrap(), template);
    }

    // ── Validation failures ─────────────────────────────────────────────────

    #[test]
    fn test_missing_primary_region_is_fatal() {
        let mut template = built_in();
        template.primary.retain(|r| r.tag != "classes");
        let err = template.validate().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("classes"));
    }

    #[test]
    fn test_duplicate_region_is_fatal() {
        let mut template = built_in();
        let extra = template.primary[2].clone();
        template.primary.push(extra);
        assert!(template.validate().is_err());
    }

    #[test]
    fn test_continuation_needs_single_description() {
        let mut template = built_in();
        let extra = template.continuation[1].clone();
        template.continuation.push(extra);
        assert!(template.validate().unwrap_err().to_string().contains("description"));

        let mut template = built_in();
        template.continuation.retain(|r| r.tag != "description");
        assert!(template.validate().is_err());
    }

    #[test]
    fn test_requirements_need_five_markers() {
        let mut template = built_in();
        let region = template
            .primary
            .iter_mut()
            .find(|r| r.tag == "requirements")
            .unwrap();
        if let Some(crate::document::Block::Paragraph(p)) = region.blocks.first_mut() {
            p.runs.pop();
        }
        assert!(template.validate().unwrap_err().to_string().contains("markers"));
    }

    #[test]
    fn test_unreadable_template_is_a_template_error() {
        let err = CardTemplate::from_json("{\"geometry\": 3}").unwrap_err();
        assert!(matches!(err, CardError::Template(_)));
    }
}
