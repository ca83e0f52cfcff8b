use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::color::HexColor;

/// Class columns recognised in the input table, in template order.
pub const CLASSES: [&str; 9] = [
    "Artificer", "Bard", "Cleric", "Druid", "Paladin", "Ranger", "Sorcerer", "Warlock", "Wizard",
];

/// Fallback accent for schools outside the known eight.
pub const NEUTRAL_SCHOOL_COLOR: &str = "aaaaaa";

// ────────────────────────────────────────────────────────────────────────────
// School
// ────────────────────────────────────────────────────────────────────────────

/// The eight schools of magic. Each one owns a fixed accent color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum School {
    Abjuration,
    Conjuration,
    Divination,
    Enchantment,
    Evocation,
    Illusion,
    Necromancy,
    Transmutation,
}

impl School {
    pub const ALL: [School; 8] = [
        School::Abjuration,
        School::Conjuration,
        School::Divination,
        School::Enchantment,
        School::Evocation,
        School::Illusion,
        School::Necromancy,
        School::Transmutation,
    ];

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Option<School> {
        let wanted = name.trim();
        School::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(wanted))
    }

    pub fn name(self) -> &'static str {
        match self {
            School::Abjuration => "Abjuration",
            School::Conjuration => "Conjuration",
            School::Divination => "Divination",
            School::Enchantment => "Enchantment",
            School::Evocation => "Evocation",
            School::Illusion => "Illusion",
            School::Necromancy => "Necromancy",
            School::Transmutation => "Transmutation",
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            School::Abjuration => "00b0f0",
            School::Conjuration => "ed7d31",
            School::Divination => "808080",
            School::Enchantment => "ff85ff",
            School::Evocation => "c00000",
            School::Illusion => "7030a0",
            School::Necromancy => "00b050",
            School::Transmutation => "833c0b",
        }
    }

    pub fn color(self) -> HexColor {
        HexColor::from_static(self.hex())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Class applicability
// ────────────────────────────────────────────────────────────────────────────

/// How a class may use a spell. Absence from the map means "not applicable".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Applicability {
    Yes,
    Optional,
}

impl Applicability {
    /// Interprets a class column cell. Blank, `No` and `nan` mean not applicable;
    /// any other non-blank value other than `Optional` counts as `Yes`.
    pub fn from_cell(raw: &str) -> Option<Applicability> {
        let value = raw.trim();
        if value.is_empty()
            || value.eq_ignore_ascii_case("no")
            || value.eq_ignore_ascii_case("nan")
        {
            None
        } else if value.eq_ignore_ascii_case("optional") {
            Some(Applicability::Optional)
        } else {
            Some(Applicability::Yes)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Item
// ────────────────────────────────────────────────────────────────────────────

/// Casting requirements shown as marker icons on the primary page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    pub concentration: bool,
    pub ritual: bool,
    pub verbal: bool,
    pub somatic: bool,
    pub material: bool,
}

impl Requirements {
    /// Flags in template marker order: concentration, ritual, verbal, somatic, material.
    pub fn in_order(&self) -> [bool; 5] {
        [
            self.concentration,
            self.ritual,
            self.verbal,
            self.somatic,
            self.material,
        ]
    }
}

/// One spell card's validated source data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub level: u8,
    /// `None` when the school column held an unrecognised name.
    pub school: Option<School>,
    pub school_name: String,
    pub range: String,
    pub duration: String,
    pub casting_time: String,
    pub requirements: Requirements,
    pub has_tables: bool,
    pub classes: BTreeMap<String, Applicability>,
    /// Raw, markup-tagged description paragraphs in reading order.
    pub description: Vec<String>,
    pub material_component: Option<String>,
    pub blurb: Option<String>,
    pub source: Option<String>,
    /// Value of the "Generate Card" column, used when no CLI filter is given.
    pub generate: bool,
}

impl Item {
    /// Name with path-unsafe characters replaced, used for output files and table lookup.
    pub fn file_stem(&self) -> String {
        sanitize_file_stem(&self.name)
    }

    pub fn color(&self) -> HexColor {
        self.school
            .map(School::color)
            .unwrap_or_else(|| HexColor::from_static(NEUTRAL_SCHOOL_COLOR))
    }

    pub fn applicability(&self, class_name: &str) -> Option<Applicability> {
        self.classes.get(class_name).copied()
    }

    /// `<root>/level_<N>/<stem>.<extension>`
    pub fn output_path(&self, root: &Path, extension: &str) -> PathBuf {
        root.join(format!("level_{}", self.level))
            .join(format!("{}.{}", self.file_stem(), extension))
    }
}

/// Replaces characters that cannot appear in a file name on common platforms.
pub fn sanitize_file_stem(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
