pub mod docx;

use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::document::PageDocument;
use crate::errors::CardError;

/// File format cards are written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Office Open XML word-processing document.
    #[default]
    Docx,
    /// The page model as pretty-printed JSON.
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Json => "json",
        }
    }
}

/// Writes `doc` to `path`, creating parent directories as needed.
pub fn write_document(
    doc: &PageDocument,
    format: OutputFormat,
    path: &Path,
) -> Result<(), CardError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    match format {
        OutputFormat::Docx => docx::write_docx(doc, path),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(doc)?;
            std::fs::write(path, json)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CardTemplate;

    #[test]
    fn test_json_output_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level_2").join("Shatter.json");
        let doc = CardTemplate::built_in().unwrap().instantiate("Shatter");

        write_document(&doc, OutputFormat::Json, &path).unwrap();

        let back: PageDocument =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_docx_output_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("level_0").join("Light.docx");
        let doc = CardTemplate::built_in().unwrap().instantiate("Light");
        write_document(&doc, OutputFormat::Docx, &path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_extensions() {
        assert_eq!(OutputFormat::Docx.extension(), "docx");
        assert_eq!(OutputFormat::Json.extension(), "json");
    }
}
