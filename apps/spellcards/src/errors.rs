use thiserror::Error;

/// Card-generation error type.
///
/// Per-item variants (`MissingField`, `InvalidField`, `TableImport`) are caught by the
/// batch driver and reported; `Template` and `Layout` indicate broken configuration.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("Missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("Invalid value for '{field}': {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Layout configuration error: {0}")]
    Layout(String),

    #[error("Table import failed for {source_name}: {message}")]
    TableImport {
        source_name: String,
        message: String,
    },

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl CardError {
    /// True for errors that stem from configuration rather than from one item's data.
    ///
    /// The batch driver aborts on these instead of moving on to the next item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CardError::Template(_) | CardError::Layout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message_names_column() {
        let err = CardError::MissingField { field: "Spell Name" };
        assert_eq!(err.to_string(), "Missing required field 'Spell Name'");
    }

    #[test]
    fn test_configuration_errors_are_fatal() {
        assert!(CardError::Template("no primary page".into()).is_fatal());
        assert!(CardError::Layout("no candidates".into()).is_fatal());
        assert!(!CardError::MissingField { field: "Level" }.is_fatal());
        assert!(!CardError::TableImport {
            source_name: "x.html".into(),
            message: "bad".into()
        }
        .is_fatal());
    }
}
