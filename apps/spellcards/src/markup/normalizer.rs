//! Markup Normalizer: turns one tagged description block into styled runs.
//!
//! Bold and italic spans are tracked with depth counters: a run is bold while at least
//! one bold span is open, nested spans simply deepen the count, a stray closing tag is
//! ignored and an unclosed opening tag stays in effect until the end of the block.

use serde::{Deserialize, Serialize};

use crate::markup::entities::decode_entities;
use crate::markup::tokenizer::{tokenize, Token};

/// Prefix emitted for every list item.
pub const BULLET: &str = "\u{2022} ";

/// A contiguous piece of text sharing one emphasis style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl StyledRun {
    pub fn new(text: impl Into<String>, bold: bool, italic: bool) -> Self {
        StyledRun {
            text: text.into(),
            bold,
            italic,
        }
    }

    #[cfg(test)]
    pub fn plain(text: impl Into<String>) -> Self {
        StyledRun::new(text, false, false)
    }

    #[cfg(test)]
    pub fn bold(text: impl Into<String>) -> Self {
        StyledRun::new(text, true, false)
    }
}

/// Accumulates text, merging pieces that share a style.
#[derive(Debug, Default)]
pub(crate) struct RunBuilder {
    runs: Vec<StyledRun>,
}

impl RunBuilder {
    pub(crate) fn push(&mut self, text: &str, bold: bool, italic: bool) {
        if text.is_empty() {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.bold == bold && last.italic == italic => last.text.push_str(text),
            _ => self.runs.push(StyledRun::new(text, bold, italic)),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub(crate) fn finish(self) -> Vec<StyledRun> {
        self.runs
    }
}

/// Normalizes a raw description block into ordered styled runs.
pub fn normalize(raw: &str) -> Vec<StyledRun> {
    let mut builder = RunBuilder::default();
    let mut bold_depth = 0usize;
    let mut italic_depth = 0usize;

    for token in tokenize(raw) {
        match token {
            Token::Text(text) => {
                builder.push(&decode_entities(text), bold_depth > 0, italic_depth > 0)
            }
            Token::BoldOpen => bold_depth += 1,
            Token::BoldClose => bold_depth = bold_depth.saturating_sub(1),
            Token::ItalicOpen => italic_depth += 1,
            Token::ItalicClose => italic_depth = italic_depth.saturating_sub(1),
            Token::ListItem => {
                if !builder.is_empty() {
                    builder.push("\n", false, false);
                }
                builder.push(BULLET, false, false);
            }
            Token::LineBreak => builder.push("\n", bold_depth > 0, italic_depth > 0),
            Token::Ignored => {}
        }
    }
    builder.finish()
}
