//! Inline markup tokenizer.
//!
//! Splits a description block into an explicit token stream so that run construction
//! never has to pattern-match raw tag text. Only the handful of tags that carry meaning
//! on a card are distinguished; every other tag becomes [`Token::Ignored`].

/// One lexical unit of a description block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    BoldOpen,
    BoldClose,
    ItalicOpen,
    ItalicClose,
    ListItem,
    LineBreak,
    /// A tag with no card meaning (`<p>`, `<ul>`, `</li>`, `<span ...>`, comments).
    Ignored,
}

/// Tokenizes `raw`. A `<` that does not open a tag is kept as text.
pub fn tokenize(raw: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while let Some(offset) = raw[pos..].find('<') {
        let lt = pos + offset;
        let Some(gt) = tag_end(raw, lt) else {
            pos = lt + 1;
            continue;
        };
        if lt > text_start {
            tokens.push(Token::Text(&raw[text_start..lt]));
        }
        tokens.push(classify(&raw[lt + 1..gt]));
        pos = gt + 1;
        text_start = pos;
    }
    if text_start < raw.len() {
        tokens.push(Token::Text(&raw[text_start..]));
    }
    tokens
}

/// Byte index of the `>` closing a tag opened at `lt`, if `lt` really opens one.
fn tag_end(raw: &str, lt: usize) -> Option<usize> {
    let next = raw[lt + 1..].chars().next()?;
    if !(next.is_ascii_alphabetic() || next == '/' || next == '!') {
        return None;
    }
    let close = raw[lt + 1..].find('>')?;
    let end = lt + 1 + close;
    // "a < b" style text never contains another '<' before the '>' of a real tag.
    if raw[lt + 1..end].contains('<') {
        return None;
    }
    Some(end)
}

fn classify(body: &str) -> Token<'static> {
    let body = body.trim();
    let (closing, rest) = match body.strip_prefix('/') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, body),
    };
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    match (name.as_str(), closing) {
        ("b" | "strong", false) => Token::BoldOpen,
        ("b" | "strong", true) => Token::BoldClose,
        ("i" | "em", false) => Token::ItalicOpen,
        ("i" | "em", true) => Token::ItalicClose,
        ("li", false) => Token::ListItem,
        ("br", _) => Token::LineBreak,
        _ => Token::Ignored,
    }
}
