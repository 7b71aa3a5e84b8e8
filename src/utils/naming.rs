// src/utils/naming.rs

//! Turns titles and author names into filesystem path segments.
//!
//! ASCII letters and digits are kept and lowercased. Every other character is
//! part of a separator run: a run containing whitespace, or made only of
//! hyphens, becomes one `-`; a run of pure punctuation is dropped so that
//! `Don't` reads `dont` rather than `don-t`.

use crate::error::{AppError, Result};

/// Normalize `text` into a lowercase `[a-z0-9-]` name.
pub fn normalize_name(text: &str) -> Result<String> {
    let mut name = String::with_capacity(text.len());
    let mut run = Separator::None;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if run.is_hyphen() && !name.is_empty() {
                name.push('-');
            }
            run = Separator::None;
            name.push(ch.to_ascii_lowercase());
        } else {
            run = run.extend(ch);
        }
    }

    if name.is_empty() {
        return Err(AppError::InvalidName(text.to_string()));
    }
    Ok(name)
}

/// State of the non-alphanumeric run currently being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Separator {
    None,
    /// Only hyphens so far
    Hyphens,
    /// Contains whitespace
    Space,
    /// Punctuation without whitespace
    Punct,
}

impl Separator {
    fn extend(self, ch: char) -> Self {
        match (self, ch) {
            (_, c) if c.is_whitespace() => Separator::Space,
            (Separator::Space, _) => Separator::Space,
            (Separator::None | Separator::Hyphens, '-') => Separator::Hyphens,
            _ => Separator::Punct,
        }
    }

    fn is_hyphen(self) -> bool {
        matches!(self, Separator::Hyphens | Separator::Space)
    }
}
