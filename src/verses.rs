use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::shapes::Chapter;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRecord {
    pub book: u8,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
}

/// Collapse whitespace runs (newlines and tabs included) to one space and trim.
pub fn normalize_text(text: &str) -> String {
    WS_RE.replace_all(text, " ").trim().to_string()
}

/// Number chapters and verses by position, 1-based.
pub fn flatten(book: u8, chapters: &[Chapter]) -> Vec<VerseRecord> {
    let mut out = Vec::with_capacity(chapters.iter().map(Vec::len).sum());
    for (ci, chapter) in chapters.iter().enumerate() {
        for (vi, text) in chapter.iter().enumerate() {
            out.push(VerseRecord {
                book,
                chapter: ci as u32 + 1,
                verse: vi as u32 + 1,
                text: normalize_text(text),
            });
        }
    }
    out
}
