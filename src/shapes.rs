use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Verse texts of one chapter; position is the verse number.
pub type Chapter = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `{"1": [...], "2": {"1": "..."}}`
    ChapterMap,
    /// `{"chapters": [{"verses": [...]}, ...]}`
    ChaptersArray,
    /// `[[...], [...]]`
    NestedList,
}

impl Shape {
    pub fn name(self) -> &'static str {
        match self {
            Shape::ChapterMap => "chapter-map",
            Shape::ChaptersArray => "chapters-array",
            Shape::NestedList => "nested-list",
        }
    }
}

#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("Unrecognized structure in {}", path.display())]
    Unrecognized { path: PathBuf },
    #[error("Non-numeric verse key {key:?} in {}", path.display())]
    VerseKey { path: PathBuf, key: String },
}

type Predicate = fn(&Value) -> bool;
type Parser = fn(&Value, &Path) -> Result<Vec<Chapter>, ShapeError>;

/// Tried in order, first match wins.
const SHAPES: [(Shape, Predicate); 3] = [
    (Shape::ChapterMap, is_chapter_map),
    (Shape::ChaptersArray, is_chapters_array),
    (Shape::NestedList, is_nested_list),
];

impl Shape {
    fn parser(self) -> Parser {
        match self {
            Shape::ChapterMap => parse_chapter_map,
            Shape::ChaptersArray => parse_chapters_array,
            Shape::NestedList => parse_nested_list,
        }
    }
}

pub fn detect_shape(value: &Value) -> Option<Shape> {
    SHAPES
        .iter()
        .find(|(_, matches)| matches(value))
        .map(|(shape, _)| *shape)
}

pub fn parse_chapters(value: &Value, path: &Path) -> Result<Vec<Chapter>, ShapeError> {
    let shape = detect_shape(value).ok_or_else(|| ShapeError::Unrecognized {
        path: path.to_path_buf(),
    })?;
    debug!(path = %path.display(), shape = shape.name(), "shape detected");
    shape.parser()(value, path)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Numeric sort key. Digit strings too long for u64 sort after everything else.
fn numeric_key(s: &str) -> (u64, usize) {
    match s.parse::<u64>() {
        Ok(n) => (n, 0),
        Err(_) => (u64::MAX, s.len()),
    }
}

/// Stringify a verse value using its JSON text (`42`, `true`); strings pass
/// through unquoted and `null` becomes empty.
pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn coerce_all(values: &[Value]) -> Chapter {
    values.iter().map(coerce_text).collect()
}

fn is_chapter_map(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.keys().all(|k| is_digits(k)))
}

fn parse_chapter_map(value: &Value, path: &Path) -> Result<Vec<Chapter>, ShapeError> {
    let Value::Object(map) = value else {
        return Err(ShapeError::Unrecognized { path: path.to_path_buf() });
    };
    let mut chapters = Vec::with_capacity(map.len());
    for (_, chapter) in map.iter().sorted_by_key(|(k, _)| numeric_key(k)) {
        match chapter {
            Value::Array(verses) => chapters.push(coerce_all(verses)),
            Value::Object(verses) => chapters.push(parse_verse_map(verses, path)?),
            _ => {}
        }
    }
    Ok(chapters)
}

fn parse_verse_map(verses: &Map<String, Value>, path: &Path) -> Result<Chapter, ShapeError> {
    if let Some(bad) = verses.keys().find(|k| !is_digits(k)) {
        return Err(ShapeError::VerseKey {
            path: path.to_path_buf(),
            key: bad.clone(),
        });
    }
    Ok(verses
        .iter()
        .sorted_by_key(|(k, _)| numeric_key(k))
        .map(|(_, v)| coerce_text(v))
        .collect())
}

fn is_chapters_array(value: &Value) -> bool {
    matches!(value.get("chapters"), Some(Value::Array(_)))
}

fn parse_chapters_array(value: &Value, _path: &Path) -> Result<Vec<Chapter>, ShapeError> {
    let Some(Value::Array(items)) = value.get("chapters") else {
        return Ok(Vec::new());
    };
    let chapters = items
        .iter()
        .filter_map(|item| match item {
            Value::Object(_) => match item.get("verses") {
                Some(Value::Array(verses)) => Some(
                    verses
                        .iter()
                        .map(|v| match v {
                            Value::Object(_) => v.get("text").map(coerce_text).unwrap_or_default(),
                            other => coerce_text(other),
                        })
                        .collect(),
                ),
                _ => None,
            },
            Value::Array(verses) => Some(coerce_all(verses)),
            _ => None,
        })
        .collect();
    Ok(chapters)
}

fn is_nested_list(value: &Value) -> bool {
    matches!(value, Value::Array(items) if items.iter().all(Value::is_array))
}

fn parse_nested_list(value: &Value, _path: &Path) -> Result<Vec<Chapter>, ShapeError> {
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .filter_map(Value::as_array)
        .map(|verses| coerce_all(verses))
        .collect())
}
