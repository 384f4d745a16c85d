use std::collections::HashMap;
use std::sync::LazyLock;

use thiserror::Error;

/// Canonical book keys in canon order; the id is the 1-based position.
pub const BOOKS: [&str; 66] = [
    "Genesis", "Exodus", "Leviticus", "Numbers", "Deuteronomy", "Joshua", "Judges", "Ruth",
    "1Samuel", "2Samuel", "1Kings", "2Kings", "1Chronicles", "2Chronicles", "Ezra", "Nehemiah",
    "Esther", "Job", "Psalms", "Proverbs", "Ecclesiastes", "SongofSolomon", "Isaiah", "Jeremiah",
    "Lamentations", "Ezekiel", "Daniel", "Hosea", "Joel", "Amos", "Obadiah", "Jonah", "Micah",
    "Nahum", "Habakkuk", "Zephaniah", "Haggai", "Zechariah", "Malachi", "Matthew", "Mark", "Luke",
    "John", "Acts", "Romans", "1Corinthians", "2Corinthians", "Galatians", "Ephesians", "Philippians",
    "Colossians", "1Thessalonians", "2Thessalonians", "1Timothy", "2Timothy", "Titus", "Philemon",
    "Hebrews", "James", "1Peter", "2Peter", "1John", "2John", "3John", "Jude", "Revelation",
];

/// Filename spellings seen in the wild. Only these resolve; nothing is guessed.
const ALIASES: &[(&str, &str)] = &[
    ("SongofSongs", "SongofSolomon"), ("Canticles", "SongofSolomon"),
    ("Psalms", "Psalms"), ("Psalm", "Psalms"),
    ("1Samuel", "1Samuel"), ("1_Samuel", "1Samuel"), ("1 Samuel", "1Samuel"),
    ("2Samuel", "2Samuel"), ("2_Samuel", "2Samuel"), ("2 Samuel", "2Samuel"),
    ("1Kings", "1Kings"), ("1_Kings", "1Kings"), ("1 Kings", "1Kings"),
    ("2Kings", "2Kings"), ("2_Kings", "2Kings"), ("2 Kings", "2Kings"),
    ("1Chronicles", "1Chronicles"), ("1_Chronicles", "1Chronicles"), ("1 Chronicles", "1Chronicles"),
    ("2Chronicles", "2Chronicles"), ("2_Chronicles", "2Chronicles"), ("2 Chronicles", "2Chronicles"),
    ("1Corinthians", "1Corinthians"), ("1_Corinthians", "1Corinthians"), ("1 Corinthians", "1Corinthians"),
    ("2Corinthians", "2Corinthians"), ("2_Corinthians", "2Corinthians"), ("2 Corinthians", "2Corinthians"),
    ("1Thessalonians", "1Thessalonians"), ("1_Thessalonians", "1Thessalonians"), ("1 Thessalonians", "1Thessalonians"),
    ("2Thessalonians", "2Thessalonians"), ("2_Thessalonians", "2Thessalonians"), ("2 Thessalonians", "2Thessalonians"),
    ("1Timothy", "1Timothy"), ("1_Timothy", "1Timothy"), ("1 Timothy", "1Timothy"),
    ("2Timothy", "2Timothy"), ("2_Timothy", "2Timothy"), ("2 Timothy", "2Timothy"),
    ("1Peter", "1Peter"), ("1_Peter", "1Peter"), ("1 Peter", "1Peter"),
    ("2Peter", "2Peter"), ("2_Peter", "2Peter"), ("2 Peter", "2Peter"),
    ("1John", "1John"), ("1_John", "1John"), ("1 John", "1John"),
    ("2John", "2John"), ("2_John", "2John"), ("2 John", "2John"),
    ("3John", "3John"), ("3_John", "3John"), ("3 John", "3John"),
];

static BOOK_IDS: LazyLock<HashMap<&'static str, u8>> = LazyLock::new(|| {
    BOOKS
        .iter()
        .enumerate()
        .map(|(i, key)| (*key, i as u8 + 1))
        .collect()
});

// Alias canon forms are computed once; the table order is kept so the first
// listed alias wins if two ever collapse to the same form.
static ALIAS_CANON: LazyLock<Vec<(String, &'static str)>> = LazyLock::new(|| {
    ALIASES
        .iter()
        .map(|(alias, target)| (canon(alias), *target))
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Book {
    pub id: u8,
    pub key: &'static str,
}

#[derive(Debug, Error)]
pub enum BookError {
    #[error("alias {alias:?} targets unknown book key {target:?}")]
    UnknownTarget { alias: String, target: String },
}

/// Drop a `.json` suffix and strip hyphens, underscores and spaces. Case is kept.
pub fn canon(stem: &str) -> String {
    let s = stem.strip_suffix(".json").unwrap_or(stem);
    s.chars().filter(|c| !matches!(c, '-' | '_' | ' ')).collect()
}

pub fn book_id(key: &str) -> Option<u8> {
    BOOK_IDS.get(key).copied()
}

/// Look up the interned key so callers get a `&'static str`.
fn static_key(key: &str) -> Option<&'static str> {
    book_id(key).map(|id| BOOKS[id as usize - 1])
}

/// Resolve a filename stem against the built-in tables only.
pub fn canonical_key(stem: &str) -> Option<&'static str> {
    let c = canon(stem);
    if let Some(key) = static_key(&c) {
        return Some(key);
    }
    ALIAS_CANON
        .iter()
        .find(|(alias, _)| *alias == c)
        .map(|(_, target)| *target)
}

/// Built-in tables plus aliases supplied through configuration.
#[derive(Debug, Default)]
pub struct BookResolver {
    extra: Vec<(String, &'static str)>,
}

impl BookResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aliases<'a, I>(aliases: I) -> Result<Self, BookError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut extra = Vec::new();
        for (alias, target) in aliases {
            let key = static_key(target).ok_or_else(|| BookError::UnknownTarget {
                alias: alias.to_string(),
                target: target.to_string(),
            })?;
            extra.push((canon(alias), key));
        }
        Ok(BookResolver { extra })
    }

    pub fn extra_len(&self) -> usize {
        self.extra.len()
    }

    pub fn resolve(&self, stem: &str) -> Option<Book> {
        let key = canonical_key(stem).or_else(|| {
            let c = canon(stem);
            self.extra.iter().find(|(alias, _)| *alias == c).map(|(_, k)| *k)
        })?;
        book_id(key).map(|id| Book { id, key })
    }
}
