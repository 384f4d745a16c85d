use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::books::BookResolver;
use crate::settings::OnError;
use crate::shapes;
use crate::verses::{flatten, VerseRecord};

/// Outcome of one pass over a source directory.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Recognized files with their verse counts, in output order.
    pub recognized: Vec<(PathBuf, usize)>,
    /// Files whose name is not a known book.
    pub skipped: Vec<PathBuf>,
    /// Files dropped under `OnError::Skip`, with the reason.
    pub failed: Vec<(PathBuf, String)>,
    pub verses: Vec<VerseRecord>,
}

impl BuildReport {
    pub fn print_summary(&self, out: &Path, sample: usize) {
        println!("Recognized book files: {}", self.recognized.len());
        for (p, count) in &self.recognized {
            let name = p.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            println!("  ✓ {}: {} verses", name, count);
        }
        println!("Skipped (unrecognized): {}", self.skipped.len());
        for p in self.skipped.iter().take(sample) {
            println!("  – {}", p.display());
        }
        if self.skipped.len() > sample {
            println!("  … and {} more", self.skipped.len() - sample);
        }
        if !self.failed.is_empty() {
            println!("Failed: {}", self.failed.len());
            for (p, reason) in &self.failed {
                println!("  ✗ {}: {}", p.display(), reason);
            }
        }
        println!("\nWrote {} verses to {}", self.verses.len(), out.display());
    }
}

/// All `.json` files under `dir` at any depth, sorted by path.
/// Symlinked directories are not entered; symlinked files are kept.
/// Only `dir` itself must be readable, unreadable subdirectories are skipped.
pub fn scan(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;
    let mut files = Vec::new();
    walk(entries, dir, &mut files);
    files.sort();
    Ok(files)
}

fn walk(entries: fs::ReadDir, dir: &Path, files: &mut Vec<PathBuf>) {
    for entry in entries {
        let (path, ft) = match entry.and_then(|e| Ok((e.path(), e.file_type()?))) {
            Ok(found) => found,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        if ft.is_dir() {
            match fs::read_dir(&path) {
                Ok(sub) => walk(sub, &path, files),
                Err(e) => warn!("Skipping unreadable directory {}: {}", path.display(), e),
            }
        } else if is_json(&path) && (ft.is_file() || (ft.is_symlink() && path.is_file())) {
            files.push(path);
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Read, parse and flatten a single book file.
pub fn load_book(path: &Path, book: u8) -> Result<Vec<VerseRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Malformed JSON in {}", path.display()))?;
    let chapters = shapes::parse_chapters(&value, path)?;
    Ok(flatten(book, &chapters))
}

pub fn build(dir: &Path, resolver: &BookResolver, on_error: OnError) -> Result<BuildReport> {
    let files = scan(dir)?;
    info!("Found {} JSON files under {}", files.len(), dir.display());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {wide_msg}")?
            .progress_chars("=> "),
    );

    let mut report = BuildReport::default();
    for path in files {
        pb.inc(1);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(book) = resolver.resolve(&stem) else {
            debug!("Skipping unrecognized book file {}", path.display());
            report.skipped.push(path);
            continue;
        };
        pb.set_message(book.key);

        match load_book(&path, book.id) {
            Ok(records) => {
                debug!(book = book.key, verses = records.len(), "loaded {}", path.display());
                report.recognized.push((path, records.len()));
                report.verses.extend(records);
            }
            Err(e) if on_error == OnError::Skip => {
                warn!("Skipping {}: {:#}", path.display(), e);
                report.failed.push((path, format!("{:#}", e)));
            }
            Err(e) => {
                pb.abandon();
                return Err(e);
            }
        }
    }
    pb.finish_and_clear();

    info!(
        "{} books, {} verses, {} skipped, {} failed",
        report.recognized.len(),
        report.verses.len(),
        report.skipped.len(),
        report.failed.len()
    );
    Ok(report)
}

/// Write the verse list as one JSON array. Non-ASCII text is written as-is.
pub fn write_output(path: &Path, verses: &[VerseRecord], pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, verses)?;
    } else {
        serde_json::to_writer(&mut writer, verses)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeError;

    const FIXTURES: &str = "tests/fixtures/corpus";

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.strip_prefix(FIXTURES).unwrap().display().to_string())
            .collect()
    }

    #[test]
    fn scan_is_recursive_and_sorted() {
        let files = scan(Path::new(FIXTURES)).unwrap();
        assert_eq!(
            names(&files),
            vec![
                "NT/1_John.json",
                "NT/Frodo.json",
                "NT/Matthew.json",
                "OT/Genesis.json",
                "OT/Psalms.json",
                "OT/Song of Songs.json",
            ]
        );
    }

    #[test]
    fn scan_ignores_other_files() {
        let files = scan(Path::new(FIXTURES)).unwrap();
        for ignored in ["README.md", "OT/Genesis.txt", "NT/notes.json", "NT/notes.json/Jude.txt"] {
            assert!(Path::new(FIXTURES).join(ignored).exists(), "fixture {ignored} missing");
            assert!(!names(&files).contains(&ignored.to_string()), "{ignored} was scanned");
        }
    }

    #[cfg(unix)]
    #[test]
    fn scan_does_not_follow_directory_symlinks() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let ot = dir.path().join("OT");
        fs::create_dir(&ot).unwrap();
        fs::write(ot.join("Genesis.json"), r#"[["a"]]"#).unwrap();
        symlink(&ot, dir.path().join("alias")).unwrap();
        symlink(dir.path(), ot.join("loop")).unwrap();
        symlink(ot.join("Genesis.json"), dir.path().join("Exodus.json")).unwrap();

        let files = scan(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("Exodus.json"), ot.join("Genesis.json")]);

        let report = build(dir.path(), &BookResolver::new(), OnError::Abort).unwrap();
        let books: Vec<_> = report.verses.iter().map(|v| v.book).collect();
        assert_eq!(books, vec![2, 1]);
    }

    #[cfg(unix)]
    #[test]
    fn scan_skips_unreadable_subdirectory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("Ruth.json"), r#"[["a"]]"#).unwrap();
        fs::write(dir.path().join("Genesis.json"), r#"[["a"]]"#).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop a privileged user.
        let readable = fs::read_dir(&locked).is_ok();
        let files = scan(dir.path()).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if !readable {
            assert_eq!(files, vec![dir.path().join("Genesis.json")]);
        }
    }

    #[test]
    fn scan_missing_dir_names_path() {
        let err = scan(Path::new("tests/fixtures/nope")).unwrap_err();
        assert!(format!("{err:#}").contains("tests/fixtures/nope"));
    }

    #[test]
    fn builds_fixture_corpus() {
        let report = build(Path::new(FIXTURES), &BookResolver::new(), OnError::Abort).unwrap();
        assert_eq!(names(&report.skipped), vec!["NT/Frodo.json"]);
        assert!(report.failed.is_empty());

        let counts: Vec<_> = report
            .recognized
            .iter()
            .map(|(p, n)| (p.file_stem().unwrap().to_string_lossy().into_owned(), *n))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("1_John".to_string(), 3),
                ("Matthew".to_string(), 2),
                ("Genesis".to_string(), 4),
                ("Psalms".to_string(), 3),
                ("Song of Songs".to_string(), 2),
            ]
        );
        let total: usize = report.recognized.iter().map(|(_, n)| n).sum();
        assert_eq!(report.verses.len(), total);

        // Output follows path order, so 1 John (62) comes first.
        assert_eq!(report.verses[0].book, 62);
        let genesis: Vec<_> = report.verses.iter().filter(|v| v.book == 1).collect();
        assert_eq!(genesis[0].text, "In the beginning God created the heaven and the earth.");
        assert_eq!((genesis[3].chapter, genesis[3].verse), (2, 1));
        let psalms: Vec<_> = report.verses.iter().filter(|v| v.book == 19).collect();
        assert_eq!(
            psalms.iter().map(|v| v.chapter).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(psalms[2].text, "119");
    }

    #[test]
    fn shape_error_aborts_by_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Genesis.json"), r#"[["a"]]"#).unwrap();
        fs::write(dir.path().join("Ruth.json"), r#"{"title": "Ruth"}"#).unwrap();

        let err = build(dir.path(), &BookResolver::new(), OnError::Abort).unwrap_err();
        assert!(err.downcast_ref::<ShapeError>().is_some());
        assert!(err.to_string().contains("Ruth.json"));
    }

    #[test]
    fn skip_policy_records_failures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Genesis.json"), r#"[["a"]]"#).unwrap();
        fs::write(dir.path().join("Exodus.json"), "{ not json").unwrap();
        fs::write(dir.path().join("Ruth.json"), r#"{"title": "Ruth"}"#).unwrap();

        let report = build(dir.path(), &BookResolver::new(), OnError::Skip).unwrap();
        assert_eq!(report.verses.len(), 1);
        assert_eq!(report.failed.len(), 2);
        assert!(report.failed[0].1.contains("Malformed JSON"));
        assert!(report.failed[0].1.contains("Exodus.json"));
        assert!(report.failed[1].1.contains("Unrecognized structure"));
    }

    #[test]
    fn malformed_json_aborts_with_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Exodus.json"), "[[\"a\"]").unwrap();
        let err = build(dir.path(), &BookResolver::new(), OnError::Abort).unwrap_err();
        assert!(err.to_string().contains("Exodus.json"));
    }

    #[test]
    fn writes_compact_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out/kjv.json");
        let verses = vec![VerseRecord { book: 43, chapter: 1, verse: 1, text: "Ἐν ἀρχῇ ἦν ὁ λόγος".into() }];
        write_output(&out, &verses, false).unwrap();

        let written = fs::read_to_string(&out).unwrap();
        assert_eq!(
            written,
            r#"[{"book":43,"chapter":1,"verse":1,"text":"Ἐν ἀρχῇ ἦν ὁ λόγος"}]"#
        );
        let back: Vec<VerseRecord> = serde_json::from_str(&written).unwrap();
        assert_eq!(back, verses);
    }

    #[test]
    fn writes_pretty_on_request() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("kjv.json");
        write_output(&out, &[], true).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "[]");
    }
}
