use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// What to do with a file whose JSON is malformed or has no known shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Stop the run and report the offending file.
    Abort,
    /// Log the file, record it in the summary and continue.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AliasEntry {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub on_error: OnError,
    pub skipped_sample: usize,
    pub pretty: bool,
    pub aliases: Vec<AliasEntry>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            on_error: OnError::Abort,
            skipped_sample: 10,
            pretty: false,
            aliases: Vec::new(),
        }
    }
}

const DEFAULT_FILE: &str = "kjv_compact";

/// Layered: defaults, then a config file, then `KJV_*` environment variables.
/// An explicit `file` must exist; the default `kjv_compact.*` is optional.
pub fn load(file: Option<&Path>) -> Result<Settings> {
    let source = match file {
        Some(p) => File::from(p).required(true),
        None => File::with_name(DEFAULT_FILE).required(false),
    };
    let settings = Config::builder()
        .add_source(source)
        .add_source(Environment::with_prefix("KJV").try_parsing(true))
        .build()
        .with_context(|| match file {
            Some(p) => format!("Failed to load config {}", p.display()),
            None => "Failed to load config".to_string(),
        })?
        .try_deserialize::<Settings>()
        .context("Invalid configuration")?;
    Ok(settings)
}
