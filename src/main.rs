mod books;
mod corpus;
mod settings;
mod shapes;
mod verses;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use books::BookResolver;
use settings::OnError;

#[derive(Parser)]
#[command(
    name = "kjv_compact",
    about = "Flatten per-book scripture JSON files into one verse list"
)]
struct Cli {
    /// Directory searched recursively for <Book>.json files
    src_dir: PathBuf,
    /// Output JSON file
    out_file: PathBuf,
    /// Settings file (toml, json or yaml); defaults to ./kjv_compact.* when present
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// What to do with malformed or unrecognized book files
    #[arg(long, value_enum)]
    on_error: Option<OnError>,
    /// Indent the output JSON
    #[arg(long)]
    pretty: bool,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = settings::load(cli.config.as_deref())?;
    if let Some(on_error) = cli.on_error {
        settings.on_error = on_error;
    }
    settings.pretty |= cli.pretty;
    info!(settings = ?settings, "Starting build");

    let resolver = if settings.aliases.is_empty() {
        BookResolver::new()
    } else {
        let r = BookResolver::with_aliases(
            settings
                .aliases
                .iter()
                .map(|a| (a.from.as_str(), a.to.as_str())),
        )?;
        info!("Loaded {} configured aliases", r.extra_len());
        r
    };

    let report = corpus::build(&cli.src_dir, &resolver, settings.on_error)?;
    corpus::write_output(&cli.out_file, &report.verses, settings.pretty)?;
    report.print_summary(&cli.out_file, settings.skipped_sample);

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }
    Ok(())
}
