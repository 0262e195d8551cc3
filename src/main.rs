use clap::{Parser, Subcommand};
use featured_thumb::activity_log::{ActivityLog, LogSink};
use featured_thumb::config::{self, DEFAULT_CONFIG_FILE};
use featured_thumb::generator::Generator;
use featured_thumb::output::{self, BulkSummary};
use featured_thumb::store::DirectoryStore;
use std::path::PathBuf;
use std::process::ExitCode;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "featured-thumb")]
#[command(about = "Automatic featured images for blog posts")]
#[command(long_about = "\
Automatic featured images for blog posts

Searches an image provider for the post title, downloads the first candidate
that works, and optionally crops it, desaturates it, darkens it with the title
written on top, and frames it. When nothing usable turns up, a flat-color card
with the title is drawn instead.

Pipeline:
  title → search → blacklist / size filter / ranking
        → HEAD + download each candidate until one succeeds
        → crop → grayscale → overlay + title → frame → JPEG
        → (nothing worked) fallback card

Every decision is written to the activity log (newest first, 100 entries).
Set RUST_LOG=info to also see it on stderr. The exit status is 1 when any
item ends in FAILURE.

Run 'featured-thumb gen-config' to generate a documented config file.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a featured image for one title
    Generate {
        /// Post title, also the search term
        #[arg(long)]
        title: String,
        /// Output directory (overrides output.dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Replace an existing image for this title
        #[arg(long)]
        force: bool,
    },
    /// Generate featured images for every title in a file, one per line
    Bulk {
        titles: PathBuf,
        /// Output directory (overrides output.dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Replace existing images
        #[arg(long)]
        force: bool,
    },
    /// Show the activity log
    Log {
        /// Empty the log instead of printing it
        #[arg(long)]
        clear: bool,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let mut status = ExitCode::SUCCESS;

    match cli.command {
        Command::Generate {
            title,
            out_dir,
            force,
        } => {
            let mut config = config::load_config(&cli.config)?;
            if let Some(dir) = out_dir {
                config.output.dir = dir;
            }
            let mut log = ActivityLog::load(&config.log_path())?;
            let mut store = DirectoryStore::new(&config.output.dir);
            let generator = Generator::from_config(config)?;

            let outcome = generate_one(&generator, &title, force, &mut store, &mut log);
            log.save()?;
            if let Some(outcome) = outcome {
                output::print_outcome(&title, &outcome);
                if outcome.is_failure() {
                    status = ExitCode::FAILURE;
                }
            }
        }
        Command::Bulk {
            titles,
            out_dir,
            force,
        } => {
            let mut config = config::load_config(&cli.config)?;
            if let Some(dir) = out_dir {
                config.output.dir = dir;
            }
            let content = std::fs::read_to_string(&titles)?;
            let mut log = ActivityLog::load(&config.log_path())?;
            let mut store = DirectoryStore::new(&config.output.dir);
            let generator = Generator::from_config(config)?;

            let mut summary = BulkSummary::default();
            for title in content.lines().map(str::trim).filter(|t| !t.is_empty()) {
                if let Some(outcome) = generate_one(&generator, title, force, &mut store, &mut log)
                {
                    output::print_outcome(title, &outcome);
                    summary.record(&outcome);
                }
                // Persist after every item so an interrupted run keeps its trail
                log.save()?;
            }
            output::print_bulk_summary(&summary);
            if summary.has_failures() {
                status = ExitCode::FAILURE;
            }
        }
        Command::Log { clear } => {
            let config = config::load_config(&cli.config)?;
            let mut log = ActivityLog::load(&config.log_path())?;
            if clear {
                log.clear();
                log.save()?;
                println!("Activity log cleared.");
            } else {
                output::print_log(log.entries());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(status)
}

/// Run one title unless it already has an image. `None` when skipped.
fn generate_one(
    generator: &Generator,
    title: &str,
    force: bool,
    store: &mut DirectoryStore,
    log: &mut ActivityLog,
) -> Option<featured_thumb::generator::Outcome> {
    if !force && let Some(existing) = store.existing(title) {
        log.info(&format!(
            "Aborted: '{title}' already has a featured image ({}).",
            existing.display()
        ));
        println!("{title}\n    skipped, already has {}", existing.display());
        return None;
    }
    Some(generator.run(title, store, log))
}
