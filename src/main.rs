use clap::{Parser, Subcommand};
use image_presets::imaging::RustBackend;
use image_presets::ledger::ModificationLedger;
use image_presets::{config, output, process, scan};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "image-presets")]
#[command(about = "Incremental derived images from named presets")]
#[command(long_about = "\
Incremental derived images from named presets

Each preset in config.toml names a source directory, a destination directory
and an ordered list of operations:

  [presets.thumbs]
  source = \"images\"               # below the site root
  destination = \"generated/thumbs\" # below the output root
  resize = \"300x300\"
  quality = 85

Every png/jpg/jpeg/gif under the source directory is run through the pipeline
and written to the same relative path under the destination. Results are
cached in <site>/.cache/, and an image is only re-processed when its source
is newer than the cached copy. Output goes to <site>/_site unless --output
is given.

Run 'image-presets gen-config' to print a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Site root (contains config.toml and the preset source directories)
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Output root the destination directories are created under
    /// [default: <source>/_site]
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Config file [default: <source>/config.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn output_root(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.source.join(DEFAULT_OUTPUT_DIR))
    }
}

/// Output directory name inside the site root when `--output` is not given.
const DEFAULT_OUTPUT_DIR: &str = "_site";

#[derive(Subcommand)]
enum Command {
    /// List the images each preset would produce
    Scan {
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Produce every derived image, reusing cached results
    Build,
    /// Validate the config and source directories without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let output_root = cli.output_root();

    match cli.command {
        Command::Scan { json } => {
            let site_config = load(&cli.source, cli.config.as_deref())?;
            let assets = scan::scan(&site_config, &cli.source);
            if json {
                let plan = output::planned_assets(&assets);
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                output::print_scan_output(&assets);
            }
        }
        Command::Build => {
            let site_config = load(&cli.source, cli.config.as_deref())?;

            println!("==> Scanning {}", cli.source.display());
            let assets = scan::scan(&site_config, &cli.source);
            println!("{} image(s) across {} preset(s)", assets.len(), site_config.presets.len());

            println!("==> Writing to {}", output_root.display());
            init_thread_pool(&site_config.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::process(
                &assets,
                &output_root,
                &ModificationLedger::new(),
                &RustBackend::new(),
                Some(tx),
            );
            printer.join().map_err(|_| "output thread panicked")?;
            println!("Cache: {}", result.stats);

            if !result.is_success() {
                output::print_failures(&result.failures);
                return Err(format!("{} asset(s) failed", result.failures.len()).into());
            }
            println!("==> Build complete: {}", output_root.display());
        }
        Command::Check => {
            let site_config = load(&cli.source, cli.config.as_deref())?;
            println!("==> Checking {}", cli.source.display());
            output::print_config_summary(&site_config);
            let assets = scan::scan(&site_config, &cli.source);
            println!("{} image(s) found", assets.len());
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load(
    site_root: &Path,
    explicit: Option<&Path>,
) -> Result<config::SiteConfig, config::ConfigError> {
    let path = explicit.map_or_else(|| config::config_path(site_root), Path::to_path_buf);
    config::load_config(&path)
}

/// Log to stderr so progress lines on stdout stay clean.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_defaults_inside_site_root() {
        let cli = Cli::try_parse_from(["image-presets", "--source", "site", "build"]).unwrap();
        assert_eq!(cli.output_root(), PathBuf::from("site/_site"));
    }

    #[test]
    fn explicit_output_is_used_as_given() {
        let cli = Cli::try_parse_from([
            "image-presets",
            "--source",
            "site",
            "--output",
            "public",
            "build",
        ])
        .unwrap();
        assert_eq!(cli.output_root(), PathBuf::from("public"));
    }

    #[test]
    fn current_directory_is_the_default_site() {
        let cli = Cli::try_parse_from(["image-presets", "check"]).unwrap();
        assert_eq!(cli.output_root(), PathBuf::from("./_site"));
    }
}
