use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use stylova_core::catalog::StyleCatalog;
use stylova_core::config::{
    config_path, data_dir, initialize_data_dir, resolve_relative_to, AppConfig,
};
use stylova_core::logging::{self, FileSinkPlan, LoggingInitOptions, DEFAULT_LOG_FILTER};
use stylova_core::remote::FilterClient;
use stylova_core::styler::Styler;

#[derive(Parser)]
#[command(name = "stylova", about = "Neural style transfer for photos")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help = "Increase log verbosity (-v: debug, -vv: trace)"
    )]
    verbose: u8,

    #[arg(
        long = "log-filter",
        value_name = "FILTER",
        global = true,
        help = "Explicit tracing filter (overrides RUST_LOG and -v)"
    )]
    log_filter: Option<String>,

    #[arg(long, global = true, help = "Data directory (models, outputs, logs)")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply an on-device style model to a photo
    Apply(ApplyArgs),
    /// List catalog styles and their download status
    Styles(StylesArgs),
    /// Pre-download a style model artifact
    Fetch(FetchArgs),
    /// Run a server-side filter on a photo
    Filter(FilterArgs),
}

#[derive(Args)]
struct ApplyArgs {
    #[arg(help = "Path to the source photo")]
    image: PathBuf,
    #[arg(short, long, help = "Style id or display name (see `stylova styles`)")]
    style: String,
    #[arg(short, long, help = "Output path (defaults into the outputs directory)")]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct StylesArgs {
    #[arg(long, help = "Emit the catalog as JSON")]
    json: bool,
}

#[derive(Args)]
struct FetchArgs {
    #[arg(help = "Style id or display name")]
    style: String,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(help = "Path to the source photo")]
    image: PathBuf,
    #[arg(short, long, help = "Remote filter name, e.g. cartoon, sketch")]
    kind: String,
    #[arg(short, long, help = "Output path (defaults into the outputs directory)")]
    output: Option<PathBuf>,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    let resolved_data_dir = data_dir(cli.data_dir.as_deref());

    init_logging(
        Some(resolved_data_dir.as_path()),
        cli.verbose,
        cli.log_filter.as_deref(),
    );

    if let Err(error) = initialize_data_dir(&resolved_data_dir) {
        warn!(error = %error, "Failed to initialize data directory");
    }

    let cfg_path = config_path(&resolved_data_dir);
    let config = match AppConfig::load_from_path(&cfg_path) {
        Ok(config) => config,
        Err(error) => {
            warn!(error = %error, "Failed to load config file, using defaults");
            AppConfig::default()
        }
    };

    info!(
        pid = std::process::id(),
        data_dir = %resolved_data_dir.display(),
        "Startup"
    );

    match cli.command {
        Commands::Apply(args) => cmd_apply(&config, &resolved_data_dir, args),
        Commands::Styles(args) => cmd_styles(&config, &resolved_data_dir, args),
        Commands::Fetch(args) => cmd_fetch(&config, &resolved_data_dir, args),
        Commands::Filter(args) => cmd_filter(&config, &resolved_data_dir, args),
    }
}

fn load_catalog(config: &AppConfig, data_dir: &Path) -> StyleCatalog {
    let models_dir = resolve_relative_to(data_dir, &config.paths.models_dir);
    let mut catalog = StyleCatalog::with_builtin_models(models_dir);
    if let Err(error) = catalog.discover() {
        warn!(error = %error, "Failed to scan models directory for side-loaded models");
    }
    catalog
}

fn resolve_style_id(catalog: &StyleCatalog, query: &str) -> Result<String> {
    match catalog.lookup(query) {
        Some(model) => Ok(model.filename.clone()),
        None => bail!("unknown style '{query}' — run `stylova styles` to list available styles"),
    }
}

fn outputs_dir(config: &AppConfig, data_dir: &Path) -> PathBuf {
    resolve_relative_to(data_dir, &config.paths.outputs_dir)
}

/// `photo.jpg` styled with `candy-9.onnx` lands at `photo-candy-9.jpg`.
fn default_output_path(outputs_dir: &Path, image: &Path, suffix: &str) -> PathBuf {
    let stem = image
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("photo");
    let suffix_stem = Path::new(suffix)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(suffix);
    outputs_dir.join(format!("{stem}-{suffix_stem}.jpg"))
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory: {}", parent.display()))?;
    }
    fs::write(path, bytes)
        .with_context(|| format!("failed to write output image: {}", path.display()))?;
    Ok(())
}

fn cmd_apply(config: &AppConfig, data_dir: &Path, args: ApplyArgs) -> Result<()> {
    let catalog = load_catalog(config, data_dir);
    let style_id = resolve_style_id(&catalog, &args.style)?;

    let mut styler = Styler::with_settings(
        catalog,
        config.engine.cache_capacity,
        config.engine.jpeg_quality,
    );
    let styled = styler
        .apply(&args.image, &style_id)
        .with_context(|| format!("failed to style {}", args.image.display()))?;

    let output = args.output.unwrap_or_else(|| {
        default_output_path(&outputs_dir(config, data_dir), &args.image, &style_id)
    });
    write_output(&output, &styled.bytes)?;

    info!(
        style = %style_id,
        output = %output.display(),
        width = styled.width,
        height = styled.height,
        "Styled image written"
    );
    println!("{}", output.display());
    Ok(())
}

fn cmd_styles(config: &AppConfig, data_dir: &Path, args: StylesArgs) -> Result<()> {
    let catalog = load_catalog(config, data_dir);

    if args.json {
        println!("{}", catalog.to_json()?);
        return Ok(());
    }

    for model in catalog.list() {
        let status = if catalog.is_downloaded(&model.filename) {
            "downloaded"
        } else {
            "remote"
        };
        println!(
            "{:<14} {:<24} {:>4}x{:<4} {:<14} {:<10} {}",
            model.name,
            model.filename,
            model.input_width,
            model.input_height,
            model.layout.to_string(),
            status,
            model.description,
        );
    }
    Ok(())
}

fn cmd_fetch(config: &AppConfig, data_dir: &Path, args: FetchArgs) -> Result<()> {
    let catalog = load_catalog(config, data_dir);
    let style_id = resolve_style_id(&catalog, &args.style)?;

    let path = catalog
        .resolve(&style_id)
        .with_context(|| format!("failed to fetch model for style '{style_id}'"))?;
    println!("{}", path.display());
    Ok(())
}

fn cmd_filter(config: &AppConfig, data_dir: &Path, args: FilterArgs) -> Result<()> {
    let image = fs::read(&args.image)
        .with_context(|| format!("failed to read image: {}", args.image.display()))?;

    let client = FilterClient::new(&config.remote.base_url)?;
    let filtered = client.apply_filter(&image, &args.kind)?;

    let output = args.output.unwrap_or_else(|| {
        default_output_path(&outputs_dir(config, data_dir), &args.image, &args.kind)
    });
    write_output(&output, &filtered)?;

    info!(filter = %args.kind, output = %output.display(), "Filtered image written");
    println!("{}", output.display());
    Ok(())
}

fn init_logging(data_dir: Option<&Path>, verbose: u8, cli_log_filter: Option<&str>) {
    let options = LoggingInitOptions {
        data_dir: data_dir.map(Path::to_path_buf),
        verbose,
        cli_log_filter: cli_log_filter.map(ToString::to_string),
        rust_log_env: std::env::var("RUST_LOG").ok(),
        ..Default::default()
    };

    let filter = logging::select_log_filter(&options);

    match logging::build_file_sink_plan(&options) {
        FileSinkPlan::Ready(ready) => {
            let subscriber = tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_filter(parse_env_filter_with_fallback(&filter, "console")),
                )
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(ready.appender)
                        .with_filter(parse_env_filter_with_fallback(&filter, "file")),
                );

            if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
                eprintln!(
                    "Failed to initialize tracing subscriber: {error}. Continuing without structured tracing."
                );
            }
        }
        FileSinkPlan::Fallback(fallback) => {
            let subscriber = tracing_subscriber::registry().with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_filter(parse_env_filter_with_fallback(&filter, "console")),
            );

            if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
                eprintln!(
                    "Failed to initialize tracing subscriber: {error}. Continuing without structured tracing."
                );
                return;
            }

            warn!(
                attempted_log_dir = ?fallback.attempted_log_dir,
                reason = %fallback.reason,
                "Persistent file logging unavailable; continuing with console-only logging"
            );
        }
    }
}

fn parse_env_filter_with_fallback(filter: &str, sink_name: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_new(filter).unwrap_or_else(|error| {
        eprintln!(
            "Invalid {sink_name} log filter '{filter}': {error}. Falling back to '{DEFAULT_LOG_FILTER}'."
        );
        tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parses_apply() {
        let cli = Cli::try_parse_from([
            "stylova", "apply", "photo.jpg", "--style", "candy-9.onnx", "-o", "out.jpg",
        ])
        .unwrap();

        match cli.command {
            Commands::Apply(args) => {
                assert_eq!(args.image, PathBuf::from("photo.jpg"));
                assert_eq!(args.style, "candy-9.onnx");
                assert_eq!(args.output, Some(PathBuf::from("out.jpg")));
            }
            _ => panic!("expected apply subcommand"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli =
            Cli::try_parse_from(["stylova", "-vv", "--data-dir", "/tmp/sd", "styles", "--json"])
                .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/sd")));
        assert!(matches!(cli.command, Commands::Styles(StylesArgs { json: true })));
    }

    #[test]
    fn default_output_path_uses_both_stems() {
        let out = default_output_path(
            Path::new("/data/outputs"),
            Path::new("/photos/beach.png"),
            "candy-9.onnx",
        );
        assert_eq!(out, PathBuf::from("/data/outputs/beach-candy-9.jpg"));

        let filtered = default_output_path(
            Path::new("/data/outputs"),
            Path::new("beach.jpg"),
            "cartoon",
        );
        assert_eq!(filtered, PathBuf::from("/data/outputs/beach-cartoon.jpg"));
    }

    #[test]
    fn resolve_style_id_accepts_name_or_filename() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = StyleCatalog::with_builtin_models(dir.path().to_path_buf());

        assert_eq!(
            resolve_style_id(&catalog, "candy-9.onnx").unwrap(),
            "candy-9.onnx"
        );
        assert_eq!(resolve_style_id(&catalog, "shinkai").unwrap(), "Shinkai.onnx");
        assert!(resolve_style_id(&catalog, "vaporwave").is_err());
    }
}
