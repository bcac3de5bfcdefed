//! vzc: prefix, inline and minify a stylesheet

use std::env;
use std::io::Write;
use std::process::ExitCode;

use camino::{Utf8Path, Utf8PathBuf};
use eyre::{Result, WrapErr};
use facet::Facet;
use facet_args as args;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use vendorize::{CompressOptions, Compressor, ResolvedConfig};

const DEFAULT_FILTER: &str = concat!(
    "vendorize=info,",
    "vendorize_config=info,",
    "vendorize_prefix=info,",
    "vendorize_minify=info",
);

/// Compress a stylesheet
#[derive(Facet, Debug)]
struct Args {
    /// Stylesheet to compress
    #[facet(args::positional)]
    input: String,

    /// Write the result here instead of stdout
    #[facet(args::named, args::short = 'o', default)]
    output: Option<String>,

    /// Neither read nor write the result cache
    #[facet(args::named)]
    no_cache: bool,

    /// Keep whitespace and formatting
    #[facet(args::named)]
    no_minify: bool,

    /// Config file to use instead of discovering `.config/vendorize.yaml`
    #[facet(args::named, default)]
    config: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let args_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();

    facet_args::from_slice(&args_refs).map_err(|e| {
        eprintln!("{:?}", miette::Report::new(e));
        "Failed to parse arguments".to_string()
    })
}

fn main() -> ExitCode {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .build(),
        )
    }))
    .ok();
    color_eyre::install().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .init();

    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e:?}", "error".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Some(ResolvedConfig::load(Utf8Path::new(path))?),
        None => ResolvedConfig::discover()?,
    };
    let config = match config {
        Some(config) => config,
        None => {
            let cwd = Utf8PathBuf::try_from(env::current_dir()?)?;
            tracing::debug!(%cwd, "no config file found, using defaults");
            ResolvedConfig::defaults(&cwd)
        }
    };

    let mut options = CompressOptions::from(&config);
    if args.no_cache {
        options.cache_dir = None;
    }
    if args.no_minify {
        options.minify = false;
    }

    let compressor = Compressor::new(config.table, options)?;
    let out = compressor
        .compress_file(Utf8Path::new(&args.input))
        .wrap_err_with(|| format!("failed to compress {}", args.input))?;

    match &args.output {
        Some(path) => fs_err::write(path, &out.css)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(out.css.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
