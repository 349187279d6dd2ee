//! geoconv CLI - convert between CAD, mesh, vector and raster formats
//!
//! Formats are taken from file extensions unless given explicitly.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use geoconv::{ConvertOptions, Format, Registry, Request};
use std::path::{Path, PathBuf};
use tracing::debug;

mod inspect;

#[derive(Parser)]
#[command(name = "geoconv")]
#[command(about = "Convert between DXF, STL, SVG, EPS, BMP and ICO", long_about = None)]
struct Cli {
    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a file
    Convert {
        /// Input file
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Input format (default: input extension)
        #[arg(long)]
        from: Option<Format>,
        /// Output format (default: output extension)
        #[arg(long)]
        to: Option<Format>,
        /// TOML file with conversion options
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the result metadata as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the available conversions
    Formats,
    /// Display information about a file
    Inspect {
        /// File to inspect
        input: PathBuf,
        /// Format (default: extension)
        #[arg(long)]
        format: Option<Format>,
    },
    /// Print the default options as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Convert {
            input,
            output,
            from,
            to,
            config,
            json,
        } => {
            let report = convert_file(&input, &output, from, to, config.as_deref())?;
            if json {
                println!("{}", report);
            } else {
                eprintln!("Converted {} -> {}", input.display(), output.display());
            }
        }
        Commands::Formats => {
            print!("{}", list_formats(&Registry::new()));
        }
        Commands::Inspect { input, format } => {
            let format = resolve_format(format, &input)?;
            let data = std::fs::read(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            print!("{}", inspect::summarize(&data, format)?);
        }
        Commands::Config => {
            print!("{}", ConvertOptions::default().to_toml_string()?);
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_format(explicit: Option<Format>, path: &Path) -> Result<Format> {
    match explicit.or_else(|| Format::from_path(path)) {
        Some(format) => Ok(format),
        None => bail!(
            "cannot tell the format of {}; pass it explicitly",
            path.display()
        ),
    }
}

/// Convert `input` into `output` and return the metadata as JSON.
fn convert_file(
    input: &Path,
    output: &Path,
    from: Option<Format>,
    to: Option<Format>,
    config: Option<&Path>,
) -> Result<String> {
    let from = resolve_format(from, input)?;
    let to = resolve_format(to, output)?;
    let options = match config {
        Some(path) => ConvertOptions::load(path)?,
        None => ConvertOptions::default(),
    };

    let data =
        std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let filename = input.file_name().and_then(|n| n.to_str());
    let mut request = Request::new(&data, from, to);
    if let Some(name) = filename {
        request = request.with_filename(name);
    }

    let progress = |f: f32| debug!(progress = f, "converting");
    let converted = Registry::new().convert(&request, &options, Some(&progress))?;
    std::fs::write(output, converted.data.as_bytes())
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(converted.metadata_json()?)
}

fn list_formats(registry: &Registry) -> String {
    let mut out = String::new();
    for converter in registry.converters() {
        out.push_str(&format!(
            "{:<4} -> {:<4} {}\n",
            converter.source().extension(),
            converter.target().extension(),
            converter.description()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert_args() {
        let cli = Cli::parse_from(["geoconv", "-vv", "convert", "a.svg", "b.out", "--to", "STL"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Convert { to, from, .. } => {
                assert_eq!(to, Some(Format::Stl));
                assert_eq!(from, None);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_resolve_format() {
        assert_eq!(resolve_format(None, Path::new("part.DXF")).unwrap(), Format::Dxf);
        assert_eq!(
            resolve_format(Some(Format::Eps), Path::new("part.ps")).unwrap(),
            Format::Eps
        );
        assert!(resolve_format(None, Path::new("part.xyz")).is_err());
    }

    #[test]
    fn test_convert_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("square.svg");
        let output = dir.path().join("square.dxf");
        std::fs::write(
            &input,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><polygon points="1,1 6,1 6,6"/></svg>"#,
        )
        .unwrap();

        let json = convert_file(&input, &output, None, None, None).unwrap();
        let meta: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(meta["format"], "dxf");
        assert_eq!(meta["entityCount"], 1);

        let dxf = std::fs::read_to_string(&output).unwrap();
        assert!(dxf.contains("LWPOLYLINE"));
    }

    #[test]
    fn test_convert_with_config() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tri.svg");
        let output = dir.path().join("tri.stl");
        let config = dir.path().join("geoconv.toml");
        std::fs::write(
            &input,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><path d="M 0 0 L 5 0 L 0 5 Z"/></svg>"#,
        )
        .unwrap();
        std::fs::write(&config, "[svg_stl]\noutput_format = \"ascii\"\n").unwrap();

        convert_file(&input, &output, None, None, Some(&config)).unwrap();
        let stl = std::fs::read_to_string(&output).unwrap();
        assert!(stl.starts_with("solid"));
    }

    #[test]
    fn test_list_formats() {
        let text = list_formats(&Registry::new());
        assert!(text.contains("dxf  -> svg"));
        assert!(text.contains("ico  -> svg"));
        assert!(text.contains("ico  -> bmp"));
        assert_eq!(text.lines().count(), 11);
    }
}
