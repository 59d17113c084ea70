//! Command-line front end.
//!
//! [`Cli`] is the clap definition; [`run`] executes it against any writer so
//! the commands can be exercised without spawning the binary.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::warn;
use wispy_render::{Engine, EngineConfig, RequestInfo};

#[derive(Debug, Parser)]
#[command(name = "wispy", version, about = "Render wispy templates")]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render a page inside the site's root layout and print it
    Render(RenderArgs),
    /// List the registered tags and filters
    Tags(TagsArgs),
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Site directory holding layouts/ and partials/
    #[arg(long, default_value = ".")]
    pub site: PathBuf,

    /// Page file, relative to the site directory
    pub page: PathBuf,

    /// JSON object merged into the page data
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Engine configuration (YAML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Request header, as NAME=VALUE
    #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_pair)]
    pub headers: Vec<(String, String)>,

    /// Query parameter exposed as URL.Query, as KEY=VALUE
    #[arg(long = "query", value_name = "KEY=VALUE", value_parser = parse_pair)]
    pub query: Vec<(String, String)>,

    /// Exit with an error when the render reported any problem
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args)]
pub struct TagsArgs {
    /// Engine configuration (YAML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got `{raw}`")),
    }
}

/// Builds an engine from an optional YAML configuration file.
pub fn load_engine(config: Option<&Path>) -> Result<Engine> {
    let Some(path) = config else {
        return Ok(Engine::new());
    };
    let config = EngineConfig::from_yaml_file(path)
        .with_context(|| format!("loading configuration {}", path.display()))?;
    Engine::builder()
        .config(config)
        .build()
        .with_context(|| format!("invalid configuration {}", path.display()))
}

fn load_data(path: &Path) -> Result<Map<String, Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading data file {}", path.display()))?;
    match serde_json::from_str::<Value>(&raw)
        .with_context(|| format!("parsing data file {}", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => bail!("data file {} must hold a JSON object", path.display()),
    }
}

/// Runs a parsed command line, writing command output to `out`.
pub fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    match cli.command {
        Command::Render(args) => render(args, out),
        Command::Tags(args) => tags(args, out),
    }
}

fn render(args: RenderArgs, out: &mut impl Write) -> Result<()> {
    let engine = load_engine(args.config.as_deref())?;
    let data = match &args.data {
        Some(path) => load_data(path)?,
        None => Map::new(),
    };

    let request = if args.headers.is_empty() && args.query.is_empty() {
        None
    } else {
        let request = args
            .headers
            .into_iter()
            .fold(RequestInfo::new(), |req, (name, value)| req.with_header(name, value));
        Some(
            args.query
                .into_iter()
                .fold(request, |req, (key, value)| req.with_query(key, value)),
        )
    };

    let rendered = engine
        .render_page(&args.site, &args.page, data, request)
        .with_context(|| format!("rendering {}", args.page.display()))?;

    for err in &rendered.errors {
        warn!(kind = ?err.kind(), "{}", err);
    }

    out.write_all(rendered.output.as_bytes())?;
    out.flush()?;

    if args.strict && !rendered.errors.is_empty() {
        bail!("{} template error(s) reported", rendered.errors.len());
    }
    Ok(())
}

fn tags(args: TagsArgs, out: &mut impl Write) -> Result<()> {
    let engine = load_engine(args.config.as_deref())?;
    writeln!(out, "tags:")?;
    for name in engine.tag_names() {
        writeln!(out, "  {name}")?;
    }
    writeln!(out, "filters:")?;
    for name in engine.filter_names() {
        writeln!(out, "  {name}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_split_at_first_equals() {
        assert_eq!(
            parse_pair("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_pair("empty=").unwrap(), ("empty".to_string(), String::new()));
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pair("=x").is_err());
    }

    #[test]
    fn render_arguments_parse() {
        let cli = Cli::try_parse_from([
            "wispy",
            "render",
            "--site",
            "site",
            "pages/index.hstm",
            "--header",
            "HX-Request=true",
            "--query",
            "tag=a",
            "--query",
            "tag=b",
            "--strict",
        ])
        .unwrap();
        let Command::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.site, PathBuf::from("site"));
        assert_eq!(args.page, PathBuf::from("pages/index.hstm"));
        assert_eq!(args.headers, vec![("HX-Request".to_string(), "true".to_string())]);
        assert_eq!(args.query.len(), 2);
        assert!(args.strict);
    }

    #[test]
    fn bad_pair_is_rejected_by_clap() {
        assert!(Cli::try_parse_from(["wispy", "render", "p.hstm", "--query", "oops"]).is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["wispy", "tags", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
