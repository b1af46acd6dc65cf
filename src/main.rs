use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::io::{Read, Write};
use std::path::PathBuf;

use feedshift::config::Config;
use feedshift::pipeline::{self, OutputOptions, Pipeline};
use feedshift::serialize::OutputFormat;
use feedshift::transform::{FilterOptions, SortBy, SortOptions, SortOrder};
use feedshift::util::parse_date;

#[derive(Parser, Debug)]
#[command(
    name = "feedshift",
    version,
    about = "Filter, merge, enhance and convert RSS/Atom feeds"
)]
struct Cli {
    /// Config file (default: ~/.config/feedshift/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one feed, filter and sort it
    Transform {
        url: String,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Fetch several feeds and combine them, newest first
    Merge {
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Fetch one feed and replace short item content with the linked article
    Enhance {
        url: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Read a feed from a file (or stdin) and re-serialize it
    Convert {
        /// Input file; reads stdin when omitted or "-"
        input: Option<PathBuf>,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Keep items mentioning any of these words (repeatable)
    #[arg(long = "keyword", value_name = "WORD")]
    keywords: Vec<String>,

    /// Drop items mentioning any of these words (repeatable)
    #[arg(long = "exclude", value_name = "WORD")]
    exclude_keywords: Vec<String>,

    /// Earliest publication date, inclusive
    #[arg(long, value_name = "DATE", value_parser = parse_date_arg)]
    from: Option<DateTime<Utc>>,

    /// Latest publication date, inclusive
    #[arg(long, value_name = "DATE", value_parser = parse_date_arg)]
    to: Option<DateTime<Utc>>,

    /// Keep items in any of these categories (repeatable)
    #[arg(long = "category", value_name = "NAME")]
    categories: Vec<String>,

    /// Keep at most this many items
    #[arg(long)]
    limit: Option<usize>,

    /// Sort key
    #[arg(long, value_enum)]
    sort: Option<SortBy>,

    /// Sort direction (default: desc)
    #[arg(long, value_enum, requires = "sort")]
    order: Option<SortOrder>,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output format (default from config, else rss)
    #[arg(long, short, value_enum)]
    format: Option<OutputFormat>,

    /// Append "(N min read)" to every description
    #[arg(long)]
    metadata: bool,
}

fn parse_date_arg(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_date(raw).ok_or_else(|| format!("unrecognized date: {raw:?}"))
}

impl FilterArgs {
    /// Command-line flags replace the matching config defaults.
    fn resolve(self, defaults: &FilterOptions) -> FilterOptions {
        let mut options = defaults.clone();
        if !self.keywords.is_empty() {
            options.keywords = self.keywords;
        }
        if !self.exclude_keywords.is_empty() {
            options.exclude_keywords = self.exclude_keywords;
        }
        if self.from.is_some() {
            options.from_date = self.from;
        }
        if self.to.is_some() {
            options.to_date = self.to;
        }
        if !self.categories.is_empty() {
            options.categories = self.categories;
        }
        if self.limit.is_some() {
            options.limit = self.limit;
        }
        options
    }

    fn sort_options(&self, config: &Config) -> Option<SortOptions> {
        match self.sort {
            Some(by) => Some(SortOptions {
                by,
                order: self.order.unwrap_or_default(),
            }),
            None => config.sort,
        }
    }
}

impl OutputArgs {
    fn resolve(&self, config: &Config) -> OutputOptions {
        OutputOptions {
            format: self.format.unwrap_or(config.default_format),
            metadata: self.metadata,
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let Some(path) = path.or_else(Config::default_path) else {
        tracing::debug!("HOME not set, using default configuration");
        return Ok(Config::default());
    };
    Config::load(&path).with_context(|| format!("Failed to load config '{}'", path.display()))
}

fn read_input(input: Option<PathBuf>) -> Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read '{}'", path.display())),
        _ => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read feed from stdin")?;
            Ok(raw)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only the feed
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    let document = match cli.command {
        Command::Transform {
            url,
            filters,
            output,
        } => {
            let output = output.resolve(&config);
            let order = filters.sort_options(&config);
            let filters = filters.resolve(&config.filter);
            let pipeline = Pipeline::new(config).context("Failed to build HTTP client")?;
            pipeline
                .transform(&url, &filters, order.as_ref(), output)
                .await
                .with_context(|| format!("Failed to transform '{url}'"))?
        }
        Command::Merge { urls, output } => {
            let output = output.resolve(&config);
            let pipeline = Pipeline::new(config).context("Failed to build HTTP client")?;
            pipeline
                .merge(&urls, output)
                .await
                .context("Failed to merge feeds")?
        }
        Command::Enhance { url, output } => {
            let output = output.resolve(&config);
            let pipeline = Pipeline::new(config).context("Failed to build HTTP client")?;
            pipeline
                .enhance(&url, output)
                .await
                .with_context(|| format!("Failed to enhance '{url}'"))?
        }
        Command::Convert {
            input,
            filters,
            output,
        } => {
            let raw = read_input(input)?;
            let output = output.resolve(&config);
            let order = filters.sort_options(&config);
            let filters = filters.resolve(&config.filter);
            pipeline::convert(&raw, &filters, order.as_ref(), output)
                .context("Failed to convert feed")?
        }
    };

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(document.as_bytes())
        .and_then(|()| stdout.write_all(b"\n"))
        .context("Failed to write output")?;

    Ok(())
}
