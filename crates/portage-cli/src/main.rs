//! Portage CLI: inspect and plan conversion routes over a persisted
//! format cache.
//!
//! Handlers are materialized as declarations only, so planning works
//! without any live converter implementation. Actually running a
//! conversion is the job of the application embedding the core.

mod config;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use portage::{
    declared_handlers, ConversionCore, FormatCache, FormatOption, Route, RouteNode,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;

#[derive(Parser)]
#[command(name = "portage")]
#[command(about = "Conversion route planning over a persisted format cache", long_about = None)]
struct Cli {
    /// Format cache file (JSON); overrides the config default.
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List handlers and the formats they declare
    List,

    /// Plan candidate routes between two formats
    Plan {
        /// Source file name, extension, or MIME type
        source: String,
        /// Target file name, extension, or MIME type
        target: String,
        /// Accept any terminal handler on the target MIME
        #[arg(long)]
        simple: bool,
        /// Penalize every category shift instead of the best applicable one
        #[arg(long)]
        strict_categories: bool,
        /// How many candidate routes to print
        #[arg(long, default_value_t = 3)]
        count: usize,
    },

    /// Dump the graph structure and cost tables as JSON
    Graph,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load();

    let cache_path = cli
        .cache
        .clone()
        .or_else(|| config.defaults.cache.clone())
        .context("no format cache given; pass --cache or set one in the config file")?;
    let data = std::fs::read_to_string(&cache_path)
        .with_context(|| format!("failed to read cache file {}", cache_path.display()))?;
    let cache = FormatCache::from_json(&data).context("failed to parse format cache")?;

    match cli.command {
        Commands::List => cmd_list(&cache),
        Commands::Plan {
            source,
            target,
            simple,
            strict_categories,
            count,
        } => {
            cmd_plan(
                &config,
                cache,
                &source,
                &target,
                simple || config.defaults.simple,
                strict_categories || config.defaults.strict_categories,
                count,
            )
            .await
        }
        Commands::Graph => cmd_graph(&config, cache).await,
    }
}

fn cmd_list(cache: &FormatCache) -> Result<()> {
    for (handler, formats) in cache.iter() {
        println!("{}", handler);
        for format in formats {
            let direction = match (format.from, format.to) {
                (true, true) => "<->",
                (true, false) => "->",
                (false, true) => "<-",
                (false, false) => "--",
            };
            println!("  {:3} {:12} {}", direction, format.format, format.mime);
        }
        println!();
    }
    println!("Total: {} handlers", cache.len());
    Ok(())
}

async fn build_core(config: &Config, cache: FormatCache, simple: bool, strict: bool) -> Result<ConversionCore> {
    let handlers = declared_handlers(&cache);
    let mut core = ConversionCore::with_cache(handlers, cache)?
        .simple_mode(simple)
        .strict_categories(strict);
    config.apply_costs(core.graph_mut());
    core.init().await;
    Ok(core)
}

async fn cmd_plan(
    config: &Config,
    cache: FormatCache,
    source: &str,
    target: &str,
    simple: bool,
    strict: bool,
    count: usize,
) -> Result<()> {
    let core = build_core(config, cache, simple, strict).await?;

    let source_option = find_source(&core, source)
        .with_context(|| format!("no handler accepts '{}'", source))?
        .clone();
    let target_option = find_target(&core, target)
        .with_context(|| format!("no handler produces '{}'", target))?
        .clone();

    println!(
        "Planning: {} ({}) -> {} ({})",
        source_option.format.format,
        source_option.format.mime,
        target_option.format.format,
        target_option.format.mime
    );
    println!();

    let source_node = RouteNode::new(source_option.handler.clone(), source_option.format.clone());
    let target_node = RouteNode::new(target_option.handler.clone(), target_option.format.clone());

    let routes: Vec<Route> = core
        .graph()
        .search(&source_node, &target_node, simple)
        .take(count)
        .collect();

    if routes.is_empty() {
        bail!(
            "no conversion route from '{}' to '{}'",
            source_option.format.mime,
            target_option.format.mime
        );
    }

    for (n, route) in routes.iter().enumerate() {
        println!("Route {} (cost {:.2}):", n + 1, route.cost);
        for (step, pair) in route.nodes.windows(2).enumerate() {
            println!(
                "  {}. {}: {} -> {}",
                step + 1,
                pair[1].handler.name(),
                pair[0].format.mime,
                pair[1].format.mime
            );
        }
        println!();
    }
    Ok(())
}

async fn cmd_graph(config: &Config, cache: FormatCache) -> Result<()> {
    let core = build_core(config, cache, false, false).await?;
    let data = core.graph().data();
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

/// Resolve a source token: MIME types contain a slash, anything else is
/// treated as a file name or bare extension.
fn find_source<'a>(core: &'a ConversionCore, token: &str) -> Option<&'a FormatOption> {
    if token.contains('/') {
        core.registry().by_mime(token)
    } else {
        core.registry().by_extension(extension_of(token))
    }
}

/// Resolve a target token against output-capable options.
fn find_target<'a>(core: &'a ConversionCore, token: &str) -> Option<&'a FormatOption> {
    let options = core.registry().options();
    if token.contains('/') {
        let mime = portage::normalize_mime(token);
        options.iter().find(|o| o.format.to && o.format.mime == mime)
    } else {
        let ext = extension_of(token);
        options
            .iter()
            .find(|o| o.format.to && o.format.extension.eq_ignore_ascii_case(ext))
    }
}

fn extension_of(token: &str) -> &str {
    token.rsplit('.').next().unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("photo.png"), "png");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("png"), "png");
    }
}
