//! RuleForge CLI
//!
//! Compiles EasyList-style filter lists into content-blocker JSON and manages
//! the cached remote lists.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use clap::{Parser, Subcommand};

use rf_compiler::FilterListCompiler;
use rf_core::domains::{TopDomainAllowlist, DEFAULT_SKIP_TOP};
use rf_lists::{is_stale, BlocklistConfig, ListRefreshScheduler, ListState, RefreshReport};

#[derive(Parser)]
#[command(name = "rf-cli")]
#[command(about = "RuleForge filter list compiler and cache manager")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a local filter list into content-blocker JSON
    Compile {
        /// Input filter list file
        #[arg(short, long)]
        input: String,

        /// Ranked top-domain list gating cosmetic rules
        #[arg(short, long)]
        allowlist: Option<PathBuf>,

        /// Leading allowlist entries to ignore
        #[arg(long, default_value_t = DEFAULT_SKIP_TOP)]
        skip_top: usize,

        /// Output JSON file
        #[arg(short, long, default_value = "rules.json")]
        output: String,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Refresh cached remote lists
    Refresh {
        /// Config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Refresh every list, even fresh ones
        #[arg(short, long)]
        force: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the cache state of each remote list
    Status {
        /// Config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the cached JSON of one list, or of every list combined
    Show {
        /// List name; omit to merge every cached list
        #[arg(short, long)]
        name: Option<String>,

        /// Config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Compile { verbose, .. } | Commands::Refresh { verbose, .. } => *verbose,
        _ => false,
    };
    init_logging(verbose);

    let result = match cli.command {
        Commands::Compile {
            input,
            allowlist,
            skip_top,
            output,
            pretty,
            verbose,
        } => cmd_compile(&input, allowlist.as_deref(), skip_top, &output, pretty, verbose),
        Commands::Refresh { config, force, .. } => cmd_refresh(config.as_deref(), force),
        Commands::Status { config } => cmd_status(config.as_deref()),
        Commands::Show { name, config } => cmd_show(name.as_deref(), config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(path: Option<&Path>) -> Result<BlocklistConfig, String> {
    match path {
        Some(path) => BlocklistConfig::load(path).map_err(|e| e.to_string()),
        None => Ok(BlocklistConfig::default()),
    }
}

fn cmd_compile(
    input: &str,
    allowlist: Option<&Path>,
    skip_top: usize,
    output: &str,
    pretty: bool,
    verbose: bool,
) -> Result<(), String> {
    let start = Instant::now();

    let content = fs::read_to_string(input).map_err(|e| format!("Failed to read '{}': {}", input, e))?;

    let allowlist = match allowlist {
        Some(path) => TopDomainAllowlist::load(path, skip_top).map_err(|e| e.to_string())?,
        None => {
            log::warn!("No allowlist given, cosmetic rules will be dropped");
            TopDomainAllowlist::new()
        }
    };

    let compiler = FilterListCompiler::new(Arc::new(allowlist));
    let (rules, stats) = compiler.compile_with_stats(&content);
    let compile_time = start.elapsed();

    let json = if pretty {
        serde_json::to_string_pretty(&rules)
    } else {
        rules.to_json()
    }
    .map_err(|e| format!("Failed to encode rules: {}", e))?;

    fs::write(output, &json).map_err(|e| format!("Failed to write '{}': {}", output, e))?;

    println!("Compiled '{}' to '{}'", input, output);
    println!("  Lines:    {}", stats.lines);
    println!(
        "  Rules:    {} -> {} (dedupe removed {}, cap removed {})",
        stats.rules_built, stats.rules, stats.deduped, stats.truncated
    );
    println!("  Size:     {} bytes ({:.1} KB)", json.len(), json.len() as f64 / 1024.0);
    println!("  Time:     {:.1}ms", compile_time.as_secs_f64() * 1000.0);

    if verbose {
        println!();
        println!("Line categories:");
        for (category, count) in &stats.categories {
            println!("  {:<32} {}", category.as_str(), count);
        }
    }

    Ok(())
}

fn cmd_refresh(config: Option<&Path>, force: bool) -> Result<(), String> {
    let config = load_config(config)?;
    let scheduler = ListRefreshScheduler::from_config(&config).map_err(|e| e.to_string())?;

    let runtime = tokio::runtime::Runtime::new().map_err(|e| format!("Failed to start runtime: {}", e))?;
    let report = runtime.block_on(async {
        if force {
            scheduler.force_refresh_all().await
        } else {
            scheduler.refresh_all(SystemTime::now()).await
        }
    });

    print_report(&report);
    if report.is_success() {
        Ok(())
    } else {
        Err(format!("{} list(s) failed to refresh", report.failed.len()))
    }
}

fn print_report(report: &RefreshReport) {
    println!("Refreshed: {}", report.refreshed.len());
    for name in &report.refreshed {
        println!("  {}", name);
    }
    println!("Skipped:   {}", report.skipped.len());
    for name in &report.skipped {
        println!("  {}", name);
    }
    if !report.failed.is_empty() {
        println!("Failed:    {}", report.failed.len());
        for (name, error) in &report.failed {
            println!("  {}: {}", name, error);
        }
    }
}

fn cmd_status(config: Option<&Path>) -> Result<(), String> {
    let config = load_config(config)?;
    config.validate().map_err(|e| e.to_string())?;

    let now = SystemTime::now();
    println!("Cache: {} (ttl {} days)", config.cache_dir.display(), config.ttl_days);
    for descriptor in config.descriptors() {
        let path = descriptor.cache_path();
        let state = if is_stale(path, now, config.ttl()) {
            ListState::Stale
        } else {
            ListState::Fresh
        };
        println!("  {:<24} {:<6} {}", descriptor.name(), state.as_str(), path.display());
    }

    Ok(())
}

fn cmd_show(name: Option<&str>, config: Option<&Path>) -> Result<(), String> {
    let config = load_config(config)?;
    let Some(name) = name else {
        let scheduler = ListRefreshScheduler::from_config(&config).map_err(|e| e.to_string())?;
        let json = scheduler.combined_contents().map_err(|e| e.to_string())?;
        println!("{}", json);
        return Ok(());
    };

    if !config.lists.iter().any(|list| list.name == name) {
        return Err(format!("Unknown list '{}'", name));
    }

    let path = config.cache_path(name);
    let json = fs::read_to_string(&path)
        .map_err(|_| format!("List '{}' has not been fetched yet ({})", name, path.display()))?;
    println!("{}", json);

    Ok(())
}
