//! dazgraph CLI - Command-line tool for inspecting DAZ Studio asset graphs.
//!
//! This is the main entry point for the dazgraph command-line application.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use walkdir::WalkDir;

use dazgraph::prelude::*;

/// dazgraph - DAZ Studio asset resolution tool
#[derive(Parser)]
#[command(name = "dazgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (JSON)
    #[arg(short, long, global = true, env = "DAZGRAPH_SETTINGS")]
    settings: Option<PathBuf>,

    /// Content library root, searched in order (repeatable)
    #[arg(short, long = "library", global = true, env = "DAZ_LIBRARY", value_delimiter = ';')]
    libraries: Vec<PathBuf>,

    /// Show debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show errors and the final summary
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized form of a reference
    Normalize {
        /// Reference as written in a DSON file
        reference: String,

        /// Fold the path to lower case
        #[arg(long)]
        case_insensitive: bool,
    },

    /// Resolve one reference from a file
    Resolve {
        /// Reference to resolve
        reference: String,

        /// File the reference is read from
        #[arg(long)]
        scope: PathBuf,

        /// Fail on missing assets
        #[arg(long)]
        strict: bool,
    },

    /// Load a scene and report what it contains
    Scan {
        /// Scene or library file (.duf/.dsf)
        input: PathBuf,

        /// Fail on missing assets
        #[arg(long)]
        strict: bool,
    },

    /// Preload every DSON file in the library roots
    Index {
        /// Filter pattern for library-relative paths (glob-style)
        #[arg(short, long)]
        filter: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let settings = load_settings(&cli)?;

    match cli.command {
        Commands::Normalize {
            reference,
            case_insensitive,
        } => {
            cmd_normalize(&reference, case_insensitive || !settings.case_sensitive_paths);
        }
        Commands::Resolve {
            reference,
            scope,
            strict,
        } => {
            cmd_resolve(settings, &reference, &scope, strict)?;
        }
        Commands::Scan { input, strict } => {
            cmd_scan(settings, &input, strict)?;
        }
        Commands::Index { filter } => {
            cmd_index(settings, filter.as_deref())?;
        }
    }

    Ok(())
}

/// Settings from the settings file, overridden by the command line.
fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    if !cli.libraries.is_empty() {
        settings.library_roots = cli.libraries.clone();
    }
    if cli.verbose {
        settings.verbosity = Verbosity::Verbose;
    } else if cli.quiet {
        settings.verbosity = Verbosity::Quiet;
    }

    debug!("library roots: {:?}", settings.library_roots);
    Ok(settings)
}

fn cmd_normalize(reference: &str, case_insensitive: bool) {
    let normalizer = Normalizer::new(!case_insensitive);
    let key = normalizer.normalize(reference);

    println!("key:          {}", key);
    println!("kind:         {:?}", key.kind());
    println!("path:         {}", key.path());
    if let Some(fragment) = key.fragment() {
        println!("fragment:     {}", fragment);
    }
    println!("denormalized: {}", denormalize(key.as_str()));
}

fn cmd_resolve(mut settings: Settings, reference: &str, scope: &Path, strict: bool) -> Result<()> {
    settings.strict |= strict;
    let strict = settings.strict;

    let mut session = Session::new(settings.clone());
    let mut resolver = Resolver::new(LibraryPaths::from_settings(&settings), DsonParser::new());

    let scope_id = resolver
        .load_file(&mut session, scope)
        .with_context(|| format!("Failed to load {}", scope.display()))?;
    let scope_ref = session.store()[scope_id].identity().clone();
    let file_scope = FileScope::root(&scope_ref);

    let found = resolver
        .resolve(&mut session, reference, &file_scope, strict)
        .with_context(|| format!("Failed to resolve {}", reference))?;

    match found {
        Some(id) => print_asset(session.store(), id),
        None => println!("{}: not found", reference),
    }

    if let Some(summary) = session.finish() {
        eprintln!("{}", summary);
    }

    Ok(())
}

fn print_asset(store: &AssetStore, id: AssetId) {
    let asset = &store[id];

    println!("identity: {}", asset.identity());
    println!("kind:     {}", asset.kind());
    println!("file:     {}", asset.file());
    if let Some(name) = asset.name() {
        println!("name:     {}", name);
    }
    if let Some(parent) = asset.parent() {
        println!("parent:   {}", parent);
    }
    if let Some(base) = asset.instance_of() {
        println!("instance: {}", store[base].identity());
    }
    for sibling in store.siblings(asset.identity()) {
        println!("sibling:  {} ({})", store[*sibling].identity(), store[*sibling].kind());
    }
    println!("children: {}", asset.children().len());
}

fn cmd_scan(mut settings: Settings, input: &Path, strict: bool) -> Result<()> {
    settings.strict |= strict;

    let mut session = Session::new(settings.clone());
    let mut resolver = Resolver::new(LibraryPaths::from_settings(&settings), DsonParser::new());

    let start = Instant::now();
    resolver
        .load_file(&mut session, input)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    info!("Loaded {} in {:?}", input.display(), start.elapsed());

    print_counts(session.store());

    if let Some(summary) = session.finish() {
        eprintln!("{}", summary);
    }

    Ok(())
}

fn print_counts(store: &AssetStore) {
    let mut counts: Vec<(AssetKind, usize)> = store.count_by_kind().into_iter().collect();
    counts.sort();

    for (kind, count) in &counts {
        println!("{:>10} {}", count, kind);
    }
    println!("\nTotal: {} assets, {} keys", store.len(), store.key_count());
}

fn cmd_index(settings: Settings, filter: Option<&str>) -> Result<()> {
    if settings.library_roots.is_empty() {
        anyhow::bail!("No library roots given (use --library or DAZ_LIBRARY)");
    }

    let pattern = filter
        .map(glob::Pattern::new)
        .transpose()
        .context("Invalid filter pattern")?;
    let options = glob::MatchOptions {
        case_sensitive: false,
        ..Default::default()
    };

    let paths = LibraryPaths::from_settings(&settings);
    let mut files = Vec::new();
    for root in &settings.library_roots {
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || !is_dson(entry.path()) {
                continue;
            }
            if let Some(pattern) = &pattern {
                let relative = paths.library_relative(entry.path()).unwrap_or_default();
                if !pattern.matches_with(&relative, options) {
                    continue;
                }
            }
            files.push(entry.into_path());
        }
    }

    println!("Indexing {} files...", files.len());

    let mut session = Session::new(settings.clone());
    let mut resolver = Resolver::new(paths, DsonParser::new());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let stats = resolver.preload(&mut session, &files, |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    });
    pb.finish_with_message("Done");

    println!(
        "Loaded {} files in {:?} ({} errors, {} already loaded)",
        stats.loaded,
        start.elapsed(),
        stats.errors,
        stats.skipped
    );
    print_counts(session.store());

    if let Some(summary) = session.finish() {
        eprintln!("{}", summary);
    }

    Ok(())
}

fn is_dson(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("duf") || e.eq_ignore_ascii_case("dsf"))
        .unwrap_or(false)
}
