use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use compat_bridge::classfile::ClassFile;
use compat_bridge::config::load_from_path;
use compat_bridge::emit::{ClassWrite, EmitResult};
use compat_bridge::loader::{LoadError, TransformerRegistry};
use compat_bridge::rewrite::{self, RemovedMarker};
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "compat-bridge")]
#[command(about = "Restore removed JVM API methods as bridge methods", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add bridge methods to one class file
    Rewrite {
        /// Class file to rewrite
        class: PathBuf,

        /// Output path (defaults to rewriting in place)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Dry run - report bridges without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show a diff of the method table
        #[arg(short, long)]
        diff: bool,
    },

    /// Report marked methods under a directory or in a class file
    Scan {
        path: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Resolve types through a configured loader
    Resolve {
        /// Loader config file
        #[arg(short, long)]
        config: PathBuf,

        /// Dotted type names
        #[arg(required = true)]
        names: Vec<String>,

        /// Worker threads issuing resolutions
        #[arg(short = 'j', long, default_value_t = 4)]
        threads: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Rewrite {
            class,
            output,
            dry_run,
            diff,
        } => cmd_rewrite(&class, output.as_deref(), dry_run, diff),

        Commands::Scan { path, json } => cmd_scan(&path, json),

        Commands::Resolve {
            config,
            names,
            threads,
        } => cmd_resolve(&config, &names, threads),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Dotted type name of a class file, read from its own `this_class`.
fn type_name_of(bytes: &[u8], path: &Path) -> Result<String> {
    ClassFile::parse(bytes)
        .and_then(|class| class.binary_name())
        .with_context(|| format!("{} is not a valid class file", path.display()))
}

/// One line per method: flags, name and descriptor.
fn method_table(bytes: &[u8]) -> Result<String> {
    let class = ClassFile::parse(bytes)?;
    let mut table = String::new();
    for method in &class.methods {
        table.push_str(&format!(
            "0x{:04x} {}{}\n",
            method.access_flags,
            class.member_name(method)?,
            class.member_descriptor(method)?
        ));
    }
    Ok(table)
}

fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (methods)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (bridged)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", line);
    }
}

fn cmd_rewrite(class: &Path, output: Option<&Path>, dry_run: bool, diff: bool) -> Result<()> {
    let input = fs::read(class).with_context(|| format!("failed to read {}", class.display()))?;
    let type_name = type_name_of(&input, class)?;
    let rewritten = rewrite::rewrite(&type_name, &input)?;

    if rewritten.bridges.is_empty() {
        println!("{} {}: no markers", "⊘".cyan(), type_name);
    }
    for bridge in &rewritten.bridges {
        println!("{} {}: {}", "+".green(), type_name, bridge);
    }

    if diff {
        display_diff(class, &method_table(&input)?, &method_table(&rewritten.bytes)?);
    }

    if dry_run {
        println!("{}", "[DRY RUN - nothing written]".cyan());
        return Ok(());
    }

    let target = output.unwrap_or(class);
    match ClassWrite::new(target, rewritten.bytes).apply()? {
        EmitResult::Written { path, bytes } => {
            println!("{} wrote {} ({} bytes)", "✓".green(), path.display(), bytes)
        }
        EmitResult::Unchanged { path } => {
            println!("{} {} already up to date", "✓".green(), path.display())
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ScanEntry {
    file: PathBuf,
    type_name: String,
    markers: Vec<RemovedMarker>,
}

fn class_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("class")
        {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn cmd_scan(path: &Path, json: bool) -> Result<()> {
    let mut entries = Vec::new();
    for file in class_files(path)? {
        let bytes = fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
        let type_name = type_name_of(&bytes, &file)?;
        let markers = rewrite::markers(&type_name, &bytes)?;
        if !markers.is_empty() {
            entries.push(ScanEntry {
                file,
                type_name,
                markers,
            });
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", "No marked methods found".yellow());
    }
    for entry in &entries {
        println!("{} ({})", entry.type_name.bold(), entry.file.display());
        for marker in &entry.markers {
            println!(
                "  {}{} -> {}",
                marker.implementation_name,
                marker.implementation_descriptor,
                marker.original_name.green()
            );
        }
    }
    Ok(())
}

fn cmd_resolve(config: &Path, names: &[String], threads: usize) -> Result<()> {
    let config = load_from_path(config)?;
    let loader = config.build(Arc::new(TransformerRegistry::with_builtins()));
    println!("Loader: {}", loader);

    let threads = threads.clamp(1, names.len().max(1));
    let chunk = names.len().div_ceil(threads);
    let results: Vec<(String, Result<_, LoadError>)> = thread::scope(|scope| {
        let handles: Vec<_> = names
            .chunks(chunk)
            .map(|batch| {
                let loader = &loader;
                scope.spawn(move || {
                    batch
                        .iter()
                        .map(|name| (name.clone(), loader.resolve(name)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });

    let mut failed = 0usize;
    for (name, result) in results {
        match result {
            Ok(ty) => println!(
                "{} {} from {} digest={:016x}{}",
                "✓".green(),
                name,
                ty.provenance(),
                ty.digest(),
                if ty.is_transformed() {
                    " (transformed)".cyan().to_string()
                } else {
                    String::new()
                }
            ),
            Err(e) => {
                failed += 1;
                eprintln!("{} {}: {}", "✗".red(), name, e);
                let mut source = e.source();
                while let Some(cause) = source {
                    eprintln!("  caused by: {}", cause);
                    source = cause.source();
                }
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} types failed to resolve", names.len());
    }
    Ok(())
}
