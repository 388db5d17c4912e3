//! dayfold - fold dated upload records into month-bounded archives.
//!
//! Usage:
//!   dayfold plan <RECORDS>      Build, aggregate and group; print the tree
//!   dayfold summary <RECORDS>   Print totals and the archive list only
//!   dayfold --help              Show help

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use dayfold_core::{GroupingConfig, LeftoverPolicy, Node, Object, ObjectTree};
use dayfold_group::{GroupedTree, GroupingReport, Totals, plan_archives};
use dayfold_ingest::{IngestWarning, load_records};

#[derive(Parser)]
#[command(
    name = "dayfold",
    version,
    about = "Group dated uploads into month-bounded archives",
    long_about = "dayfold lays upload records out as a year/month/day tree and folds \
                  runs of days into archives once they exceed a size and an object \
                  threshold. An archive never spans two months; files without a \
                  capture time stay in a separate, ungrouped directory."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Group records and print the resulting tree
    Plan {
        #[command(flatten)]
        grouping: GroupingArgs,

        /// List individual files under each directory and archive
        #[arg(long)]
        files: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Group records and print totals and archives only
    Summary {
        #[command(flatten)]
        grouping: GroupingArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct GroupingArgs {
    /// Upload records: a JSON array, or JSON lines for .jsonl/.ndjson files
    records: PathBuf,

    /// TOML config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Size a group must exceed to become an archive (e.g. "500MB", "1GB")
    #[arg(long)]
    min_bytes: Option<String>,

    /// Object count a group must exceed to become an archive
    #[arg(long)]
    min_objects: Option<u64>,

    /// Fixed timezone offset from UTC in seconds used to date captures
    #[arg(long, allow_hyphen_values = true)]
    utc_offset: Option<i32>,

    /// What to do with days still pending at the end: keep, flush or merge-previous
    #[arg(long, value_parser = LeftoverPolicy::from_str)]
    leftover: Option<LeftoverPolicy>,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// JSON shape of `summary`.
#[derive(Serialize)]
struct SummaryOutput<'a> {
    totals: Totals,
    archived: Totals,
    report: &'a GroupingReport,
    warnings: &'a [IngestWarning],
}

/// JSON shape of `plan`.
#[derive(Serialize)]
struct PlanOutput<'a> {
    #[serde(flatten)]
    grouped: &'a GroupedTree,
    warnings: &'a [IngestWarning],
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Plan {
            grouping,
            files,
            format,
            output,
        } => run_plan(&grouping, files, format, output)?,
        Command::Summary { grouping, format } => run_summary(&grouping, format)?,
    }

    Ok(())
}

/// Install a stderr subscriber filtered by RUST_LOG or the verbosity flag.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Merge the config file and flag overrides.
fn resolve_config(args: &GroupingArgs) -> Result<GroupingConfig> {
    let mut config = match &args.config {
        Some(path) => GroupingConfig::load(path)
            .wrap_err_with(|| format!("Failed to load config {}", path.display()))?,
        None => GroupingConfig::default(),
    };

    if let Some(ref size) = args.min_bytes {
        config.archive_min_bytes = parse_size(size)?;
    }
    if let Some(objects) = args.min_objects {
        config.archive_min_objects = objects;
    }
    if let Some(offset) = args.utc_offset {
        config.utc_offset_secs = offset;
    }
    if let Some(leftover) = args.leftover {
        config.leftover_policy = leftover;
    }

    config.validate()?;
    tracing::debug!(?config, "resolved grouping config");
    Ok(config)
}

/// Load records and run the grouping pipeline.
fn group(args: &GroupingArgs) -> Result<(GroupedTree, Vec<IngestWarning>)> {
    let config = resolve_config(args)?;
    let ingest = load_records(&args.records, &config)
        .wrap_err_with(|| format!("Failed to load records from {}", args.records.display()))?;

    if ingest.has_warnings() {
        eprintln!(
            "{} warning(s) while loading records, see the log above",
            ingest.warnings.len()
        );
    }

    eprintln!(
        "Grouping {} records from {}...",
        ingest.records.len(),
        args.records.display()
    );

    let grouped = plan_archives(&ingest.records, &config);
    Ok((grouped, ingest.warnings))
}

/// Group records and print the tree.
fn run_plan(
    args: &GroupingArgs,
    show_files: bool,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let (grouped, warnings) = group(args)?;

    let rendered = match format {
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&summary_header(&grouped, &args.records));
            render_node(&grouped.tree.root, 0, show_files, &mut out);
            out
        }
        OutputFormat::Json => serde_json::to_string_pretty(&PlanOutput {
            grouped: &grouped,
            warnings: &warnings,
        })?,
    };

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, rendered)
                .wrap_err_with(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!("Wrote plan to {}", output_path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

/// Group records and print totals and archives.
fn run_summary(args: &GroupingArgs, format: OutputFormat) -> Result<()> {
    let (grouped, warnings) = group(args)?;

    match format {
        OutputFormat::Text => {
            print!("{}", summary_header(&grouped, &args.records));

            if grouped.totals.is_empty() {
                println!(" Nothing to group.");
            } else if grouped.report.archives.is_empty() {
                println!(" No archives created.");
            } else {
                for plan in &grouped.report.archives {
                    println!(
                        " {:<24} {:>10} {:>6} files  {:<9} {}",
                        plan.name,
                        format_size(plan.totals.bytes),
                        plan.totals.objects,
                        plan.reason.as_ref(),
                        ObjectTree::display_path(
                            &plan.parent_path.iter().map(|k| k.as_str()).collect::<Vec<_>>()
                        ),
                    );
                }
            }

            if let Some(ref leftover) = grouped.report.leftover {
                println!();
                println!(
                    " Left ungrouped: {} day(s), {}, {} files",
                    leftover.days.len(),
                    format_size(leftover.totals.bytes),
                    leftover.totals.objects
                );
            }
        }
        OutputFormat::Json => {
            let summary = SummaryOutput {
                totals: grouped.totals,
                archived: grouped.report.archived_totals(),
                report: &grouped.report,
                warnings: &warnings,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

fn summary_header(grouped: &GroupedTree, records: &Path) -> String {
    let stats = grouped.tree.stats();
    let archived = grouped.report.archived_totals();
    let rule = "─".repeat(70);
    format!(
        "\n{rule}\n {} - {}, {} files\n {} archive(s) holding {} across {} day(s)\n{rule}\n\n",
        records.display(),
        format_size(grouped.totals.bytes),
        grouped.totals.objects,
        stats.archives,
        format_size(archived.bytes),
        grouped.report.archived_days(),
    )
}

/// Append a node and its children as indented lines.
fn render_node(node: &Node, depth: usize, show_files: bool, out: &mut String) {
    let indent = "  ".repeat(depth);
    let line = match &node.object {
        Object::Dir(dir) => format!(
            "{indent}▼ {:<40} {:>10} {:>6} files\n",
            truncate(&format!("{}/", dir.key), 40),
            format_size(dir.size_bytes),
            dir.objects_inside
        ),
        Object::Archive(archive) => format!(
            "{indent}■ {:<40} {:>10} {:>6} files\n",
            truncate(&archive.key, 40),
            format_size(archive.size_bytes),
            archive.objects_inside
        ),
        Object::File(file) => format!(
            "{indent}  {:<40} {:>10}\n",
            truncate(&file.key, 40),
            format_size(file.size_bytes)
        ),
    };
    out.push_str(&line);

    for child in node.children.values() {
        if child.object.is_file() && !show_files {
            continue;
        }
        render_node(child, depth + 1, show_files, out);
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to max characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 1).collect();
        format!("{kept}…")
    }
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB"). Units are binary.
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let digits_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(digits_end);

    let multiplier: u64 = match unit.trim() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => 1024,
        "M" | "MB" | "MIB" => 1024 * 1024,
        "G" | "GB" | "GIB" => 1024 * 1024 * 1024,
        other => bail!("Unknown size unit: {other}"),
    };
    let num: f64 = num
        .parse()
        .wrap_err_with(|| format!("Invalid size: {s}"))?;

    Ok((num * multiplier as f64) as u64)
}
