use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sqlgen_codegen::CodeGen;
use sqlgen_core::{Config, Diagnostic, DiagnosticCode, DialectConfig, Location, Report, Severity};

/// sqlgen - generate Rust query records from two-way SQL templates
#[derive(Parser, Debug)]
#[command(name = "sqlgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing .sql templates
    dir: PathBuf,

    /// Path to config file (default: <DIR>/sqlgen.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Generated file, relative to <DIR>
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Target dialect: sqlite, mysql, postgres or ansi
    #[arg(short, long, value_parser = parse_dialect)]
    dialect: Option<DialectConfig>,

    /// Do not write; fail if the generated file is missing or stale
    #[arg(long)]
    check: bool,

    /// Write a JSON report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_dialect(name: &str) -> Result<DialectConfig, String> {
    DialectConfig::from_name(name).ok_or_else(|| format!("unknown dialect `{}`", name))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Load config and apply command-line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::for_dir(&cli.dir)
            .with_context(|| format!("Failed to load config from {}", cli.dir.display()))?,
    };

    if let Some(output) = &cli.output {
        config.output = output.clone();
    }
    if let Some(dialect) = cli.dialect {
        config.dialect = dialect;
    }

    Ok(config)
}

/// Returns whether the run succeeded
fn run(cli: &Cli) -> Result<bool> {
    if !cli.dir.is_dir() {
        anyhow::bail!("{} is not a directory", cli.dir.display());
    }

    let config = load_config(cli)?;
    if cli.verbose {
        eprintln!("{} dialect: {:?}", "Using".cyan(), config.dialect);
    }

    let codegen = CodeGen::with_config(&cli.dir, config);
    let report = generate(&codegen, cli.check, cli.verbose)?;

    if let Some(path) = &cli.report {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        if cli.verbose {
            eprintln!("{} {}", "Report written to".cyan(), path.display());
        }
    }

    print_report_summary(&report);
    Ok(!report.has_errors())
}

/// Generate, then write or compare against the file on disk
fn generate(codegen: &CodeGen, check: bool, verbose: bool) -> Result<Report> {
    let generation = match codegen.generate() {
        Ok(generation) => generation,
        Err(e) => {
            tracing::debug!(error = %e, "generation failed");
            return Ok(Report::from_diagnostics(vec![e.to_diagnostic()]));
        }
    };

    let mut report = generation.report();
    let output = generation.output_path.display().to_string();

    if check {
        if !generation.is_up_to_date()? {
            report.add_diagnostic(
                Diagnostic::new(
                    DiagnosticCode::OutputOutOfDate,
                    Severity::Error,
                    format!("{} is out of date; run sqlgen without --check", output),
                )
                .with_location(Location::new(output)),
            );
        } else if verbose {
            eprintln!("{} {}", "Up to date:".green(), output);
        }
    } else {
        generation
            .write()
            .with_context(|| format!("Failed to write {}", output))?;
        if verbose {
            eprintln!("{} {}", "Wrote".green(), output);
        }
    }

    Ok(report)
}

fn print_report_summary(report: &Report) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "sqlgen Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("{}", "Summary:".bold());
    println!("  Templates: {}", report.summary.templates);
    println!("  Records:   {}", report.summary.records);
    println!("  Fields:    {}", report.summary.fields);

    if report.summary.errors > 0 {
        println!("  Errors:    {}", format!("{}", report.summary.errors).red().bold());
    } else {
        println!("  Errors:    {}", format!("{}", report.summary.errors).green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings:  {}", format!("{}", report.summary.warnings).yellow());
    } else {
        println!("  Warnings:  {}", format!("{}", report.summary.warnings).green());
    }
    println!();

    if !report.records.is_empty() {
        println!("{}", "Records:".bold());
        for record in &report.records {
            println!("  {} ({})", record.name.cyan(), record.template);
            for field in &record.fields {
                println!("    {}", field);
            }
        }
        println!();
    }

    if report.diagnostics.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
        return;
    }

    println!("{}", "Diagnostics:".bold());
    for diag in &report.diagnostics {
        let severity_str = match diag.severity {
            Severity::Error => "ERROR".red().bold(),
            Severity::Warn => "WARN".yellow().bold(),
            Severity::Info => "INFO".cyan(),
        };

        println!("  [{}] {}: {}", severity_str, diag.code, diag.message);

        if let Some(loc) = &diag.location {
            println!("    at {}", loc);
        }
        if let Some(exp) = &diag.expected {
            println!("    Expected: {}", exp);
        }
        if let Some(act) = &diag.actual {
            println!("    Actual:   {}", act);
        }
    }
}
