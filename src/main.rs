use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::HumanBytes;

use createtorrent::cli::{Args, Invocation};
use createtorrent::config::{Config, MAX_ANNOUNCE};
use createtorrent::{
    BuildReport, Diagnostic, Diagnostics, SourceSpec, StderrReporter, TorrentBuilder,
};

fn main() -> Result<()> {
    let args = Args::parse();

    let verbose = args.verbose;
    let force = args.force;
    let json = args.json;
    let progress = args.progress;

    let config = Config::load(args.config.as_deref())?;
    let profile = config.profile(args.profile.as_deref())?;
    let invocation = args.into_invocation(&profile)?;

    let mut reporter = StderrReporter::new(verbose);
    if invocation.trackers_truncated {
        reporter.report(Diagnostic::TooManyTrackers {
            limit: MAX_ANNOUNCE,
        });
    }

    if verbose {
        eprintln!("createtorrent {}", env!("CARGO_PKG_VERSION"));
        eprintln!();
        print_configuration(&invocation);
    }

    let Invocation {
        trackers,
        sources,
        output,
        options,
        ..
    } = invocation;

    let source = SourceSpec::from_paths(sources).context("Invalid source")?;
    let builder = TorrentBuilder::new(trackers, source, options).with_progress(progress);

    let Some(output_path) = output else {
        let summary = builder.dry_run(&mut reporter)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }
        eprintln!("{}", style("Dry Run Results:").bold().underlined());
        eprintln!("{:<15} {}", style("Name:").bold(), summary.name);
        eprintln!(
            "{:<15} {}",
            style("Total Size:").bold(),
            style(HumanBytes(summary.total_size)).green()
        );
        eprintln!("{:<15} {}", style("File Count:").bold(), summary.files.len());
        eprintln!(
            "{:<15} {}",
            style("Piece Length:").bold(),
            style(HumanBytes(summary.piece_length)).yellow()
        );
        eprintln!("{:<15} {}", style("Piece Count:").bold(), summary.piece_count);
        if verbose {
            for file in summary.files.iter().take(20) {
                eprintln!(
                    "  - {:<40} {}",
                    file.path.join("/"),
                    style(HumanBytes(file.length)).dim()
                );
            }
            if summary.files.len() > 20 {
                eprintln!("  ... and {} more", style(summary.files.len() - 20).dim());
            }
        }
        return Ok(());
    };

    let report = builder
        .write_file(&output_path, force, &mut reporter)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if verbose {
        print_report(&report);
    }
    if verbose && reporter.warnings() > 0 {
        eprintln!("{} warning(s)", style(reporter.warnings()).yellow());
    }
    eprintln!("Created: {}", output_path.display());

    Ok(())
}

fn print_configuration(invocation: &Invocation) {
    eprintln!("Configuration:");
    for source in &invocation.sources {
        eprintln!("  Source: {}", source.display());
    }
    if let Some(ref output) = invocation.output {
        eprintln!("  Output: {}", output.display());
    }
    eprintln!("  Announce URLs:");
    for (i, url) in invocation.trackers.urls().iter().enumerate() {
        eprintln!("    {}: {}", i + 1, url);
    }
    if let Some(ref comment) = invocation.options.comment {
        eprintln!("  Comment: {}", comment);
    }
    eprintln!("  Piece length: {}", invocation.options.piece_length);
    eprintln!("  Private: {}", invocation.options.private);
    eprintln!("  Include hidden: {}", invocation.options.include_hidden);
    eprintln!("  No date: {}", invocation.options.no_date);
    eprintln!();
}

fn print_report(report: &BuildReport) {
    eprintln!();
    eprintln!("{:<15} {}", style("Name:").bold(), style(&report.name).cyan());
    eprintln!("{:<15} {}", style("Announce:").bold(), report.announce);
    if let Some(date) = report.creation_date {
        let datetime = chrono::DateTime::from_timestamp(date, 0)
            .map(|dt| dt.to_string())
            .unwrap_or_else(|| date.to_string());
        eprintln!("{:<15} {}", style("Date:").bold(), datetime);
    }
    eprintln!(
        "{:<15} {}",
        style("Total Size:").bold(),
        style(HumanBytes(report.total_size)).green()
    );
    eprintln!("{:<15} {}", style("Files:").bold(), report.files.len());
    eprintln!(
        "{:<15} {} x {}",
        style("Pieces:").bold(),
        report.piece_count,
        style(HumanBytes(report.piece_length)).yellow()
    );
    eprintln!("{:<15} {}", style("Info Hash:").bold(), report.info_hash);
}
