//! CLI entrypoint for kotoba

use clap::Parser;
use kotoba_core::cli::Cli;
use kotoba_core::error::PipelineError;
use kotoba_core::pipeline::{self, RunReport};
use kotoba_core::{ApplySummary, StoredQuestion};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = if cli.apply_chapters {
        apply_only(&cli)
    } else {
        generate(&cli)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn apply_only(cli: &Cli) -> Result<(), PipelineError> {
    info!(db = %cli.db.display(), chapters = %cli.fixed_chapters.display(), "applying chapters");
    let summary = pipeline::apply_chapters_only(&cli.db, &cli.fixed_chapters, cli.level)?;
    print_apply(&summary);
    println!("Chapter information applied successfully.");
    Ok(())
}

fn generate(cli: &Cli) -> Result<(), PipelineError> {
    let options = cli.run_options();
    let mut rng = pipeline::rng_from_seed(cli.seed);
    let report = pipeline::run_generation(&options, &mut rng)?;

    print_report(cli, &report);
    if cli.show_sample {
        print_samples(&report.samples);
    }
    if let Some(summary) = &report.applied {
        print_apply(summary);
    }
    Ok(())
}

fn print_report(cli: &Cli, report: &RunReport) {
    println!(
        "Wrote fixed file with {} entries to: {}",
        report.entries,
        cli.fixed.display()
    );
    println!(
        "Pools sizes -> kanji: {}, kana: {}, meaning: {}",
        report.kanji_pool, report.kana_pool, report.meaning_pool
    );
    println!(
        "Generated {} questions; skipped {} due to insufficient distractors.",
        report.generated, report.skipped
    );
    println!(
        "Saved {} entries and {} questions into DB: {} (overwrite={})",
        report.saved.entries,
        report.saved.questions,
        cli.db.display(),
        cli.force
    );
    println!(
        "DB now holds {} entries and {} questions.",
        report.stored_entries, report.stored_questions
    );
}

fn print_samples(samples: &[StoredQuestion]) {
    println!();
    println!("Sample saved questions:");
    for q in samples {
        println!("QID {} (type={}): {}", q.id, q.q_type, q.prompt);
        for (i, opt) in q.options.iter().enumerate() {
            let mark = if Some(i) == q.correct_index { " (correct)" } else { "" };
            println!("  {}. {}{}", i + 1, opt, mark);
        }
        println!();
    }
}

fn print_apply(summary: &ApplySummary) {
    let level = summary.level.map(|l| l.to_string()).unwrap_or_default();
    println!(
        "Applied level={} chapters={} to {} entries and {} questions; chapters set on {} entries and {} questions.",
        level,
        summary.chapters,
        summary.entries_level_updated,
        summary.questions_level_updated,
        summary.entries_chapter_updated,
        summary.questions_chapter_updated
    );
}
