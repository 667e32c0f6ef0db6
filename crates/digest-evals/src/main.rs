use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use digest_evals::cases::load_cases;
use digest_evals::config::Config;
use digest_evals::report::{format_report, write_eval_report};
use digest_evals::runner::run_all;
use digest_evals::summary::{load_summary_cases, run_all_cases, summarize_results};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    // 1. Load config from environment
    let config = Config::from_env()?;
    info!(
        fixtures_dir = %config.fixtures_dir.display(),
        artifacts_dir = %config.artifacts_dir.display(),
        now = %config.now,
        "configuration loaded"
    );

    // 2. Ranking battery
    let cases = load_cases(&config.fixtures_dir);
    let ranking = run_all(&cases, config.now)?;
    println!("{}", format_report(&ranking));

    // 3. Summary-quality battery
    let summary_results = run_all_cases(&load_summary_cases());
    let summary = summarize_results(&summary_results);
    println!();
    println!(
        "SUMMARY EVALS: total={} passed={} failed={} pass_rate={}%",
        summary.total, summary.passed, summary.failed, summary.pass_rate
    );
    for failure in &summary.failures {
        println!(
            "FAIL: {} EXPECTED: {:?} ACTUAL: {:?}",
            failure.name, failure.expected, failure.actual
        );
    }

    // 4. Durable artifact
    let path = write_eval_report(&ranking, &config.day(), &config.artifacts_dir)?;
    println!("WROTE {}", path.display());

    if ranking.failed > 0 || summary.failed > 0 {
        error!(
            ranking_failed = ranking.failed,
            summary_failed = summary.failed,
            "evals failed"
        );
        std::process::exit(1);
    }
    Ok(())
}
