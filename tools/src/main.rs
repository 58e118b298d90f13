//! tape-runner: build the synthetic mortgage loan tape and its rollups.
//!
//! Usage:
//!   tape-runner [run|generate|load|export|doctor] [--root DIR] [--loans N] [--seed S] [--json]
//!
//! `run` (the default) generates the tape, loads it and exports the CSVs.

use anyhow::{bail, Result};
use loantape_core::{
    config::TapeConfig,
    export::ExportReport,
    pipeline::{self, GenerateSummary, RollupPreview},
};
use std::env;
use std::process::ExitCode;

const COMMANDS: [&str; 5] = ["run", "generate", "load", "export", "doctor"];

fn main() -> ExitCode {
    env_logger::init();

    match run_cli(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_cli(args: Vec<String>) -> Result<()> {
    let command = args
        .get(1)
        .filter(|a| !a.starts_with("--"))
        .map(String::as_str)
        .unwrap_or("run");
    if !COMMANDS.contains(&command) {
        bail!("unknown command '{command}' (expected one of {})", COMMANDS.join(", "));
    }

    let root = find_arg(&args, "--root").unwrap_or(".");
    let mut config = TapeConfig::load(root)?;
    if let Some(n) = parse_arg::<usize>(&args, "--loans")? {
        config.loan_count = n;
    }
    if let Some(seed) = parse_arg::<u64>(&args, "--seed")? {
        config.seed = seed;
    }
    let json = args.iter().any(|a| a == "--json");

    log::debug!("tape-runner: {command} with {config:?}");

    match command {
        "generate" => {
            let summary = pipeline::generate(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_generate(&summary);
            }
        }
        "load" => {
            let rows = pipeline::load(&config)?;
            println!("✅ Loaded {rows} loans into loan_tape from {}", config.tape_path().display());
        }
        "export" => {
            let report = pipeline::export(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_export(&report);
            }
        }
        "doctor" => {
            let report = pipeline::sanity_check(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("✅ Repo root:        {}", report.root.display());
                println!("✅ Data dir exists:  {}", report.data_dir_exists);
                println!("✅ Store path:       {}", report.db_path.display());
                println!("✅ Store write/read works. Rows in sanity_check = {}", report.sanity_rows);
            }
        }
        _ => {
            let summary = pipeline::run(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_generate(&summary.generate);
                println!();
                print_export(&summary.export);
            }
        }
    }
    Ok(())
}

fn print_generate(summary: &GenerateSummary) {
    println!(
        "✅ Wrote {} loans → {} (seed {})",
        group_thousands(summary.tape.rows as i64),
        summary.tape.path.display(),
        summary.seed
    );
    println!();
    print_preview(&summary.preview);
    println!();
    println!("✅ Store table created: loan_tape ({} rows)", summary.loaded_rows);
}

fn print_preview(preview: &RollupPreview) {
    println!("--- Portfolio rollups ---");
    println!("WAC (weighted avg coupon): {:.3}%", preview.wac);

    println!();
    println!("Top {} states by balance:", preview.top_states.len());
    for s in &preview.top_states {
        println!(
            "  {}: loans={} balance=${}",
            s.state,
            group_thousands(s.loan_count),
            group_thousands(s.total_balance)
        );
    }

    println!();
    println!("Most common FICO/LTV bands (top {}):", preview.top_bands.len());
    for b in &preview.top_bands {
        println!(
            "  {:12} | {:5} | {}",
            b.fico_band,
            b.ltv_band,
            group_thousands(b.loan_count)
        );
    }
}

fn print_export(report: &ExportReport) {
    for file in [&report.state_summary, &report.band_distribution] {
        println!("✅ Exported: {} ({} rows)", file.path.display(), file.rows);
    }
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>> {
    match find_arg(args, flag) {
        None => Ok(None),
        Some(raw) => match raw.parse() {
            Ok(v) => Ok(Some(v)),
            Err(_) => bail!("invalid value '{raw}' for {flag}"),
        },
    }
}

/// 1234567 -> "1,234,567"
fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        format!("-{out}")
    } else {
        out
    }
}
