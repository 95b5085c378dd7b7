use anyhow::{bail, Context};
use clap::Parser;
use itertools::Itertools;
use logbrain::brain::BrainParser;
use logbrain::config::Config;
use logbrain::types::ParseResult;
use regex::Regex;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "logbrain", version, about = "Log template mining with the Brain algorithm")]
struct Cli {
    /// Input log file.
    input: PathBuf,

    /// Input file type: auto, text or csv.
    #[arg(long = "type", default_value = "auto")]
    file_type: String,

    /// CSV column holding the log message.
    #[arg(long = "csv-column", default_value = "message")]
    csv_column: String,

    /// Regex extracting the message from structured lines; must contain a
    /// named capture group `message`. Non-matching lines are skipped.
    #[arg(long = "log-regex")]
    log_regex: Option<String>,

    /// Token delimiter regex.
    #[arg(long = "delimiters", default_value = r"[\s,:=]+")]
    delimiters: String,

    /// Child branch threshold.
    #[arg(long = "threshold", default_value_t = 3)]
    threshold: usize,

    /// Frequency-threshold weight in [0, 1].
    #[arg(long = "weight", default_value_t = 0.0)]
    weight: f64,

    /// Derive branch thresholds from column statistics.
    #[arg(long = "dynamic", default_value_t = true, action = clap::ArgAction::Set)]
    dynamic: bool,

    /// Dynamic threshold factor.
    #[arg(long = "dynamic-factor", default_value_t = 2.0)]
    dynamic_factor: f64,

    /// Statistical refinement of the dynamic threshold.
    #[arg(long = "statistical", default_value_t = false)]
    statistical: bool,

    /// Enhanced post-processing (entropy/hash/base64/timestamp heuristics
    /// plus the low-quality reparse loop).
    #[arg(long = "enhanced", default_value_t = false)]
    enhanced: bool,

    /// Minimum group size for parallel group processing.
    #[arg(long = "parallel-threshold", default_value_t = 1000)]
    parallel_threshold: usize,

    // Enhanced-mode tuning.
    #[arg(long = "entropy-threshold", default_value_t = 0.85)]
    entropy_threshold: f64,
    #[arg(long = "min-entropy-length", default_value_t = 10)]
    min_entropy_length: usize,
    #[arg(long = "max-consecutive-wildcards", default_value_t = 5)]
    max_consecutive_wildcards: usize,
    #[arg(long = "min-content-ratio", default_value_t = 0.25)]
    min_content_ratio: f64,
    #[arg(long = "timestamp-min-digits", default_value_t = 8)]
    timestamp_min_digits: usize,
    #[arg(long = "timestamp-min-separators", default_value_t = 2)]
    timestamp_min_separators: usize,

    /// Minimum count for a template to be shown.
    #[arg(long = "min-count", default_value_t = 1)]
    min_count: usize,

    /// Output format: table, json or csv.
    #[arg(long = "format", default_value = "table")]
    format: String,

    /// Include log ids in the output.
    #[arg(long = "verbose", short = 'v', default_value_t = false)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let lines = read_input(&cli.input, &cli.file_type, &cli.csv_column, cli.log_regex.as_deref())?;
    if lines.is_empty() {
        eprintln!("no log lines found in {}", cli.input.display());
        return Ok(());
    }
    eprintln!("processing {} log lines", lines.len());

    let config = Config {
        delimiters: cli.delimiters.clone(),
        child_branch_threshold: cli.threshold,
        weight: cli.weight,
        use_dynamic_threshold: cli.dynamic,
        dynamic_threshold_factor: cli.dynamic_factor,
        use_statistical_threshold: cli.statistical,
        use_enhanced_post_processing: cli.enhanced,
        parallel_processing_threshold: cli.parallel_threshold,
        entropy_threshold: cli.entropy_threshold,
        min_entropy_length: cli.min_entropy_length,
        max_consecutive_wildcards: cli.max_consecutive_wildcards,
        min_content_words_ratio: cli.min_content_ratio,
        timestamp_min_digits: cli.timestamp_min_digits,
        timestamp_min_separators: cli.timestamp_min_separators,
        ..Config::default()
    };

    let parser = BrainParser::new(config).context("invalid configuration")?;
    let results = parser.parse(&lines);

    let shown: Vec<&ParseResult> = results.iter().filter(|r| r.count >= cli.min_count).collect();
    eprintln!(
        "found {} unique templates ({} with count >= {})",
        results.len(),
        shown.len(),
        cli.min_count
    );

    match cli.format.as_str() {
        "json" => print_json(&shown, cli.verbose)?,
        "csv" => print_csv(&shown, cli.verbose)?,
        "table" => print_table(&shown, cli.verbose),
        other => bail!("unsupported output format: {other}"),
    }
    Ok(())
}

fn read_input(
    path: &Path,
    file_type: &str,
    csv_column: &str,
    log_regex: Option<&str>,
) -> anyhow::Result<Vec<String>> {
    let resolved = match file_type {
        "auto" => {
            let is_csv = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);
            if is_csv {
                "csv"
            } else {
                "text"
            }
        }
        other => other,
    };

    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    match resolved {
        "csv" => read_csv(file, csv_column),
        "text" => read_text(file, log_regex),
        other => bail!("unsupported file type: {other}"),
    }
}

fn read_text(reader: impl Read, log_regex: Option<&str>) -> anyhow::Result<Vec<String>> {
    let regex = log_regex
        .map(|pattern| Regex::new(pattern).context("invalid log regex"))
        .transpose()?;
    if let Some(re) = &regex {
        if !re.capture_names().flatten().any(|name| name == "message") {
            bail!("log regex must define a named capture group `message`");
        }
    }

    let mut lines = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line.context("error reading input")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match &regex {
            Some(re) => {
                if let Some(m) = re.captures(trimmed).and_then(|c| c.name("message")) {
                    lines.push(m.as_str().to_string());
                }
            }
            None => lines.push(trimmed.to_string()),
        }
    }
    Ok(lines)
}

fn read_csv(reader: impl Read, column: &str) -> anyhow::Result<Vec<String>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers().context("error reading CSV header")?;
    let index = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(column))
        .with_context(|| {
            format!(
                "column `{column}` not found in CSV; available columns: {}",
                headers.iter().join(", ")
            )
        })?;

    let mut lines = Vec::new();
    for record in csv_reader.records() {
        let record = record.context("error reading CSV record")?;
        if let Some(message) = record.get(index) {
            let trimmed = message.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
    }
    Ok(lines)
}

#[derive(Serialize)]
struct TemplateRow<'a> {
    template: &'a str,
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_ids: Option<&'a [usize]>,
}

fn rows<'a>(results: &'a [&ParseResult], verbose: bool) -> Vec<TemplateRow<'a>> {
    results
        .iter()
        .map(|r| TemplateRow {
            template: &r.template,
            count: r.count,
            log_ids: verbose.then_some(r.log_ids.as_slice()),
        })
        .collect()
}

fn print_table(results: &[&ParseResult], verbose: bool) {
    if verbose {
        println!("{:<8} {:<80} LOG_IDS", "COUNT", "TEMPLATE");
    } else {
        println!("{:<8} TEMPLATE", "COUNT");
    }
    for result in results {
        if verbose {
            println!(
                "{:<8} {:<80} {}",
                result.count,
                result.template,
                result.log_ids.iter().join(" ")
            );
        } else {
            println!("{:<8} {}", result.count, result.template);
        }
    }
}

fn print_json(results: &[&ParseResult], verbose: bool) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&rows(results, verbose))?);
    Ok(())
}

fn print_csv(results: &[&ParseResult], verbose: bool) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    if verbose {
        writer.write_record(["template", "count", "log_ids"])?;
    } else {
        writer.write_record(["template", "count"])?;
    }
    for result in results {
        if verbose {
            writer.write_record(&[
                result.template.clone(),
                result.count.to_string(),
                result.log_ids.iter().join(" "),
            ])?;
        } else {
            writer.write_record(&[result.template.clone(), result.count.to_string()])?;
        }
    }
    writer.flush()?;
    Ok(())
}
