use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use anomaly_lens::analysis::score;
use anomaly_lens::data::filter::{filtered_indices, parse_selectors};
use anomaly_lens::data::loader::load_file;
use anomaly_lens::export::{normalize_values, write_csv, write_report_json};
use anomaly_lens::{Dataset, Feedback, Session, Settings};

#[derive(Parser)]
#[command(name = "anomaly-lens")]
#[command(about = "Flag statistical outliers in time-series datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a dataset and list the flagged points
    Detect {
        #[command(flatten)]
        input: InputArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summary statistics, trend and seasonality findings
    Insights {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Write every point with its anomaly flag and feedback as CSV
    Export {
        #[command(flatten)]
        input: InputArgs,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,

        /// Per-point verdict, e.g. `--feedback 12=positive` (repeatable)
        #[arg(long, value_parser = parse_feedback)]
        feedback: Vec<(usize, Feedback)>,

        /// Write values min-max scaled into [0, 1]
        #[arg(long)]
        normalize: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Input file (CSV, JSON or Parquet)
    file: PathBuf,

    /// Z-score threshold in standard deviations (overrides the config file)
    #[arg(short, long, allow_negative_numbers = true)]
    threshold: Option<f64>,

    /// Settings file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep only rows whose metadata matches, e.g. `--where sensor=A` (repeatable)
    #[arg(long = "where", value_name = "COLUMN=VALUE")]
    filters: Vec<String>,
}

fn parse_feedback(s: &str) -> std::result::Result<(usize, Feedback), String> {
    let (index, verdict) = s
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=positive|negative, got '{s}'"))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("bad index '{index}': {e}"))?;
    let verdict = match verdict.trim() {
        "positive" => Feedback::Positive,
        "negative" => Feedback::Negative,
        other => return Err(format!("unknown verdict '{other}'")),
    };
    Ok((index, verdict))
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        log::error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Detect { input, json } => {
            let session = open_session(&input)?;
            if json {
                write_report_json(io::stdout().lock(), session.report())?;
            } else {
                print_report(&session);
            }
        }
        Commands::Insights { input } => {
            let session = open_session(&input)?;
            let insights = session.insights();
            if insights.is_empty() {
                println!("No data points provided for analysis.");
            }
            for insight in insights {
                println!(
                    "[{}] {} (confidence {:.2})",
                    insight.kind, insight.message, insight.confidence
                );
            }
        }
        Commands::Export {
            input,
            output,
            feedback,
            normalize,
        } => {
            let mut session = open_session(&input)?;
            for (index, verdict) in feedback {
                session
                    .set_feedback(index, verdict)
                    .with_context(|| format!("recording feedback for point {index}"))?;
            }
            let file = std::fs::File::create(&output)
                .with_context(|| format!("creating {}", output.display()))?;
            let mut rows = session.rows();
            if normalize {
                normalize_values(&mut rows);
            }
            write_csv(file, &rows)?;
            log::info!("Wrote {} rows to {}", rows.len(), output.display());
        }
    }
    Ok(())
}

/// Settings from file plus flags, then the filtered dataset, scored.
fn open_session(input: &InputArgs) -> Result<Session> {
    let mut settings = match &input.config {
        Some(path) => {
            Settings::load(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Settings::default(),
    };
    if let Some(t) = input.threshold {
        settings.threshold = t;
    }
    settings.validate()?;

    let mut dataset = load(&input.file)?;
    if !input.filters.is_empty() {
        let filters = parse_selectors(input.filters.as_slice())?;
        for (col, selected) in &filters {
            let shown: Vec<String> = selected.iter().map(ToString::to_string).collect();
            log::debug!("filter {col}: {}", shown.join(", "));
        }
        let keep = filtered_indices(&dataset, &filters);
        log::info!("Filter kept {} of {} points", keep.len(), dataset.len());
        dataset = dataset.subset(&keep);
    }

    let mut session = Session::new(settings);
    session.set_dataset(dataset);
    Ok(session)
}

fn load(path: &Path) -> Result<Dataset> {
    load_file(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn print_report(session: &Session) {
    let report = session.report();
    println!("{}", report.explanation);

    if let Some(summary) = session.summary() {
        println!(
            "{} points, mean {:.4}, std dev {:.4}, range {:.4} .. {:.4}",
            summary.count, summary.mean, summary.std_dev, summary.min, summary.max
        );
    }

    if report.detected {
        let rows = session.rows();
        let values: Vec<f64> = rows.iter().map(|r| r.value).collect();
        let scores = score(&values);
        for &i in &report.indices {
            println!(
                "  #{i:<6} {:<28} value {:>12.4}  score {:>6.2}",
                rows[i].timestamp.unwrap_or("-"),
                rows[i].value,
                scores[i]
            );
        }
    }

    let baseline = session.baseline_deviations();
    if !baseline.is_empty() {
        let s = session.settings();
        println!(
            "{} points are more than {} away from their {}-point moving average",
            baseline.len(),
            s.baseline_threshold,
            s.moving_average_window
        );
    }
}
