use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use tensaku::alignment::coverage;
use tensaku::config::{Config, LogFormat};
use tensaku::constraints::WordRange;
use tensaku::reader::{read_points, read_text};
use tensaku::{process_submissions, split_japanese_sentences, write_stats, SubmissionPipeline};

#[derive(Parser, Debug)]
#[command(name = "tensaku")]
#[command(about = "Normalize, segment and align corrections for English essay submissions")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the normalized submission
    Normalize {
        /// Submission file, or - for stdin
        input: String,
    },
    /// Print one `index<TAB>sentence` line per sentence
    Segment {
        /// Submission file, or - for stdin
        input: String,
    },
    /// Print word-range and unit checks as JSON
    Check {
        /// Submission file, or - for stdin
        input: String,
        #[arg(long)]
        min_words: Option<usize>,
        #[arg(long)]
        max_words: Option<usize>,
        #[arg(long)]
        required_units: Option<u8>,
    },
    /// Align LLM correction points against a submission and print them as JSON
    Align {
        /// Submission file, or - for stdin
        #[arg(long)]
        submission: String,
        /// JSON file with the raw points
        #[arg(long)]
        points: String,
        /// Japanese source text used as reference sentences
        #[arg(long)]
        source: Option<String>,
        /// Fill placeholders up to this many points
        #[arg(long)]
        required: Option<usize>,
    },
    /// Process many submission files concurrently
    Batch {
        files: Vec<PathBuf>,
        /// Stats output file path
        #[arg(long, default_value = "run_stats.json")]
        stats_out: PathBuf,
        /// Abort on first error
        #[arg(long)]
        fail_fast: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    // WHY: logs go to stderr so stdout stays clean for command output
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(config.log.max_level()?)
        .with_writer(std::io::stderr);
    match config.log.format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.init(),
    }

    info!(?args, "Parsed CLI arguments");
    let pipeline = SubmissionPipeline::new()?;

    match args.command {
        Command::Normalize { input } => {
            let text = read_text(&input).await?;
            println!("{}", pipeline.process(&text).normalized);
        }
        Command::Segment { input } => {
            let text = read_text(&input).await?;
            let processed = pipeline.process(&text);
            for sentence in &processed.sentences {
                println!("{}", pipeline.segmenter().format_sentence_output(sentence));
            }
        }
        Command::Check {
            input,
            min_words,
            max_words,
            required_units,
        } => {
            let text = read_text(&input).await?;
            let range = WordRange {
                min: min_words.unwrap_or(config.word_range.min),
                max: max_words.unwrap_or(config.word_range.max),
            };
            if range.min > range.max {
                anyhow::bail!("--min-words ({}) is greater than --max-words ({})", range.min, range.max);
            }
            let report = pipeline.check(&text, range, required_units.unwrap_or(config.required_units));
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Align {
            submission,
            points,
            source,
            required,
        } => {
            let text = read_text(&submission).await?;
            let raw_points = read_points(&points).await?;
            let source_text = match &source {
                Some(path) => read_text(path).await?,
                None => String::new(),
            };
            let reference = split_japanese_sentences(&source_text);

            let processed = pipeline.process(&text);
            let mut aligned = pipeline.align(&processed, &raw_points, &reference);
            let required = required.or_else(|| {
                source
                    .as_ref()
                    .map(|_| coverage::required_points(&source_text, &processed.normalized, pipeline.segmenter()))
            });
            if let Some(required) = required {
                coverage::fill_placeholders(&mut aligned, required, &reference);
            }
            println!("{}", serde_json::to_string_pretty(&aligned)?);
        }
        Command::Batch {
            files,
            stats_out,
            fail_fast,
        } => {
            if files.is_empty() {
                anyhow::bail!("No submission files given");
            }
            let mut batch_config = config.batch_config();
            batch_config.fail_fast |= fail_fast;

            let run = process_submissions(Arc::new(pipeline), &files, &batch_config).await?;
            write_stats(&stats_out, &run)
                .await
                .with_context(|| format!("Failed to write stats to {}", stats_out.display()))?;

            println!("tensaku v{} - batch complete", env!("CARGO_PKG_VERSION"));
            println!("  Processed: {} files", run.files_processed);
            if run.files_failed > 0 {
                println!("  Failed: {} files", run.files_failed);
            }
            println!("  Total words: {}", run.total_words);
            println!("  Stats written to {}", stats_out.display());
        }
    }

    Ok(())
}
