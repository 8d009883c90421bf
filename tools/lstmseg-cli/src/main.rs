//! LSTM Segmentation Model Tool
//!
//! Converts trained weight dumps into resource bundles and runs the models
//! for segmentation and evaluation.

use std::fs;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lstmseg_core::{
    BundleConfig, Evaluator, EvaluatorConfig, InferenceConfig, ModelDescriptor, Segmenter,
    SegmenterConfig, codec,
};
use tracing::{Level, info, warn};

/// CLI arguments
#[derive(Parser)]
#[command(name = "lstmseg")]
#[command(about = "Convert, inspect and run bi-directional LSTM word segmentation models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log pipeline details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a JSON weight dump into a resource bundle
    Convert {
        /// JSON weight dump
        #[arg(short, long)]
        input: PathBuf,
        /// Bundle to write
        #[arg(short, long)]
        output: PathBuf,
        /// Omit the leading byte order mark
        #[arg(long, env = "LSTMSEG_NO_BOM")]
        no_bom: bool,
    },
    /// Print a JSON summary of a model
    Inspect {
        /// JSON weight dump or resource bundle
        model: PathBuf,
    },
    /// Segment lines read from stdin
    Segment {
        /// JSON weight dump or resource bundle
        #[arg(short, long, env = "LSTMSEG_MODEL")]
        model: PathBuf,
        /// Print BIES tags instead of `|`-delimited words
        #[arg(long)]
        bies: bool,
        /// Run both LSTM directions on separate threads
        #[arg(long)]
        parallel: bool,
    },
    /// Score a model against `|`-segmented gold text
    Evaluate {
        /// JSON weight dump or resource bundle
        #[arg(short, long, env = "LSTMSEG_MODEL")]
        model: PathBuf,
        /// Gold file, one `|`-segmented line per line
        file: PathBuf,
        /// Include the score of every line in the report
        #[arg(long)]
        per_line: bool,
        /// Join lines under 30 chars until they reach 50 before scoring
        #[arg(long)]
        merge_short_lines: bool,
    },
}

/// Load a model from a `.json` weight dump or, for any other extension, a bundle.
fn load_model(path: &Path) -> Result<ModelDescriptor> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let model = if is_json {
        ModelDescriptor::from_json_path(path)
    } else {
        codec::decode_path(path)
    };
    model.with_context(|| format!("Failed to load model from {}", path.display()))
}

fn segmenter_for(path: &Path, parallel: bool) -> Result<Segmenter> {
    let model = load_model(path)?;
    let config = SegmenterConfig::new()
        .with_inference(InferenceConfig::new().with_parallel_directions(parallel));
    Ok(Segmenter::new(model, config))
}

fn convert(input: &Path, output: &Path, no_bom: bool) -> Result<()> {
    let model = ModelDescriptor::from_json_path(input)
        .with_context(|| format!("Failed to read weight dump {}", input.display()))?;
    let config = BundleConfig::new().with_byte_order_mark(!no_bom);
    codec::write_file(output, &model, &config)
        .with_context(|| format!("Failed to write bundle {}", output.display()))?;
    info!(
        "Converted {} ({} entries, {} parameters)",
        model.model_name(),
        model.dictionary().len(),
        model.summary().parameters
    );
    Ok(())
}

fn segment<R: BufRead, W: Write>(segmenter: &Segmenter, bies: bool, input: R, output: W) -> Result<()> {
    let mut output = BufWriter::new(output);
    for (no, line) in input.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        let text = line.trim_end_matches('\r');
        let result = if bies {
            segmenter.bies(text)
        } else {
            segmenter.segment_to_string(text)
        };
        let result = result.with_context(|| format!("Failed to segment line {}", no + 1))?;
        writeln!(output, "{result}")?;
    }
    output.flush()?;
    Ok(())
}

const SHORT_LINE: usize = 30;
const MERGE_TARGET: usize = 50;

fn evaluate(segmenter: &Segmenter, file: &Path, per_line: bool, merge_short_lines: bool) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read gold file {}", file.display()))?;

    let mut config = EvaluatorConfig::new();
    if merge_short_lines {
        config = config.with_short_line_merging(SHORT_LINE, MERGE_TARGET);
    }
    let mut evaluator = Evaluator::new(segmenter).with_config(config);
    evaluator
        .add_text(&text)
        .with_context(|| format!("Failed to evaluate {}", file.display()))?;
    let mut report = evaluator.finish();
    info!(
        "Scored {} lines, mean accuracy {:.4}",
        report.lines.len(),
        report.mean_accuracy
    );
    if !report.skipped.is_empty() {
        warn!("Skipped {} gold lines that split a cluster", report.skipped.len());
    }

    if !per_line {
        report.lines.clear();
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match cli.command {
        Commands::Convert {
            input,
            output,
            no_bom,
        } => convert(&input, &output, no_bom)?,
        Commands::Inspect { model } => {
            let model = load_model(&model)?;
            println!("{}", serde_json::to_string_pretty(&model.summary())?);
        }
        Commands::Segment {
            model,
            bies,
            parallel,
        } => {
            let segmenter = segmenter_for(&model, parallel)?;
            segment(&segmenter, bies, io::stdin().lock(), io::stdout().lock())?;
        }
        Commands::Evaluate {
            model,
            file,
            per_line,
            merge_short_lines,
        } => {
            let segmenter = segmenter_for(&model, false)?;
            evaluate(&segmenter, &file, per_line, merge_short_lines)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::try_parse_from(["lstmseg", "convert", "-i", "m.json", "-o", "m.txt", "--no-bom"])
            .unwrap();
        match cli.command {
            Commands::Convert {
                input,
                output,
                no_bom,
            } => {
                assert_eq!(input, PathBuf::from("m.json"));
                assert_eq!(output, PathBuf::from("m.txt"));
                assert!(no_bom);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_parse_evaluate() {
        let cli = Cli::try_parse_from([
            "lstmseg",
            "evaluate",
            "-m",
            "m.txt",
            "gold.txt",
            "--merge-short-lines",
        ])
        .unwrap();
        match cli.command {
            Commands::Evaluate {
                model,
                file,
                per_line,
                merge_short_lines,
            } => {
                assert_eq!(model, PathBuf::from("m.txt"));
                assert_eq!(file, PathBuf::from("gold.txt"));
                assert!(!per_line);
                assert!(merge_short_lines);
            }
            _ => panic!("expected evaluate"),
        }
    }

    const DUMP: &str = r#"{
        "model": "Thai_codepoints_cli",
        "dic": {"ก": 0, "ข": 1},
        "mat1": {"dim": [3, 1], "data": [0.5, -0.5, 0.0]},
        "mat2": {"dim": [1, 4], "data": [0.1, 0.2, 0.3, 0.4]},
        "mat3": {"dim": [1, 4], "data": [0.1, 0.1, 0.1, 0.1]},
        "mat4": {"dim": [4], "data": [0.0, 0.0, 0.0, 0.0]},
        "mat5": {"dim": [1, 4], "data": [0.4, 0.3, 0.2, 0.1]},
        "mat6": {"dim": [1, 4], "data": [0.1, 0.1, 0.1, 0.1]},
        "mat7": {"dim": [4], "data": [0.0, 0.0, 0.0, 0.0]},
        "mat8": {"dim": [2, 4], "data": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]},
        "mat9": {"dim": [4], "data": [0.0, 0.0, 0.0, 6.0]}
    }"#;

    #[test]
    fn test_convert_then_segment() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("Thai_codepoints_cli.json");
        let bundle = dir.path().join("Thai_codepoints_cli.txt");
        fs::write(&json, DUMP).unwrap();

        convert(&json, &bundle, true).unwrap();
        let text = fs::read_to_string(&bundle).unwrap();
        assert!(text.starts_with("// "));
        assert_eq!(load_model(&bundle).unwrap(), load_model(&json).unwrap());

        let segmenter = segmenter_for(&bundle, false).unwrap();
        let mut out = Vec::new();
        segment(&segmenter, false, io::Cursor::new("กข\r\n\nขก\n"), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "|ก|ข|\n\n|ข|ก|\n");

        let mut out = Vec::new();
        segment(&segmenter, true, io::Cursor::new("กขก\n"), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "sss\n");
    }

    #[test]
    fn test_load_model_reports_path() {
        let err = load_model(Path::new("/nonexistent/Thai_codepoints_x.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/Thai_codepoints_x.json"));
    }
}
