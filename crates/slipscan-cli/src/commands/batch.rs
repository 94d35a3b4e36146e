//! Batch processing command for many slips.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use slipscan_connectors::VisionOcr;
use slipscan_core::{ParsedSlip, SlipParser};

use super::load_config;
use super::parse::{build_parser, format_slip, OutputFormat};
use super::process::{optional_ocr, recognize_and_parse};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern (OCR text files or slip images)
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    slip: Option<ParsedSlip>,
    error: Option<String>,
    processing_time_ms: u64,
}

enum InputKind {
    Text,
    Image,
}

fn input_kind(path: &Path) -> Option<InputKind> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "txt" => Some(InputKind::Text),
        "png" | "jpg" | "jpeg" => Some(InputKind::Image),
        _ => None,
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| input_kind(p).is_some())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let parser = build_parser(&config, None)?;
    let ocr = optional_ocr(&config)?;

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let result = process_single_file(&path, &parser, ocr.as_ref()).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(slip) => results.push(ProcessResult {
                path,
                slip: Some(slip),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        slip: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    progress.abandon();
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        progress.inc(1);
    }

    progress.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.slip.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(slip) = &result.slip {
                let output_name = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("slip");
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, format_slip(slip, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

async fn process_single_file(
    path: &Path,
    parser: &SlipParser,
    ocr: Option<&VisionOcr>,
) -> anyhow::Result<ParsedSlip> {
    match input_kind(path) {
        Some(InputKind::Text) => {
            let text = fs::read_to_string(path)?;
            if text.trim().is_empty() {
                anyhow::bail!("Empty OCR text file");
            }
            Ok(parser.parse(&text))
        }
        Some(InputKind::Image) => {
            let ocr = ocr.ok_or_else(|| {
                anyhow::anyhow!("No OCR credentials configured for image input")
            })?;
            let (slip, _) = recognize_and_parse(path, ocr, parser).await?;
            Ok(slip)
        }
        None => anyhow::bail!("Unsupported file format: {}", path.display()),
    }
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "slip_id",
        "paid_at",
        "amount",
        "bank_account",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(slip) = &result.slip {
            wtr.write_record([
                filename,
                "success",
                &slip.slip_id,
                &slip.paid_at_string(),
                &slip.amount.map(|a| a.to_string()).unwrap_or_default(),
                &slip.bank_account,
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_input_kind() {
        assert!(matches!(input_kind(Path::new("a/slip.TXT")), Some(InputKind::Text)));
        assert!(matches!(input_kind(Path::new("slip.jpeg")), Some(InputKind::Image)));
        assert!(input_kind(Path::new("slip.pdf")).is_none());
    }

    #[tokio::test]
    async fn test_text_file_without_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slip.txt");
        fs::write(&path, "2024-03-05 14:30\n123-4-56789-0\n1,234.50 บาท").unwrap();

        let slip = process_single_file(&path, &SlipParser::new(), None).await.unwrap();

        assert_eq!(slip.slip_id, "SCN-20240305-143000");
        assert_eq!(slip.bank_account, "123-4-56789-0");
    }

    #[tokio::test]
    async fn test_image_requires_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slip.jpg");
        fs::write(&path, [0xFF, 0xD8]).unwrap();

        assert!(process_single_file(&path, &SlipParser::new(), None).await.is_err());
    }

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let summary = dir.path().join("summary.csv");
        let results = vec![ProcessResult {
            path: PathBuf::from("bad.txt"),
            slip: None,
            error: Some("Empty OCR text file".to_string()),
            processing_time_ms: 3,
        }];

        write_summary(&summary, &results).unwrap();

        assert_eq!(
            fs::read_to_string(&summary).unwrap(),
            "filename,status,slip_id,paid_at,amount,bank_account,processing_time_ms,error\n\
             bad.txt,error,,,,,3,Empty OCR text file\n"
        );
    }
}
