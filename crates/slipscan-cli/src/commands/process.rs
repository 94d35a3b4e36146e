//! Process command - OCR a slip image and parse the result.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info, warn};

use slipscan_connectors::VisionOcr;
use slipscan_core::{OcrProvider, ParsedSlip, SlipParser, SlipscanConfig};

use super::load_config;
use super::parse::{build_parser, format_slip, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Slip image (JPEG or PNG)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also print the recognized text to stderr
    #[arg(long)]
    show_text: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !config.has_ocr_credentials() {
        anyhow::bail!(
            "No OCR credentials configured. Set ocr.api_key or the SLIPSCAN_VISION_API_KEY environment variable."
        );
    }

    let ocr = VisionOcr::from_config(&config.ocr)?;
    let parser = build_parser(&config, None)?;

    let (slip, text) = recognize_and_parse(&args.input, &ocr, &parser).await?;
    debug!("Processed {} in {:?}", args.input.display(), start.elapsed());

    if args.show_text {
        eprintln!("{}", style("Recognized text:").bold());
        eprintln!("{}", text);
    }

    let output = format_slip(&slip, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    Ok(())
}

/// Read one image, OCR it and parse the text.
pub async fn recognize_and_parse(
    path: &Path,
    ocr: &dyn OcrProvider,
    parser: &SlipParser,
) -> anyhow::Result<(ParsedSlip, String)> {
    let image = fs::read(path)?;
    if image.is_empty() {
        anyhow::bail!("Image file is empty: {}", path.display());
    }

    info!("Recognizing {} ({} bytes)", path.display(), image.len());
    let recognized = ocr.recognize(&image).await?;
    if let Some(detail) = &recognized.debug {
        debug!("OCR: {}", detail);
    }

    if recognized.text.trim().is_empty() {
        warn!("No text detected in {}", path.display());
    }

    Ok((parser.parse(&recognized.text), recognized.text))
}

/// OCR client when credentials are configured.
pub fn optional_ocr(config: &SlipscanConfig) -> anyhow::Result<Option<VisionOcr>> {
    if config.has_ocr_credentials() {
        Ok(Some(VisionOcr::from_config(&config.ocr)?))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use slipscan_core::{OcrError, OcrText, PaidAtSource};

    struct CannedOcr(&'static str);

    #[async_trait]
    impl OcrProvider for CannedOcr {
        async fn recognize(&self, _image: &[u8]) -> Result<OcrText, OcrError> {
            Ok(OcrText {
                text: self.0.to_string(),
                debug: None,
            })
        }
    }

    #[tokio::test]
    async fn test_recognize_and_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slip.jpg");
        fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();

        let ocr = CannedOcr("2024-03-05 14:30\n500.00 บาท");
        let (slip, text) = recognize_and_parse(&path, &ocr, &SlipParser::new())
            .await
            .unwrap();

        assert_eq!(slip.slip_id, "SCN-20240305-143000");
        assert_eq!(text, "2024-03-05 14:30\n500.00 บาท");
    }

    #[tokio::test]
    async fn test_blank_text_yields_default_slip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slip.jpg");
        fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();

        let (slip, text) = recognize_and_parse(&path, &CannedOcr("  \n"), &SlipParser::new())
            .await
            .unwrap();

        assert_eq!(text, "  \n");
        assert_eq!(slip.amount, None);
        assert_eq!(slip.bank_account, "");
        assert_eq!(slip.paid_at_source, PaidAtSource::ProcessingTime);
    }

    #[test]
    fn test_optional_ocr_without_credentials() {
        assert!(optional_ocr(&SlipscanConfig::default()).unwrap().is_none());
    }
}
