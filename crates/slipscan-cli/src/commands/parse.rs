//! Parse command - extract slip fields from OCR text.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use console::style;
use tracing::{debug, info};

use slipscan_core::{FixedClock, ParsedSlip, SlipParser, SlipscanConfig};

use super::load_config;

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// OCR text file (default: stdin; "-" also reads stdin)
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Pin the processing time (RFC 3339) used when the slip has no date
    #[arg(long)]
    now: Option<String>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let parser = build_parser(&config, args.now.as_deref())?;

    let text = match &args.input {
        Some(path) if path.as_os_str() != "-" => {
            info!("Reading OCR text from {}", path.display());
            fs::read_to_string(path)?
        }
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    debug!("Read {} characters", text.len());

    let slip = parser.parse(&text);
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

/// Parser for the configured year mode, optionally with a pinned clock.
pub fn build_parser(config: &SlipscanConfig, now: Option<&str>) -> anyhow::Result<SlipParser> {
    let parser = SlipParser::from_config(&config.extraction);
    match now {
        Some(raw) => {
            let instant = chrono::DateTime::parse_from_rfc3339(raw)
                .map_err(|e| anyhow::anyhow!("Invalid --now value {:?}: {}", raw, e))?;
            Ok(parser.with_clock(Arc::new(FixedClock::new(instant.to_utc()))))
        }
        None => Ok(parser),
    }
}

pub fn format_slip(slip: &ParsedSlip, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(slip)?),
        OutputFormat::Csv => format_csv(std::slice::from_ref(slip)),
        OutputFormat::Text => Ok(format_text(slip)),
    }
}

/// CSV with a header row and one row per slip.
pub fn format_csv(slips: &[ParsedSlip]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["slip_id", "paid_at", "amount", "bank_account", "paid_at_source"])?;

    for slip in slips {
        wtr.write_record([
            slip.slip_id.clone(),
            slip.paid_at_string(),
            slip.amount.map(|a| a.to_string()).unwrap_or_default(),
            slip.bank_account.clone(),
            source_label(slip).to_string(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

pub fn format_text(slip: &ParsedSlip) -> String {
    let mut output = String::new();

    output.push_str(&format!("Slip: {}\n", slip.slip_id));
    output.push_str(&format!("Paid at: {} ({})\n", slip.paid_at_string(), source_label(slip)));
    match slip.amount {
        Some(amount) => output.push_str(&format!("Amount: {:.2} THB\n", amount)),
        None => output.push_str("Amount: -\n"),
    }
    if slip.bank_account.is_empty() {
        output.push_str("Account: -\n");
    } else {
        output.push_str(&format!("Account: {}\n", slip.bank_account));
    }

    output
}

fn source_label(slip: &ParsedSlip) -> &'static str {
    match slip.paid_at_source {
        slipscan_core::PaidAtSource::Iso => "iso",
        slipscan_core::PaidAtSource::Thai => "thai",
        slipscan_core::PaidAtSource::ProcessingTime => "processing_time",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn slip() -> ParsedSlip {
        let parser = build_parser(&SlipscanConfig::default(), Some("2024-06-01T08:00:00+07:00")).unwrap();
        parser.parse("5 มี.ค. 67 14:30\n123-4-56789-0\n1,234.50 บาท")
    }

    #[test]
    fn test_format_csv() {
        assert_eq!(
            format_csv(&[slip()]).unwrap(),
            "slip_id,paid_at,amount,bank_account,paid_at_source\n\
             SCN-20240305-143000,2024-03-05T14:30:00+07:00,1234.50,123-4-56789-0,thai\n"
        );
    }

    #[test]
    fn test_format_text() {
        assert_eq!(
            format_text(&slip()),
            "Slip: SCN-20240305-143000\n\
             Paid at: 2024-03-05T14:30:00+07:00 (thai)\n\
             Amount: 1234.50 THB\n\
             Account: 123-4-56789-0\n"
        );
    }

    #[test]
    fn test_pinned_clock() {
        let parser = build_parser(&SlipscanConfig::default(), Some("2024-06-01T08:00:00+07:00")).unwrap();
        let slip = parser.parse("no date here");

        assert_eq!(slip.slip_id, "SCN-20240601-080000");
    }

    #[test]
    fn test_invalid_now() {
        assert!(build_parser(&SlipscanConfig::default(), Some("yesterday")).is_err());
    }
}
