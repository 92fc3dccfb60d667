use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;

use aggplot::{export, telemetry, ChartConfigStore, Translator};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "aggplot")]
#[command(about = "Translate search aggregation responses into chart data", long_about = None)]
struct Args {
    /// Chart configuration document (JSON object keyed by chart id)
    #[arg(short, long)]
    config: PathBuf,

    /// Chart id to translate
    #[arg(long)]
    chart: String,

    /// Aggregation response; read from stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let _ = telemetry::init_default_tracing();
    let args = Args::parse();

    let store = ChartConfigStore::from_path(&args.config)
        .context("Failed to load chart configuration")?;
    let translator = Translator::new(store);

    let response = read_response(args.input.as_ref())?;
    let dto = translator
        .translate(&args.chart, &response)
        .with_context(|| format!("Failed to translate chart '{}'", args.chart))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match args.format {
        OutputFormat::Json => {
            let json = if args.pretty {
                dto.to_json_pretty()?
            } else {
                serde_json::to_string(&dto)?
            };
            writeln!(handle, "{json}").context("Failed to write JSON to stdout")?;
        }
        OutputFormat::Csv => {
            export::write_csv(&dto, &mut handle).context("Failed to write CSV to stdout")?;
        }
    }
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

fn read_response(input: Option<&PathBuf>) -> Result<Value> {
    let value = match input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open response {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse response {}", path.display()))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read response from stdin")?;
            serde_json::from_str(&buf).context("Failed to parse response from stdin")?
        }
    };
    Ok(value)
}
