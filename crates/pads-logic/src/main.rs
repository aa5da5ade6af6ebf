use clap::Parser;
use pads_logic::{check_file_header, parse_file, LogReporter, ParseOptions};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pads-logic", about = "Dump a PADS Logic ASCII schematic as JSON")]
struct Cli {
    /// Input PADS Logic ASCII export (.txt, .asc)
    input: PathBuf,

    /// Output JSON file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Only check the file header; prints true/false
    #[arg(long)]
    check: bool,

    /// Print record counts instead of the full document
    #[arg(long)]
    summary: bool,

    /// Only output parts, signals and nodes on this sheet
    #[arg(long)]
    sheet: Option<i64>,

    /// Skip the cross-section resolution pass
    #[arg(long)]
    raw: bool,
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if cli.check {
        let ok = check_file_header(&cli.input);
        println!("{ok}");
        std::process::exit(if ok { 0 } else { 1 });
    }

    let opts = ParseOptions {
        resolve_references: !cli.raw,
    };
    let mut reporter = LogReporter;

    let doc = match parse_file(&cli.input, &opts, &mut reporter) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let json = if cli.summary {
        to_json(&doc.summary(), cli.pretty)
    } else if let Some(sheet) = cli.sheet {
        to_json(&doc.sheet_view(sheet), cli.pretty)
    } else {
        to_json(&doc, cli.pretty)
    };
    let json = match json {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: JSON serialization failed: {e}");
            std::process::exit(1);
        }
    };

    if let Some(output_path) = cli.output {
        if let Err(e) = std::fs::write(&output_path, &json) {
            eprintln!("Error writing {}: {e}", output_path.display());
            std::process::exit(1);
        }
        eprintln!("Written to {}", output_path.display());
    } else {
        println!("{json}");
    }
}
