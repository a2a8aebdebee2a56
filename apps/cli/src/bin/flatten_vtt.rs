//! Print the flattened transcript of a WebVTT file, one line per row.

use std::path::PathBuf;

use clap::Parser;
use console::style;
use ytprep_core::flatten_vtt;

#[derive(Parser)]
#[command(name = "flatten-vtt")]
#[command(about = "Flatten a WebVTT caption file into deduplicated plain text")]
struct Cli {
    /// Path to the .vtt file
    file: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let raw = match tokio::fs::read_to_string(&cli.file).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            eprintln!(
                "{} File '{}' not found.",
                style("Error:").red().bold(),
                cli.file.display()
            );
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    match flatten_vtt(&raw) {
        Ok(transcript) => {
            for line in transcript.lines() {
                println!("{}", line);
            }
        }
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    }
}
