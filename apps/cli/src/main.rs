use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use ytprep_core::{
    Config, GeminiClient, Pipeline, PipelineResult, PipelineSettings, ProcessOptions,
    ProcessedVideo, YtDlpFetcher,
};

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

#[derive(Parser)]
#[command(name = "ytprep")]
#[command(
    about = "Fetch YouTube metadata and English subtitles, flatten them, and ask Gemini for better titles"
)]
struct Cli {
    /// Video URL or 11-character video ID
    input: String,

    /// Wipe the cached entry and fetch everything again
    #[arg(short, long)]
    force: bool,

    /// Only build the prompt; skip the Gemini request
    #[arg(short = 'n', long)]
    no_generate: bool,

    /// Debug logging and a list of cached artifact paths
    #[arg(short, long)]
    verbose: bool,

    /// Prompt text, overrides any prompt file
    #[arg(short, long)]
    prompt: Option<String>,

    /// Prompt file to use instead of the configured one
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// Cache root directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Gemini model name
    #[arg(short, long)]
    model: Option<String>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn init_logging(verbose: bool) {
    let directive = if verbose {
        "ytprep=debug,ytprep_core=debug"
    } else {
        "ytprep=warn,ytprep_core=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(false)
                .with_line_number(false),
        )
        .with(env_filter)
        .init();
}

fn print_files(video: &ProcessedVideo) {
    eprintln!("{}", style("─".repeat(60)).dim());
    eprintln!(
        "{} {}",
        style("Cache:").dim(),
        style(video.cache_dir.display()).cyan()
    );
    for (key, path) in &video.files {
        eprintln!("  {:<16} {}", style(key).yellow(), path.display());
    }
    eprintln!("{}", style("─".repeat(60)).dim());
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", style("Error:").red().bold(), message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (mut config, config_path) = Config::load_with_path(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(path) = &config_path {
        tracing::debug!(path = %path.display(), "Loaded config");
    }

    if let Some(cache_dir) = cli.cache_dir {
        config.cache_dir = cache_dir;
    }
    if let Some(model) = cli.model {
        config.generation.model = model;
    }
    if let Some(prompt_file) = cli.prompt_file {
        if !prompt_file.is_file() {
            fail(format!("Prompt file not found: {}", prompt_file.display()));
        }
        config.prompt_file = prompt_file;
    }

    let generate = !cli.no_generate;
    let generator = match GeminiClient::new(config.generation.clone()) {
        Ok(client) => client,
        Err(e) => fail(e),
    };

    // Validate API key early
    if generate {
        if let Err(e) = generator.validate_api_key() {
            fail(e);
        }
    }

    eprintln!(
        "\n{}  {}\n",
        style("ytprep").cyan().bold(),
        style("Subtitle Prompt Builder").dim()
    );

    let pipeline = Pipeline::new(
        Arc::new(YtDlpFetcher::new(config.fetcher.clone())),
        Arc::new(generator),
        PipelineSettings::from_config(&config),
    );
    let options = ProcessOptions {
        force_refresh: cli.force,
        request_generated_titles: generate,
        prompt_override: cli.prompt,
        cache_root: None,
    };

    let start = Instant::now();
    let spinner = create_spinner(if generate {
        "Processing video and querying Gemini..."
    } else {
        "Processing video..."
    });
    let result = pipeline.process(&cli.input, &options).await;
    let elapsed = style(format!("[{}]", format_duration(start.elapsed()))).dim();

    match &result {
        PipelineResult::Success(video) => {
            spinner.finish_with_message(format!(
                "{} Processed {} ({} subtitles) {}",
                style("✓").green().bold(),
                style(&video.video_id).yellow(),
                video.subtitle_kind.label(),
                elapsed
            ));
            if cli.verbose {
                print_files(video);
            }
            match &video.generated {
                Some(text) => println!("{}", text),
                None => println!("{}", video.final_text),
            }
        }
        PipelineResult::NoSubtitles {
            video_id,
            cache_dir,
        } => {
            spinner.finish_with_message(format!(
                "{} No English subtitles for {} {}",
                style("!").yellow().bold(),
                style(video_id).yellow(),
                elapsed
            ));
            if cli.verbose {
                eprintln!(
                    "{} {}",
                    style("Cache:").dim(),
                    style(cache_dir.display()).cyan()
                );
            }
        }
        PipelineResult::Error { message, .. } => {
            spinner.finish_and_clear();
            eprintln!("{} {}", style("Error:").red().bold(), message);
        }
    }

    std::process::exit(result.exit_code());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "ytprep",
            "https://youtu.be/dQw4w9WgXcQ",
            "-f",
            "-n",
            "-p",
            "Custom",
            "--cache-dir",
            "/tmp/c",
            "-m",
            "gemini-2.5-flash",
        ]);
        assert_eq!(cli.input, "https://youtu.be/dQw4w9WgXcQ");
        assert!(cli.force);
        assert!(cli.no_generate);
        assert!(!cli.verbose);
        assert_eq!(cli.prompt.as_deref(), Some("Custom"));
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/c")));
        assert_eq!(cli.model.as_deref(), Some("gemini-2.5-flash"));
        assert_eq!(cli.config, None);
    }
}
