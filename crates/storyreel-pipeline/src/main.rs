//! The storyreel pipeline binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storyreel_models::{AggregateInput, ImageOutput, ParseOutput, VideoOutput};
use storyreel_pipeline::stages::{aggregate, image, music, parse, video};
use storyreel_pipeline::{io, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "storyreel", about = "Keyframes to video and music pipeline", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a keyframe file into the first pipeline message
    Parse {
        /// Keyframe description file
        #[arg(short, long)]
        keyframes_file: PathBuf,

        /// Aspect ratio for keyframes that do not set one
        #[arg(long, default_value = "16:9")]
        aspect_ratio: String,

        /// Prefix for generated frame ids
        #[arg(long, default_value = "frame_")]
        frame_prefix: String,
    },

    /// Generate one image per keyframe (parse message on stdin)
    Images,

    /// Animate each generated image into a clip (image message on stdin)
    Videos,

    /// Compose the background music track
    Music {
        /// Composition prompt; a generic default is used when omitted
        #[arg(short, long)]
        prompt: Option<String>,

        /// Track length in seconds
        #[arg(short, long)]
        duration: Option<u32>,

        /// Output filename, without extension
        #[arg(short, long)]
        filename: Option<String>,
    },

    /// Persist the run report (video and music messages on stdin)
    Aggregate,

    /// Run the whole pipeline in one process
    Run {
        /// Keyframe description file
        #[arg(short, long)]
        keyframes_file: PathBuf,

        /// Overrides OUTPUT_DIR for this run
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Model for the image stage
        #[arg(long)]
        model_name: Option<String>,

        /// Music prompt; without it no music is generated
        #[arg(long)]
        music_prompt: Option<String>,

        /// Music filename, without extension
        #[arg(long)]
        music_filename: Option<String>,

        /// Enhance video prompts through the Dify workflow
        #[arg(long)]
        use_dify: bool,
    },
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing; stdout carries the stage message, so every log
    // line goes to stderr
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("storyreel=info".parse().unwrap())
        .add_directive("storyreel_pipeline=info".parse().unwrap())
        .add_directive("storyreel_provider=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }

    let cli = Cli::parse();

    if let Err(e) = dispatch(cli.command).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Run one subcommand. A stage that wrote its message exits cleanly even
/// when the message says `status: "error"`; only failing to write the
/// message itself is a process error.
async fn dispatch(command: Command) -> anyhow::Result<()> {
    let config = PipelineConfig::from_env();

    match command {
        Command::Parse {
            keyframes_file,
            aspect_ratio,
            frame_prefix,
        } => {
            let output = parse::run(&keyframes_file, &aspect_ratio, &frame_prefix);
            io::write_message(&output)?;
        }

        Command::Images => {
            let output = match io::read_message::<ParseOutput>() {
                Ok(input) => image::run(&config, input, None).await,
                Err(e) => ImageOutput::error(
                    format!("cannot read input message: {}", e),
                    image::metadata(&config, None),
                ),
            };
            io::write_message(&output)?;
        }

        Command::Videos => {
            let output = match io::read_message::<ImageOutput>() {
                Ok(input) => video::run(&config, input).await,
                Err(e) => VideoOutput::error(
                    format!("cannot read input message: {}", e),
                    video::metadata(&config),
                ),
            };
            io::write_message(&output)?;
        }

        Command::Music {
            prompt,
            duration,
            filename,
        } => {
            let output =
                music::run(&config, prompt.as_deref(), duration, filename.as_deref()).await;
            io::write_message(&output)?;
        }

        Command::Aggregate => {
            let output = match io::read_message::<AggregateInput>() {
                Ok(input) => aggregate::run(&config, input),
                Err(e) => aggregate::input_error(format!("cannot read input message: {}", e)),
            };
            io::write_message(&output)?;
        }

        Command::Run {
            keyframes_file,
            output_dir,
            model_name,
            music_prompt,
            music_filename,
            use_dify,
        } => {
            let mut config = config;
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if use_dify {
                config.use_dify = true;
            }

            let parsed = parse::run(&keyframes_file, "16:9", "frame_");
            info!(count = parsed.count, "Parse stage done");

            let images = image::run(&config, parsed, model_name.as_deref()).await;
            info!(count = images.count, "Image stage done");

            let videos = video::run(&config, images).await;
            info!(count = videos.count, "Video stage done");

            let music = match music_prompt {
                Some(prompt) => {
                    Some(music::run(&config, Some(&prompt), None, music_filename.as_deref()).await)
                }
                None => None,
            };

            let output = aggregate::run(
                &config,
                AggregateInput {
                    video_frame_in: videos,
                    music_track_in: music,
                },
            );
            io::write_message(&output)?;
        }
    }

    Ok(())
}
