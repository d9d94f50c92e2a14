//! board-reader
//!
//! Headless driver for the reader core. A photo file stands in for the camera
//! and the console stands in for the phone screen.
//!
//! # Usage
//!
//! ```bash
//! # Recognize a board and list its goals
//! board-reader photo.jpg
//!
//! # Solve the red triangle and save the board and the animation
//! board-reader photo.jpg --goal rt --svg board.svg --animation solution.gif
//!
//! # Against a service on another machine, with verbose logging
//! RUST_LOG=debug board-reader photo.jpg --host 192.168.0.16 --port 5000
//! ```
//!
//! # Environment Variables
//!
//! - `READER_SERVICE_HOST`, `READER_SERVICE_PORT`, `READER_TIMEOUT_SECS`
//! - `READER_GRID_SIZE`, `READER_CHUNK_SIZE`
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)
//!
//! # Files
//!
//! - Config: `$XDG_CONFIG_HOME/board-reader/reader.toml`

mod camera;
mod surface;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use reader_core::backend::{RecognitionClient, SolverClient};
use reader_core::config::{default_config_path, load_config_from_path, ConfigOverrides};
use reader_core::{GoalKey, Reader, ReaderConfig, ReaderEvent, SessionStatus};

use crate::camera::FileCamera;

/// Recognize a board photo and solve a goal on it
#[derive(Debug, Parser)]
#[command(name = "board-reader", version, about)]
struct Args {
    /// Board photo (any format the image crate decodes)
    photo: PathBuf,

    /// Goal to solve, e.g. `rt` or `mc`
    #[arg(short, long)]
    goal: Option<GoalKey>,

    /// Config file (defaults to the XDG config path)
    #[arg(long, env = "READER_CONFIG")]
    config: Option<PathBuf>,

    /// Service host
    #[arg(long)]
    host: Option<String>,

    /// Service port
    #[arg(long)]
    port: Option<u16>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Board size in cells per side
    #[arg(long)]
    grid_size: Option<u32>,

    /// Write the final board as SVG
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Download the solution animation (GIF) here
    #[arg(long)]
    animation: Option<PathBuf>,

    /// Print every surface message as a JSON line
    #[arg(long)]
    json: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ref host) = self.host {
            overrides = overrides.with_host(host.clone());
        }
        if let Some(port) = self.port {
            overrides = overrides.with_port(port);
        }
        if let Some(secs) = self.timeout {
            overrides = overrides.with_timeout_secs(secs);
        }
        if let Some(size) = self.grid_size {
            overrides = overrides.with_grid_size(size);
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("board_reader=info".parse()?)
                .add_directive("reader_core=info".parse()?),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut file = load_config_from_path(args.config.clone().or_else(default_config_path))?;
    args.overrides().apply(&mut file);
    file.validate()?;
    info!(
        service = %file.service.base_url(),
        grid_size = file.grid_size,
        source = %file.source(),
        "Configuration loaded"
    );

    let recognizer = RecognitionClient::new(&file.service, file.grid_size)?;
    let solver = SolverClient::new(&file.service, file.grid_size)?;

    let (msg_tx, msg_rx) = mpsc::channel(100);
    let printer = tokio::spawn(surface::run(msg_rx, args.json));

    let mut reader = Reader::new(
        FileCamera::new(&args.photo),
        recognizer,
        solver,
        ReaderConfig::from(&file),
        msg_tx,
    );

    let outcome = drive(&mut reader, &args).await;

    reader.handle_event(ReaderEvent::QuitRequested).await?;
    drop(reader);
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "Console surface task failed");
    }

    outcome
}

/// Run one capture and, when a goal was given, one solve
async fn drive(
    reader: &mut Reader<FileCamera, RecognitionClient, SolverClient>,
    args: &Args,
) -> anyhow::Result<()> {
    reader.handle_event(ReaderEvent::PermissionRequested).await?;
    reader.handle_event(ReaderEvent::CaptureRequested).await?;
    if reader.status() == SessionStatus::Analyzing {
        reader.next_result().await;
    }

    if let Some(key) = args.goal {
        reader.handle_event(ReaderEvent::GoalSelected { key }).await?;
        reader.handle_event(ReaderEvent::SolveRequested).await?;
        if reader.status() == SessionStatus::Solving {
            reader.next_result().await;
        }
    }

    check_outcome(reader.status(), reader.error(), args.goal)?;

    if let (Some(path), Some(scene)) = (&args.svg, reader.scene()) {
        tokio::fs::write(path, scene.to_svg())
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "Board written");
    }

    if let Some(ref path) = args.animation {
        match reader.fetch_animation().await? {
            Some(gif) => {
                tokio::fs::write(path, gif)
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), "Animation written");
            }
            None => tracing::warn!("Solver did not render an animation"),
        }
    }

    Ok(())
}

/// Fail unless the session reached the state the invocation asked for
fn check_outcome(
    status: SessionStatus,
    error: Option<&str>,
    goal: Option<GoalKey>,
) -> anyhow::Result<()> {
    if let Some(message) = error {
        anyhow::bail!("{message}");
    }
    match goal {
        Some(goal) if status != SessionStatus::Done => {
            anyhow::bail!("goal {goal} was not solved ({})", status.description())
        }
        _ => Ok(()),
    }
}
