//! Reader Core - Headless Board Capture and Solve Orchestration
//!
//! This crate holds the client-side logic of board-reader: photograph a board,
//! have a remote service recognize it, pick a goal, ask a remote solver for a
//! move sequence and show the result. It is independent of any UI framework;
//! the presentation surface and the camera are supplied by the host.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   Presentation Surface                        │
//! │        (phone app, CLI, test harness; renders a Scene)        │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//!                     ReaderEvent (up)
//!                   ReaderMessage (down)
//!                                │
//! ┌──────────────────────────────┼───────────────────────────────┐
//! │                         READER CORE                           │
//! │  ┌───────────────────────────┴────────────────────────────┐  │
//! │  │                        Reader                           │  │
//! │  │  ┌──────────┐  ┌───────────┐  ┌──────────┐  ┌────────┐ │  │
//! │  │  │ Capture  │  │   Board   │  │   Goal   │  │ Coord  │ │  │
//! │  │  │ Session  │  │   Model   │  │ Selection│  │ Mapper │ │  │
//! │  │  └────┬─────┘  └───────────┘  └──────────┘  └────────┘ │  │
//! │  └───────┼────────────────┬───────────────┬───────────────┘  │
//! │          │                │               │                  │
//! │      Camera        Recognition        Solver                 │
//! │     (platform)      Service           Service                │
//! └──────────────────────────┼───────────────┼───────────────────┘
//!                            │   HTTP        │
//!                       POST /read      POST /solve
//! ```
//!
//! # Key Types
//!
//! - [`Reader`]: the session state machine
//! - [`ReaderMessage`]: messages sent from the reader to the surface
//! - [`ReaderEvent`]: events sent from the surface to the reader
//! - [`BoardModel`]: a recognized board
//! - [`CoordinateMapper`]: cell/surface coordinate mapping
//! - [`Scene`]: the drawable board
//!
//! # Quick Start
//!
//! ```ignore
//! use reader_core::{
//!     backend::{RecognitionClient, SolverClient},
//!     config::load_config,
//!     Reader, ReaderConfig, ReaderEvent,
//! };
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let file = load_config()?;
//!     let recognizer = RecognitionClient::new(&file.service, file.grid_size)?;
//!     let solver = SolverClient::new(&file.service, file.grid_size)?;
//!
//!     let (tx, mut rx) = mpsc::channel(100);
//!     let mut reader = Reader::new(camera, recognizer, solver, ReaderConfig::from(&file), tx);
//!
//!     reader.handle_event(ReaderEvent::PermissionRequested).await?;
//!     reader.handle_event(ReaderEvent::CaptureRequested).await?;
//!     reader.next_result().await;
//!
//!     while let Ok(msg) = rx.try_recv() {
//!         // Render message on the surface
//!     }
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]

pub mod backend;
pub mod board;
pub mod capture;
pub mod config;
pub mod coords;
pub mod events;
pub mod messages;
pub mod reader;
pub mod render;
pub mod selection;

// Re-exports for convenience
pub use backend::{BackendConfig, BackendError, RecognitionService, Solution, SolverService};
pub use board::{BoardError, BoardModel, Cell, GoalColor, GoalKey, GoalShape, RobotColor, Wall};
pub use capture::{Camera, CaptureError, CaptureSession, ImageResource, RawImage};
pub use config::{ConfigError, ConfigOverrides, ConfigSource, ReaderConfigFile};
pub use coords::{CoordinateMapper, Line, Rect};
pub use events::ReaderEvent;
pub use messages::{NotifyLevel, ReaderMessage, SessionStatus, StatusLine};
pub use reader::{Reader, ReaderConfig};
pub use render::Scene;
pub use selection::GoalSelection;
