//! Reader - The Session State Machine
//!
//! The reader owns one capture/recognize/select/solve session at a time. It:
//! - takes photos through the platform [`Camera`]
//! - sends them to the [`RecognitionService`] and keeps the recognized board
//! - tracks the goal the user picked
//! - asks the [`SolverService`] for a solution
//! - tells the presentation surface what to show
//!
//! # Design Philosophy
//!
//! The reader is UI-agnostic. It talks to the surface only through
//! [`ReaderMessage`] (outgoing) and [`ReaderEvent`] (incoming), so a phone
//! app, a CLI or a test harness can drive it the same way.
//!
//! Network calls never block the reader. Each one runs as a spawned task that
//! reports back over a channel, tagged with the generation it was started
//! in. Every [`capture`](Reader::capture) starts a new generation, and results
//! from older generations are dropped on arrival. In-flight calls are not
//! cancelled; their effects are suppressed.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::backend::{BackendError, RecognitionService, Solution, SolverService};
use crate::board::{BoardModel, GoalKey, DEFAULT_GRID_SIZE};
use crate::capture::{Camera, CaptureError, CaptureSession};
use crate::config::ReaderConfigFile;
use crate::coords::{CoordinateMapper, DEFAULT_CHUNK_SIZE};
use crate::events::ReaderEvent;
use crate::messages::{NotifyLevel, ReaderMessage, SessionStatus, StatusLine};
use crate::render::Scene;
use crate::selection::GoalSelection;

/// Reader configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Cells per board side; recognized boards must fit in it
    pub grid_size: u32,
    /// Surface units per cell
    pub chunk_size: u32,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl From<&ReaderConfigFile> for ReaderConfig {
    fn from(file: &ReaderConfigFile) -> Self {
        Self {
            grid_size: file.grid_size,
            chunk_size: file.chunk_size,
        }
    }
}

impl ReaderConfig {
    /// Coordinate mapper for this board geometry
    #[must_use]
    pub fn mapper(&self) -> CoordinateMapper {
        CoordinateMapper::new(self.chunk_size, self.grid_size)
    }
}

/// Why a capture/recognize cycle failed
#[derive(Debug)]
enum CycleFailure {
    Capture(CaptureError),
    Backend(BackendError),
}

/// Payload of a finished network task
#[derive(Debug)]
enum Outcome {
    Recognized(Result<BoardModel, CycleFailure>),
    Solved(Result<Solution, BackendError>),
}

impl Outcome {
    fn name(&self) -> &'static str {
        match self {
            Self::Recognized(_) => "recognition",
            Self::Solved(_) => "solve",
        }
    }
}

/// A task result together with the generation that started it
#[derive(Debug)]
struct Tagged {
    generation: u64,
    outcome: Outcome,
}

/// The reader - headless session orchestration
pub struct Reader<C: Camera, R: RecognitionService, S: SolverService> {
    /// Configuration
    config: ReaderConfig,
    /// Cell/pixel mapping for hit-testing and rendering
    mapper: CoordinateMapper,
    /// Camera plus permission state
    capture: Arc<CaptureSession<C>>,
    /// Recognition service
    recognizer: Arc<R>,
    /// Solver service
    solver: Arc<S>,
    /// Current session status
    status: SessionStatus,
    /// Bumped on every capture; results from older generations are stale
    generation: u64,
    /// Recognized board, replaced by the solver's end state when one arrives
    board: Option<BoardModel>,
    /// Chosen goal
    selection: GoalSelection,
    /// Latest solution
    solution: Option<Solution>,
    /// Latest failure message
    error: Option<String>,
    /// Channel to send messages to the surface
    tx: mpsc::Sender<ReaderMessage>,
    /// Sending half handed to spawned tasks
    results_tx: mpsc::UnboundedSender<Tagged>,
    /// Finished task results
    results_rx: mpsc::UnboundedReceiver<Tagged>,
    /// Set once the surface asked to quit
    quit: bool,
}

impl<C, R, S> Reader<C, R, S>
where
    C: Camera + 'static,
    R: RecognitionService + 'static,
    S: SolverService + 'static,
{
    /// Create a reader around the platform camera and the two services
    pub fn new(
        camera: C,
        recognizer: R,
        solver: S,
        config: ReaderConfig,
        tx: mpsc::Sender<ReaderMessage>,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            mapper: config.mapper(),
            config,
            capture: Arc::new(CaptureSession::new(camera)),
            recognizer: Arc::new(recognizer),
            solver: Arc::new(solver),
            status: SessionStatus::Idle,
            generation: 0,
            board: None,
            selection: GoalSelection::new(),
            solution: None,
            error: None,
            tx,
            results_tx,
            results_rx,
            quit: false,
        }
    }

    /// Get current status
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Get current generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Get the current board
    pub fn board(&self) -> Option<&BoardModel> {
        self.board.as_ref()
    }

    /// Get the selected goal
    pub fn selected_goal(&self) -> Option<GoalKey> {
        self.selection.selected()
    }

    /// Get the goal selection
    pub fn selection(&self) -> &GoalSelection {
        &self.selection
    }

    /// Get the latest solution
    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    /// Get the latest failure message
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Get configuration
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Get the coordinate mapper
    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    /// Whether the surface asked to quit
    pub fn is_quitting(&self) -> bool {
        self.quit
    }

    /// Whether the solve trigger should be offered
    pub fn can_solve(&self) -> bool {
        self.status == SessionStatus::AwaitingGoal && self.selection.is_some()
    }

    /// What the status area shows right now
    pub fn status_line(&self) -> StatusLine {
        StatusLine::from_session(
            self.status,
            self.selection.is_some(),
            self.solution.as_ref(),
            self.error.as_deref(),
        )
    }

    /// Board scene for the current board and selection
    pub fn scene(&self) -> Option<Scene> {
        self.board
            .as_ref()
            .map(|board| Scene::build(board, &self.selection, &self.mapper))
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Ask the platform for camera access
    pub async fn request_permission(&mut self) -> bool {
        let granted = self.capture.request_permission().await;
        if !granted {
            self.send(ReaderMessage::PermissionRequired).await;
        }
        granted
    }

    /// Start a new session: reset everything, take a photo and recognize it
    ///
    /// Allowed from any state. Without camera permission the session is reset
    /// and left idle, and the surface is asked to prompt for access.
    pub async fn capture(&mut self) {
        self.reset();
        tracing::info!(generation = self.generation, "Capture requested");

        self.send(ReaderMessage::Board { board: None }).await;
        self.send(ReaderMessage::Selection { goal: None }).await;

        if !self.capture.permission_granted() {
            tracing::warn!("Capture without camera permission");
            self.set_state(SessionStatus::Idle).await;
            self.send(ReaderMessage::PermissionRequired).await;
            return;
        }

        self.set_state(SessionStatus::Analyzing).await;

        let capture = Arc::clone(&self.capture);
        let recognizer = Arc::clone(&self.recognizer);
        let results = self.results_tx.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            let result = match capture.capture().await {
                Ok(image) => recognizer
                    .recognize(image)
                    .await
                    .map_err(CycleFailure::Backend),
                Err(e) => Err(CycleFailure::Capture(e)),
            };
            let tagged = Tagged {
                generation,
                outcome: Outcome::Recognized(result),
            };
            if results.send(tagged).is_err() {
                tracing::debug!(generation, "Reader gone before recognition finished");
            }
        });
    }

    /// Select a goal by key
    ///
    /// Only accepted while waiting for a goal, and only for goals the board
    /// has. Returns whether the selection was accepted.
    pub async fn select(&mut self, key: GoalKey) -> bool {
        if self.status != SessionStatus::AwaitingGoal {
            tracing::debug!(
                goal = %key,
                status = self.status.description(),
                "Ignoring goal selection"
            );
            return false;
        }
        let Some(board) = self.board.as_ref() else {
            return false;
        };

        if !self.selection.select(board, key) {
            tracing::debug!(goal = %key, "Goal not on board");
            return false;
        }
        self.announce_selection().await;
        true
    }

    /// Hit-test a tap on the board view
    ///
    /// Selects the goal under the point, or clears the selection when there
    /// is none.
    pub async fn tap(&mut self, x: f64, y: f64) {
        if self.status != SessionStatus::AwaitingGoal {
            return;
        }
        let Some(board) = self.board.as_ref() else {
            return;
        };

        let before = self.selection.selected();
        self.selection.tap(board, &self.mapper, x, y);
        if self.selection.selected() != before {
            self.announce_selection().await;
        }
    }

    /// Clear the goal selection
    pub async fn clear_selection(&mut self) {
        if self.status != SessionStatus::AwaitingGoal || !self.selection.is_some() {
            return;
        }
        self.selection.clear();
        self.announce_selection().await;
    }

    /// Ask the solver for a path to the selected goal
    ///
    /// Requires a board and a selected goal. Returns whether a request was
    /// started.
    pub async fn solve(&mut self) -> bool {
        if !self.can_solve() {
            tracing::debug!(status = self.status.description(), "Solve not available");
            return false;
        }
        let (Some(board), Some(goal)) = (self.board.clone(), self.selection.selected()) else {
            return false;
        };

        tracing::info!(generation = self.generation, goal = %goal, "Solve requested");
        self.set_state(SessionStatus::Solving).await;

        let solver = Arc::clone(&self.solver);
        let results = self.results_tx.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            let tagged = Tagged {
                generation,
                outcome: Outcome::Solved(solver.solve(&board, goal).await),
            };
            if results.send(tagged).is_err() {
                tracing::debug!(generation, "Reader gone before solve finished");
            }
        });
        true
    }

    /// Download the rendered animation of the current solution, if it has one
    ///
    /// # Errors
    ///
    /// Returns the solver's [`BackendError`] when the download fails.
    pub async fn fetch_animation(&self) -> Result<Option<Vec<u8>>, BackendError> {
        let Some(id) = self.solution.as_ref().and_then(|s| s.solution_id.as_deref()) else {
            return Ok(None);
        };
        self.solver.fetch_animation(id).await.map(Some)
    }

    // ========================================================================
    // Results
    // ========================================================================

    /// Apply every finished task result without waiting
    ///
    /// Returns true if there was activity.
    pub async fn poll_results(&mut self) -> bool {
        let mut collected = Vec::new();
        while let Ok(tagged) = self.results_rx.try_recv() {
            collected.push(tagged);
        }

        let active = !collected.is_empty();
        for tagged in collected {
            self.apply_result(tagged).await;
        }
        active
    }

    /// Wait for the next finished task result and apply it
    ///
    /// Returns whether the result was current (false if it was stale).
    pub async fn next_result(&mut self) -> bool {
        match self.results_rx.recv().await {
            Some(tagged) => self.apply_result(tagged).await,
            None => false,
        }
    }

    /// Apply one result if it belongs to the current generation
    async fn apply_result(&mut self, tagged: Tagged) -> bool {
        let Tagged {
            generation,
            outcome,
        } = tagged;

        if generation != self.generation {
            tracing::debug!(
                result = outcome.name(),
                generation,
                current = self.generation,
                "Dropping stale result"
            );
            return false;
        }

        match outcome {
            Outcome::Recognized(result) if self.status == SessionStatus::Analyzing => {
                self.on_recognized(result).await;
            }
            Outcome::Solved(result) if self.status == SessionStatus::Solving => {
                self.on_solved(result).await;
            }
            outcome => {
                tracing::debug!(
                    result = outcome.name(),
                    status = self.status.description(),
                    "Dropping unexpected result"
                );
                return false;
            }
        }
        true
    }

    async fn on_recognized(&mut self, result: Result<BoardModel, CycleFailure>) {
        match result {
            Ok(board) => {
                tracing::info!(
                    generation = self.generation,
                    walls = board.walls().len(),
                    robots = board.robots().len(),
                    goals = board.goals().len(),
                    "Board recognized"
                );
                self.board = Some(board.clone());
                self.selection.clear();
                self.send(ReaderMessage::Board { board: Some(board) }).await;
                self.set_state(SessionStatus::AwaitingGoal).await;
            }
            Err(CycleFailure::Capture(CaptureError::PermissionDenied)) => {
                tracing::warn!("Camera permission lost before capture");
                self.set_state(SessionStatus::Idle).await;
                self.send(ReaderMessage::PermissionRequired).await;
            }
            Err(CycleFailure::Capture(e)) => self.fail(e.to_string()).await,
            Err(CycleFailure::Backend(e)) => self.fail(e.message().to_string()).await,
        }
    }

    async fn on_solved(&mut self, result: Result<Solution, BackendError>) {
        match result {
            Ok(solution) => {
                tracing::info!(
                    generation = self.generation,
                    moves = solution.move_count(),
                    "Solution received"
                );
                if let Some(board) = solution.board.clone() {
                    self.board = Some(board.clone());
                    self.selection.clear();
                    self.send(ReaderMessage::Board { board: Some(board) }).await;
                    self.send(ReaderMessage::Selection { goal: None }).await;
                }
                self.solution = Some(solution.clone());
                self.send(ReaderMessage::Solution { solution }).await;
                self.set_state(SessionStatus::Done).await;
            }
            Err(e) => self.fail(e.message().to_string()).await,
        }
    }

    // ========================================================================
    // Surface Events
    // ========================================================================

    /// Handle an event from the presentation surface
    pub async fn handle_event(&mut self, event: ReaderEvent) -> anyhow::Result<()> {
        tracing::trace!(event = event.name(), "Surface event");
        match event {
            ReaderEvent::PermissionRequested => {
                self.request_permission().await;
            }
            ReaderEvent::CaptureRequested => self.capture().await,
            ReaderEvent::GoalSelected { key } => {
                if !self.select(key).await && self.status == SessionStatus::AwaitingGoal {
                    self.notify(NotifyLevel::Warning, &format!("No goal {key} on this board"))
                        .await;
                }
            }
            ReaderEvent::BoardTapped { x, y } => self.tap(x, y).await,
            ReaderEvent::SelectionCleared => self.clear_selection().await,
            ReaderEvent::SolveRequested => {
                if !self.solve().await {
                    self.notify(NotifyLevel::Info, "Select a goal first").await;
                }
            }
            ReaderEvent::QuitRequested => self.shutdown().await?,
        }
        Ok(())
    }

    /// Drive the reader from a surface event channel until it closes or the
    /// surface quits
    pub async fn run(&mut self, mut events: mpsc::Receiver<ReaderEvent>) -> anyhow::Result<()> {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        self.handle_event(event).await?;
                        if self.quit {
                            break;
                        }
                    }
                    None => break,
                },
                Some(tagged) = self.results_rx.recv() => {
                    self.apply_result(tagged).await;
                }
            }
        }
        Ok(())
    }

    /// Shut down the reader
    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        self.quit = true;
        self.send(ReaderMessage::Quit { message: None }).await;
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Drop everything the previous session produced and start a new generation
    fn reset(&mut self) {
        self.generation += 1;
        self.board = None;
        self.selection.clear();
        self.solution = None;
        self.error = None;
    }

    /// Record a failure and move to the error state
    async fn fail(&mut self, message: String) {
        tracing::warn!(
            generation = self.generation,
            status = self.status.description(),
            error = %message,
            "Session failed"
        );
        self.error = Some(message.clone());
        self.notify(NotifyLevel::Error, &message).await;
        self.set_state(SessionStatus::Error).await;
    }

    /// Tell the surface the selection (and so the status line) changed
    async fn announce_selection(&mut self) {
        self.send(ReaderMessage::Selection {
            goal: self.selection.selected(),
        })
        .await;
        self.set_state(self.status).await;
    }

    /// Set state and notify surface
    async fn set_state(&mut self, status: SessionStatus) {
        if status != self.status {
            tracing::debug!(
                generation = self.generation,
                from = self.status.description(),
                to = status.description(),
                "Status changed"
            );
        }
        self.status = status;
        self.send(ReaderMessage::Status {
            status,
            line: self.status_line(),
        })
        .await;
    }

    /// Send notification
    async fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(ReaderMessage::Notify {
            level,
            message: message.to_string(),
        })
        .await;
    }

    /// Send a message to the surface
    async fn send(&self, msg: ReaderMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}
