//! Console surface
//!
//! Prints what the reader tells the presentation surface to show. In text
//! mode only the status line, notifications and the recognized goals are
//! printed; with `--json` every message is printed as one JSON line.

use reader_core::{NotifyLevel, ReaderMessage};
use tokio::sync::mpsc;

/// Render one message as a console line, or `None` for messages with no text form
pub fn render_line(msg: &ReaderMessage) -> Option<String> {
    match msg {
        ReaderMessage::Status { line, .. } => {
            let text = line.to_string();
            (!text.is_empty()).then(|| format!("» {text}"))
        }
        ReaderMessage::Board { board: Some(board) } => {
            let goals: Vec<String> = board.goals().keys().map(ToString::to_string).collect();
            Some(format!(
                "board: {} walls, {} robots, goals [{}]",
                board.walls().len(),
                board.robots().len(),
                goals.join(" ")
            ))
        }
        ReaderMessage::Selection { goal: Some(goal) } => Some(format!("goal: {goal}")),
        ReaderMessage::PermissionRequired => Some("camera permission required".to_string()),
        ReaderMessage::Notify { level, message } => {
            let tag = match level {
                NotifyLevel::Info => "info",
                NotifyLevel::Warning => "warning",
                NotifyLevel::Error => "error",
            };
            Some(format!("[{tag}] {message}"))
        }
        ReaderMessage::Board { board: None }
        | ReaderMessage::Selection { goal: None }
        | ReaderMessage::Solution { .. }
        | ReaderMessage::Quit { .. } => None,
    }
}

/// Print messages until the reader hangs up or asks to quit
pub async fn run(mut rx: mpsc::Receiver<ReaderMessage>, json: bool) {
    while let Some(msg) = rx.recv().await {
        if json {
            match serde_json::to_string(&msg) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "Cannot serialize message"),
            }
        } else if let Some(line) = render_line(&msg) {
            println!("{line}");
        }

        if matches!(msg, ReaderMessage::Quit { .. }) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reader_core::{SessionStatus, StatusLine};

    #[test]
    fn test_status_lines() {
        let line = |status, line| render_line(&ReaderMessage::Status { status, line });
        assert_eq!(line(SessionStatus::Idle, StatusLine::Blank), None);
        assert_eq!(
            line(SessionStatus::Done, StatusLine::Done { moves: 4 }).as_deref(),
            Some("» Done in 4 moves")
        );
    }

    #[test]
    fn test_board_summary() {
        let board = serde_json::from_str(
            r#"{"walls": [[1, 0.5]], "robots": {"red": [0, 0]}, "goals": {"rt": [2, 3], "mc": [4, 4]}}"#,
        )
        .unwrap();
        assert_eq!(
            render_line(&ReaderMessage::Board { board: Some(board) }).as_deref(),
            Some("board: 1 walls, 1 robots, goals [rt mc]")
        );
    }
}
