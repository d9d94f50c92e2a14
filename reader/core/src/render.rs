//! Board Scene
//!
//! Turns a [`BoardModel`] and the current [`GoalSelection`] into the shapes a
//! surface draws: robot squares, wall lines and goal glyphs, all placed
//! through the [`CoordinateMapper`]. [`Scene::to_svg`] serializes the scene
//! for surfaces that can show SVG (and for the CLI).

use std::fmt;

use serde::Serialize;

use crate::board::{BoardModel, GoalKey, GoalShape, RobotColor};
use crate::coords::{CoordinateMapper, Line, Rect};
use crate::selection::GoalSelection;

/// Stroke width of wall lines
pub const WALL_STROKE_WIDTH: f64 = 5.0;

/// Stroke width of the board border
pub const BORDER_STROKE_WIDTH: f64 = 5.0;

/// Cell size the glyph paths are drawn for
const GLYPH_UNIT: f64 = 32.0;

/// Outline of a goal shape inside one 32x32 cell
#[must_use]
pub fn glyph_path(shape: GoalShape) -> &'static str {
    match shape {
        GoalShape::Circle => "M 16,16 m 8,0 a 8,8 0 1,0 -16,0 a 8,8 0 1,0 16,0",
        GoalShape::Triangle => "M 16 8 L 24 24 8 24 16 8",
        GoalShape::Hexagon => "M 12 8 L 20 8 25 16 20 24 12 24 7 16 12 8",
        GoalShape::Square => "M 8 8 L 24 8 24 24 8 24 8 8",
    }
}

/// A robot drawn as a filled cell
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RobotSprite {
    /// Robot color
    pub color: RobotColor,
    /// Cell it covers
    pub rect: Rect,
}

/// A goal marker
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GoalSprite {
    /// Goal key
    pub key: GoalKey,
    /// Cell it sits in; also the tap target
    pub rect: Rect,
    /// Glyph outline in 32-unit cell coordinates
    pub path: &'static str,
    /// Fill color
    pub fill: RobotColor,
    /// Fill and stroke opacity
    pub opacity: f64,
}

/// Everything needed to draw one board
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scene {
    /// Board side length in surface units
    pub extent: f64,
    /// Cell side length in surface units
    pub chunk_size: f64,
    /// Robots, drawn first
    pub robots: Vec<RobotSprite>,
    /// Walls, drawn over robots
    pub walls: Vec<Line>,
    /// Goals, drawn last so they stay tappable
    pub goals: Vec<GoalSprite>,
}

impl Scene {
    /// Lay out `board` with the goal opacities of `selection`
    #[must_use]
    pub fn build(board: &BoardModel, selection: &GoalSelection, mapper: &CoordinateMapper) -> Self {
        let robots = board
            .robots()
            .iter()
            .map(|(color, cell)| RobotSprite {
                color: *color,
                rect: mapper.cell_to_rect(*cell),
            })
            .collect();

        let walls = board.walls().iter().map(|w| mapper.wall_to_line(w)).collect();

        let goals = board
            .goals()
            .iter()
            .map(|(key, cell)| GoalSprite {
                key: *key,
                rect: mapper.cell_to_rect(*cell),
                path: glyph_path(key.shape),
                fill: key.color.display_color(),
                opacity: selection.opacity(key),
            })
            .collect();

        Self {
            extent: mapper.extent(),
            chunk_size: f64::from(mapper.chunk_size()),
            robots,
            walls,
            goals,
        }
    }

    /// Render as a standalone SVG document
    #[must_use]
    pub fn to_svg(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let extent = self.extent;
        let chunk = self.chunk_size;

        writeln!(
            f,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{extent}" height="{extent}" viewBox="0 0 {extent} {extent}">"#
        )?;
        writeln!(
            f,
            r#"<defs><pattern id="grid" patternUnits="userSpaceOnUse" x="0" y="0" width="{chunk}" height="{chunk}"><path d="M 0 0 L {chunk} 0 {chunk} {chunk} 0 {chunk} 0 0" fill="transparent" stroke="black" stroke-width="1"/></pattern></defs>"#
        )?;

        for robot in &self.robots {
            let r = robot.rect;
            writeln!(
                f,
                r#"<rect fill="{}" x="{}" y="{}" width="{}" height="{}"/>"#,
                robot.color, r.x, r.y, r.width, r.height
            )?;
        }

        for wall in &self.walls {
            writeln!(
                f,
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="black" stroke-width="{WALL_STROKE_WIDTH}"/>"#,
                wall.x1, wall.y1, wall.x2, wall.y2
            )?;
        }

        writeln!(
            f,
            r#"<rect fill="url(#grid)" x="0" y="0" width="{extent}" height="{extent}"/>"#
        )?;
        writeln!(
            f,
            r#"<path d="M 0 0 L {extent} 0 {extent} {extent} 0 {extent} 0 0" fill="none" stroke="black" stroke-width="{BORDER_STROKE_WIDTH}"/>"#
        )?;

        let scale = chunk / GLYPH_UNIT;
        for goal in &self.goals {
            writeln!(
                f,
                r#"<g id="goal-{}" transform="translate({} {}) scale({scale})"><path d="{}" fill="{}" fill-opacity="{}" stroke="black" stroke-opacity="{}" stroke-width="1"/></g>"#,
                goal.key, goal.rect.x, goal.rect.y, goal.path, goal.fill, goal.opacity, goal.opacity
            )?;
        }

        writeln!(f, "</svg>")
    }
}
