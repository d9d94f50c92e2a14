//! Board Model
//!
//! Value types for a recognized board: cells, walls, robots and goals.
//!
//! A [`BoardModel`] is created once per successful recognition response and is
//! never mutated in place. When the solver sends back an updated snapshot, the
//! whole model is replaced.
//!
//! # Wire Format
//!
//! ```json
//! {
//!   "walls": [[3.5, 2], [7, 0.5]],
//!   "robots": {"red": [0, 4]},
//!   "goals": {"rt": [5, 5], "mc": [9, 1]}
//! }
//! ```
//!
//! The recognition service emits coordinates as floats (`3.0`). Cells accept
//! any integral, non-negative number; walls accept half steps.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Default number of rows and columns on the board
pub const DEFAULT_GRID_SIZE: u32 = 16;

/// Errors raised while validating a board
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BoardError {
    /// A goal key was not two valid letters
    #[error("invalid goal key: {0:?}")]
    InvalidGoalKey(String),

    /// A cell coordinate was negative, fractional or not finite
    #[error("invalid cell coordinate [{row}, {col}]")]
    InvalidCell {
        /// Raw row value
        row: f64,
        /// Raw column value
        col: f64,
    },

    /// A wall coordinate was not a finite, non-negative half step
    #[error("invalid wall coordinate [{row}, {col}]")]
    InvalidWall {
        /// Raw row value
        row: f64,
        /// Raw column value
        col: f64,
    },

    /// Two robots were placed on the same cell
    #[error("robots {first} and {second} share cell {cell}")]
    SharedRobotCell {
        /// First robot on the cell
        first: RobotColor,
        /// Second robot on the cell
        second: RobotColor,
        /// The shared cell
        cell: Cell,
    },

    /// An entity lies outside the configured grid
    #[error("{what} lies outside the {grid_size}x{grid_size} grid")]
    OutOfBounds {
        /// Description of the offending entity
        what: String,
        /// Grid size that was checked against
        grid_size: u32,
    },
}

// ============================================================================
// Cell
// ============================================================================

/// A (row, column) position on the board grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    /// Row index (0 = top)
    pub row: u32,
    /// Column index (0 = left)
    pub col: u32,
}

impl Cell {
    /// Create a cell
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Whether the cell lies on a `grid_size` x `grid_size` board
    #[must_use]
    pub fn in_bounds(&self, grid_size: u32) -> bool {
        self.row < grid_size && self.col < grid_size
    }

    /// Build a cell from raw wire numbers
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_raw(row: f64, col: f64) -> Result<Self, BoardError> {
        let valid =
            |v: f64| v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= f64::from(u32::MAX);
        if !valid(row) || !valid(col) {
            return Err(BoardError::InvalidCell { row, col });
        }
        Ok(Self::new(row as u32, col as u32))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.row, self.col)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.row, self.col].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [row, col] = <[f64; 2]>::deserialize(deserializer)?;
        Self::from_raw(row, col).map_err(D::Error::custom)
    }
}

// ============================================================================
// Wall
// ============================================================================

/// A wall segment on a cell edge
///
/// Stored as the single half-step point the recognition service reports.
/// `[3.5, 2]` is the edge between rows 3 and 4 under column 2.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Wall {
    /// Row coordinate (may be a half step)
    pub row: f64,
    /// Column coordinate (may be a half step)
    pub col: f64,
}

impl Wall {
    /// Create a wall at the given coordinates
    #[must_use]
    pub const fn new(row: f64, col: f64) -> Self {
        Self { row, col }
    }

    /// The two quantized endpoints of the wall line, as `(x, y)` in cell units
    ///
    /// Start is `(ceil(col), ceil(row))`, end is `(floor(col) + 1, floor(row) + 1)`.
    #[must_use]
    pub fn endpoints(&self) -> ((f64, f64), (f64, f64)) {
        (
            (self.col.ceil(), self.row.ceil()),
            (self.col.floor() + 1.0, self.row.floor() + 1.0),
        )
    }

    fn validate(&self) -> Result<(), BoardError> {
        let half_step = |v: f64| v.is_finite() && v >= 0.0 && (v * 2.0).fract() == 0.0;
        if half_step(self.row) && half_step(self.col) {
            Ok(())
        } else {
            Err(BoardError::InvalidWall {
                row: self.row,
                col: self.col,
            })
        }
    }
}

impl From<[f64; 2]> for Wall {
    fn from([row, col]: [f64; 2]) -> Self {
        Self::new(row, col)
    }
}

impl From<Wall> for [f64; 2] {
    fn from(wall: Wall) -> Self {
        [wall.row, wall.col]
    }
}

// ============================================================================
// Colors and Shapes
// ============================================================================

/// Robot colors (closed set)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotColor {
    /// Red robot
    Red,
    /// Green robot
    Green,
    /// Blue robot
    Blue,
    /// Yellow robot
    Yellow,
    /// Grey robot
    Grey,
}

impl RobotColor {
    /// Wire and display name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Grey => "grey",
        }
    }
}

impl fmt::Display for RobotColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mover used when the goal accepts any robot
pub const MULTI_MOVER_COLOR: RobotColor = RobotColor::Red;

/// Goal marker colors: the four chromatic robot colors plus the wildcard
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GoalColor {
    /// `r`
    Red,
    /// `g`
    Green,
    /// `b`
    Blue,
    /// `y`
    Yellow,
    /// `m`, reachable by any robot
    Multi,
}

impl GoalColor {
    /// Parse the color letter of a goal key
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'r' => Some(Self::Red),
            'g' => Some(Self::Green),
            'b' => Some(Self::Blue),
            'y' => Some(Self::Yellow),
            'm' => Some(Self::Multi),
            _ => None,
        }
    }

    /// Color letter used in goal keys
    #[must_use]
    pub fn letter(&self) -> char {
        match self {
            Self::Red => 'r',
            Self::Green => 'g',
            Self::Blue => 'b',
            Self::Yellow => 'y',
            Self::Multi => 'm',
        }
    }

    /// Color the goal glyph is drawn with
    #[must_use]
    pub fn display_color(&self) -> RobotColor {
        match self {
            Self::Red => RobotColor::Red,
            Self::Green => RobotColor::Green,
            Self::Blue => RobotColor::Blue,
            Self::Yellow => RobotColor::Yellow,
            Self::Multi => RobotColor::Grey,
        }
    }

    /// Robot sent to the solver for this goal
    ///
    /// Multi goals are drawn grey but solved with [`MULTI_MOVER_COLOR`].
    #[must_use]
    pub fn mover_color(&self) -> RobotColor {
        match self {
            Self::Multi => MULTI_MOVER_COLOR,
            other => other.display_color(),
        }
    }
}

/// Goal marker shapes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GoalShape {
    /// `c`
    Circle,
    /// `t`
    Triangle,
    /// `h`
    Hexagon,
    /// `s`
    Square,
}

impl GoalShape {
    /// Parse the shape letter of a goal key
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'c' => Some(Self::Circle),
            't' => Some(Self::Triangle),
            'h' => Some(Self::Hexagon),
            's' => Some(Self::Square),
            _ => None,
        }
    }

    /// Shape letter used in goal keys
    #[must_use]
    pub fn letter(&self) -> char {
        match self {
            Self::Circle => 'c',
            Self::Triangle => 't',
            Self::Hexagon => 'h',
            Self::Square => 's',
        }
    }
}

// ============================================================================
// Goal Key
// ============================================================================

/// Two-letter goal identifier: `<color><shape>`, e.g. `rt` or `mc`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GoalKey {
    /// Goal color
    pub color: GoalColor,
    /// Goal shape
    pub shape: GoalShape,
}

impl GoalKey {
    /// Create a goal key
    #[must_use]
    pub const fn new(color: GoalColor, shape: GoalShape) -> Self {
        Self { color, shape }
    }
}

impl FromStr for GoalKey {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let parsed = match (chars.next(), chars.next(), chars.next()) {
            (Some(c), Some(sh), None) => {
                GoalColor::from_letter(c).zip(GoalShape::from_letter(sh))
            }
            _ => None,
        };
        parsed
            .map(|(color, shape)| Self::new(color, shape))
            .ok_or_else(|| BoardError::InvalidGoalKey(s.to_string()))
    }
}

impl fmt::Display for GoalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.color.letter(), self.shape.letter())
    }
}

impl Serialize for GoalKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GoalKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

// ============================================================================
// Board Model
// ============================================================================

#[derive(Deserialize)]
struct RawBoard {
    walls: Vec<Wall>,
    robots: BTreeMap<RobotColor, Cell>,
    #[serde(default)]
    goals: BTreeMap<GoalKey, Cell>,
}

/// A recognized board: walls, robots and goals
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoardModel {
    walls: Vec<Wall>,
    robots: BTreeMap<RobotColor, Cell>,
    goals: BTreeMap<GoalKey, Cell>,
}

impl<'de> Deserialize<'de> for BoardModel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawBoard::deserialize(deserializer)?;
        Self::new(raw.walls, raw.robots, raw.goals).map_err(D::Error::custom)
    }
}

impl BoardModel {
    /// Build a board, checking wall coordinates and robot placement
    pub fn new(
        walls: Vec<Wall>,
        robots: BTreeMap<RobotColor, Cell>,
        goals: BTreeMap<GoalKey, Cell>,
    ) -> Result<Self, BoardError> {
        for wall in &walls {
            wall.validate()?;
        }

        let mut occupied: BTreeMap<Cell, RobotColor> = BTreeMap::new();
        for (&color, &cell) in &robots {
            if let Some(&first) = occupied.get(&cell) {
                return Err(BoardError::SharedRobotCell {
                    first,
                    second: color,
                    cell,
                });
            }
            occupied.insert(cell, color);
        }

        Ok(Self {
            walls,
            robots,
            goals,
        })
    }

    /// Check every entity lies on a `grid_size` x `grid_size` grid
    pub fn check_bounds(&self, grid_size: u32) -> Result<(), BoardError> {
        let limit = f64::from(grid_size);
        let out_of_bounds = |what: String| BoardError::OutOfBounds { what, grid_size };

        if let Some(wall) = self
            .walls
            .iter()
            .find(|w| w.row > limit || w.col > limit)
        {
            return Err(out_of_bounds(format!("wall [{}, {}]", wall.row, wall.col)));
        }
        if let Some((color, cell)) = self.robots.iter().find(|(_, c)| !c.in_bounds(grid_size)) {
            return Err(out_of_bounds(format!("{color} robot at {cell}")));
        }
        if let Some((key, cell)) = self.goals.iter().find(|(_, c)| !c.in_bounds(grid_size)) {
            return Err(out_of_bounds(format!("goal {key} at {cell}")));
        }
        Ok(())
    }

    /// Wall segments
    #[must_use]
    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    /// Robot positions by color
    #[must_use]
    pub fn robots(&self) -> &BTreeMap<RobotColor, Cell> {
        &self.robots
    }

    /// Goal positions by key
    #[must_use]
    pub fn goals(&self) -> &BTreeMap<GoalKey, Cell> {
        &self.goals
    }

    /// Cell of a goal, if the board has it
    #[must_use]
    pub fn goal_cell(&self, key: &GoalKey) -> Option<Cell> {
        self.goals.get(key).copied()
    }

    /// Whether the board has the goal
    #[must_use]
    pub fn has_goal(&self, key: &GoalKey) -> bool {
        self.goals.contains_key(key)
    }

    /// Goal occupying a cell, if any
    #[must_use]
    pub fn goal_at(&self, cell: Cell) -> Option<GoalKey> {
        self.goals
            .iter()
            .find(|(_, c)| **c == cell)
            .map(|(&key, _)| key)
    }
}
