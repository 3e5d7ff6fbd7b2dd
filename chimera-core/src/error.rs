//! Core error type

use crate::hex::Offset;
use crate::unit::UnitId;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CoreError {
    #[error("invalid range radius {0}")]
    InvalidRadius(i32),

    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("no tile at {0}")]
    OutOfBounds(Offset),

    #[error("tile {0} is already occupied")]
    OccupiedTile(Offset),

    #[error("tile {0} has no occupant")]
    EmptyTile(Offset),

    #[error("no live unit with id {0}")]
    UnknownUnit(UnitId),

    #[error("unknown unit template: {0}")]
    UnknownTemplate(String),

    #[error("invalid unit template {name}: {reason}")]
    InvalidTemplate { name: String, reason: &'static str },

    #[error("path step {from} -> {to} is not between neighbouring tiles")]
    NotAdjacent { from: Offset, to: Offset },

    #[error("unit {0} is not on turn")]
    NotOnTurn(UnitId),

    #[error("unit {unit} cannot reach {target}")]
    OutOfRange { unit: UnitId, target: Offset },

    #[error("move needs {needed} movement but only {remaining} remains")]
    InsufficientMovement { needed: i32, remaining: i32 },

    #[error("movement penalty must be non-negative, got {0}")]
    InvalidPenalty(f32),

    #[error("turn queue is empty")]
    EmptyTurnQueue,

    #[error("match is already over")]
    MatchOver,
}
