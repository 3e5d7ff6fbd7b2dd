//! Chimera Core - hex-grid tactics engine
//!
//! This crate provides the core logic for turn-based hex skirmishes:
//! - Hex geometry (offset and cube coordinates)
//! - Grid of tiles with occupancy
//! - A* pathfinding and range queries
//! - Greedy tactical AI
//! - Turn engine with combat resolution

pub mod hex;
pub mod grid;
pub mod unit;
pub mod error;
pub mod pathfinding;
pub mod ai;
pub mod engine;
pub mod scenario;
pub mod config;
pub mod log;

// Re-exports for convenient access
pub use hex::{Axis, Cube, Direction, HexLayout, Oddity, Offset};
pub use grid::{Grid, Tile};
pub use unit::{standard_templates, Allegiance, Unit, UnitId, UnitTemplate};
pub use error::{CoreError, Result};
pub use pathfinding::{Path, Pathfinder};
pub use ai::{Action, TacticalAI};
pub use engine::{DamageResult, Event, Outcome, Phase, TurnEngine};
pub use scenario::{Placement, Scenario};
pub use config::MatchConfig;
pub use log::CombatLog;
