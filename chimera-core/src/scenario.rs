//! Scenario - board size, unit roster, and starting positions

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;
use crate::engine::TurnEngine;
use crate::error::{CoreError, Result};
use crate::grid::Grid;
use crate::hex::{Oddity, Offset};
use crate::unit::{standard_templates, Allegiance, UnitTemplate};

/// One unit to spawn at match start
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub template: String,
    pub position: Offset,
}

impl Placement {
    pub fn new(template: &str, col: i32, row: i32) -> Self {
        Self {
            template: template.to_string(),
            position: Offset::new(col, row),
        }
    }
}

/// Everything needed to set up a match
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub oddity: Oddity,
    /// Roster the placements refer to by name
    #[serde(default = "standard_templates")]
    pub templates: Vec<UnitTemplate>,
    pub player_units: Vec<Placement>,
    pub enemy_units: Vec<Placement>,
}

impl Scenario {
    /// Load from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn template(&self, name: &str) -> Result<&UnitTemplate> {
        self.templates
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| CoreError::UnknownTemplate(name.to_string()))
    }

    /// Reject templates no unit could legally use
    pub fn validate(&self) -> Result<()> {
        self.templates.iter().try_for_each(UnitTemplate::validate)
    }

    /// Generate the grid, spawn player units then enemy units, and shuffle
    /// the turn order if the config carries a seed
    pub fn build(&self, config: &MatchConfig) -> Result<TurnEngine> {
        self.validate()?;

        let grid = Grid::generate(self.width, self.height, self.oddity)?;
        let mut engine = TurnEngine::new(grid, config.clone());

        let sides = [
            (Allegiance::Player, &self.player_units),
            (Allegiance::Enemy, &self.enemy_units),
        ];
        for (allegiance, placements) in sides {
            for placement in placements {
                let template = self.template(&placement.template)?;
                engine.spawn_unit(template, placement.position, allegiance)?;
            }
        }

        if let Some(seed) = config.shuffle_seed {
            engine.shuffle_turn_order(seed);
        }

        tracing::info!(
            "scenario {}: {}x{} board, {} player units, {} enemy units",
            self.name,
            self.width,
            self.height,
            self.player_units.len(),
            self.enemy_units.len()
        );
        Ok(engine)
    }
}

impl Default for Scenario {
    /// Two lines of the standard roster facing each other
    fn default() -> Self {
        Self {
            name: "skirmish".to_string(),
            width: 10,
            height: 8,
            oddity: Oddity::Odd,
            templates: standard_templates(),
            player_units: vec![
                Placement::new("Swordsman", 1, 2),
                Placement::new("Spearman", 1, 4),
                Placement::new("Archer", 0, 3),
                Placement::new("Cavalry", 1, 6),
            ],
            enemy_units: vec![
                Placement::new("Swordsman", 8, 2),
                Placement::new("Spearman", 8, 4),
                Placement::new("Archer", 9, 3),
                Placement::new("Cavalry", 8, 6),
            ],
        }
    }
}
