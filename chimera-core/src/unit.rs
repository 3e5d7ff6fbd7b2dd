//! Unit templates and live units

use crate::error::{CoreError, Result};
use crate::hex::Offset;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Identity of a spawned unit, unique for the lifetime of a match
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Side a unit fights for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Allegiance {
    Player,
    Enemy,
}

/// Stats a unit is spawned from. `name` doubles as the unit type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub max_health: i32,
    pub attack: i32,
    pub movement_range: i32,
    pub attack_range: i32,
    /// Unit types this one deals double damage to
    #[serde(default)]
    pub bonus_against: Vec<String>,
}

impl UnitTemplate {
    pub fn new(
        name: &str,
        max_health: i32,
        attack: i32,
        movement_range: i32,
        attack_range: i32,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            max_health,
            attack,
            movement_range,
            attack_range,
            bonus_against: Vec::new(),
        }
    }

    pub fn with_bonus_against(mut self, types: &[&str]) -> Self {
        self.bonus_against = types.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Reject stats no unit could legally use
    pub fn validate(&self) -> Result<()> {
        let reason = if self.max_health <= 0 {
            "max_health must be positive"
        } else if self.movement_range < 0 {
            "movement_range must not be negative"
        } else if self.attack_range < 1 {
            "attack_range must be at least 1"
        } else if self.attack < 0 {
            "attack must not be negative"
        } else {
            return Ok(());
        };

        Err(CoreError::InvalidTemplate {
            name: self.name.clone(),
            reason,
        })
    }
}

/// Built-in roster: each type counters one other
pub fn standard_templates() -> Vec<UnitTemplate> {
    vec![
        UnitTemplate::new("Swordsman", 40, 10, 3, 1).with_bonus_against(&["Spearman"]),
        UnitTemplate::new("Spearman", 35, 9, 3, 1).with_bonus_against(&["Cavalry"]),
        UnitTemplate::new("Cavalry", 45, 12, 5, 1).with_bonus_against(&["Archer"]),
        UnitTemplate::new("Archer", 25, 8, 3, 2).with_bonus_against(&["Swordsman"]),
    ]
}

/// A unit in play
#[derive(Clone, Debug)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub allegiance: Allegiance,
    pub max_health: i32,
    current_health: i32,
    pub attack: i32,
    pub movement_range: i32,
    pub attack_range: i32,
    pub movement_remaining: i32,
    pub bonus_against: FxHashSet<String>,
    pub tile: Offset,

    /// Tiles the unit can stand on or threaten this turn
    pub movement_tiles_in_range: FxHashSet<Offset>,
    /// Ring of tiles at exactly attack range
    pub attack_tiles_in_range: FxHashSet<Offset>,
}

impl Unit {
    pub fn from_template(
        id: UnitId,
        template: &UnitTemplate,
        allegiance: Allegiance,
        tile: Offset,
    ) -> Self {
        Self {
            id,
            name: template.name.clone(),
            allegiance,
            max_health: template.max_health,
            current_health: template.max_health,
            attack: template.attack,
            movement_range: template.movement_range,
            attack_range: template.attack_range,
            movement_remaining: 0,
            bonus_against: template.bonus_against.iter().cloned().collect(),
            tile,
            movement_tiles_in_range: FxHashSet::default(),
            attack_tiles_in_range: FxHashSet::default(),
        }
    }

    pub fn current_health(&self) -> i32 {
        self.current_health
    }

    pub fn is_alive(&self) -> bool {
        self.current_health > 0
    }

    pub fn is_foe(&self, other: &Unit) -> bool {
        self.allegiance != other.allegiance
    }

    /// Damage this unit deals to `defender`, doubled on a type bonus
    pub fn damage_against(&self, defender: &Unit) -> i32 {
        if self.bonus_against.contains(&defender.name) {
            self.attack * 2
        } else {
            self.attack
        }
    }

    /// Apply damage and return the health left (may go below zero)
    pub(crate) fn take_damage(&mut self, damage: i32) -> i32 {
        self.current_health -= damage;
        self.current_health
    }
}
