use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::DbSymbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl BallColor {
    pub fn display(&self) -> String {
        format!("{}, {}, {}, {}", self.red, self.green, self.blue, self.alpha)
    }
}

/// Fields shared by every item kind, plus the ball parameters of `BallItem`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioItem {
    pub klass: String,
    pub id: u32,
    pub db_symbol: DbSymbol,
    pub icon: String,
    pub price: u32,
    pub socket: u32,
    pub position: u32,
    pub is_battle_usable: bool,
    pub is_map_usable: bool,
    pub is_limited: bool,
    pub is_holdable: bool,
    pub fling_power: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catch_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<BallColor>,
}

pub const ITEM_KLASSES: &[&str] = &[
    "Item",
    "BallItem",
    "EventItem",
    "FleeingItem",
    "HealingItem",
    "AllPPHealItem",
    "PPHealItem",
    "PPIncreaseItem",
    "ConstantHealItem",
    "RateHealItem",
    "StatusConstantHealItem",
    "StatusHealItem",
    "StatusRateHealItem",
    "LevelIncreaseItem",
    "EVBoostItem",
    "StatBoostItem",
    "RepelItem",
    "StoneItem",
    "TechItem",
];

impl StudioItem {
    pub fn is_ball(&self) -> bool {
        self.klass == "BallItem"
    }

    /// Whether any usage flag is set.
    pub fn has_parameters(&self) -> bool {
        self.is_battle_usable || self.is_map_usable || self.is_limited || self.is_holdable
    }

    pub fn check_ranges(&self) -> Result<(), CoreError> {
        if !ITEM_KLASSES.contains(&self.klass.as_str()) {
            return Err(CoreError::InvalidData(format!("unknown item klass {}", self.klass)));
        }
        if self.socket > 6 {
            return Err(CoreError::InvalidData(format!("socket {} above 6", self.socket)));
        }
        if self.is_ball() {
            match (self.catch_rate, &self.sprite_filename, &self.color) {
                (Some(rate), Some(_), Some(_)) if rate <= 255 => {}
                (Some(rate), Some(_), Some(_)) => {
                    return Err(CoreError::InvalidData(format!("catchRate {rate} above 255")));
                }
                _ => {
                    return Err(CoreError::InvalidData(
                        "BallItem requires catchRate, spriteFilename and color".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}
