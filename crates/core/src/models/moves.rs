use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::DbSymbol;

pub const MOVE_NAME_TEXT_ID: u32 = 100_006;
pub const MOVE_DESCRIPTION_TEXT_ID: u32 = 100_007;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveTarget {
    AdjacentPokemon,
    AdjacentFoe,
    AdjacentAllFoe,
    AllFoe,
    AdjacentAllPokemon,
    AllPokemon,
    User,
    UserOrAdjacentAlly,
    AdjacentAlly,
    AllAlly,
    AllAllyButUser,
    AnyOtherPokemon,
    RandomFoe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BattleStage {
    AtkStage,
    DfeStage,
    AtsStage,
    DfsStage,
    SpdStage,
    EvaStage,
    AccStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoveStatusKind {
    Poisoned,
    Paralyzed,
    Burn,
    Asleep,
    Frozen,
    Toxic,
    Confused,
    Death,
    Flinch,
    #[serde(rename = "__undef__")]
    Undefined,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleStageMod {
    pub battle_stage: BattleStage,
    pub modificator: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveStatus {
    pub status: Option<MoveStatusKind>,
    pub luck_rate: u32,
}

fn default_effect_chance() -> u32 {
    100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioMove {
    pub klass: String,
    pub id: u32,
    pub db_symbol: DbSymbol,
    pub map_use: u32,
    pub battle_engine_method: String,
    #[serde(rename = "type")]
    pub move_type: DbSymbol,
    pub power: u32,
    pub accuracy: u32,
    pub pp: u32,
    pub category: MoveCategory,
    pub movecritical_rate: u8,
    pub priority: i32,
    pub is_authentic: bool,
    pub is_ballistics: bool,
    pub is_bite: bool,
    pub is_blocable: bool,
    pub is_charge: bool,
    pub is_dance: bool,
    pub is_direct: bool,
    pub is_distance: bool,
    #[serde(default)]
    pub is_effect_chance: bool,
    pub is_gravity: bool,
    pub is_heal: bool,
    pub is_king_rock_utility: bool,
    pub is_magic_coat_affected: bool,
    pub is_mental: bool,
    pub is_mirror_move: bool,
    pub is_non_sky_battle: bool,
    pub is_powder: bool,
    pub is_pulse: bool,
    pub is_punch: bool,
    pub is_recharge: bool,
    pub is_snatchable: bool,
    pub is_sound_attack: bool,
    pub is_slicing_attack: bool,
    pub is_unfreeze: bool,
    pub is_wind: bool,
    pub battle_engine_aimed_target: MoveTarget,
    pub battle_stage_mod: Vec<BattleStageMod>,
    pub move_status: Vec<MoveStatus>,
    #[serde(default = "default_effect_chance")]
    pub effect_chance: u32,
}

fn check(ok: bool, reason: impl FnOnce() -> String) -> Result<(), CoreError> {
    if ok {
        Ok(())
    } else {
        Err(CoreError::InvalidData(reason()))
    }
}

impl StudioMove {
    /// Range checks the type system does not carry.
    pub fn check_ranges(&self) -> Result<(), CoreError> {
        check(self.klass == "Move", || format!("klass must be Move, got {}", self.klass))?;
        check(self.map_use <= 999, || format!("mapUse {} above 999", self.map_use))?;
        check(is_engine_method(&self.battle_engine_method), || {
            format!("invalid battleEngineMethod {:?}", self.battle_engine_method)
        })?;
        check(self.power <= 999, || format!("power {} above 999", self.power))?;
        check(self.accuracy <= 100, || format!("accuracy {} above 100", self.accuracy))?;
        check(self.pp <= 99, || format!("pp {} above 99", self.pp))?;
        check(self.movecritical_rate <= 5, || {
            format!("movecriticalRate {} above 5", self.movecritical_rate)
        })?;
        check((-7..=7).contains(&self.priority), || {
            format!("priority {} outside -7..=7", self.priority)
        })?;
        check(self.effect_chance <= 100, || {
            format!("effectChance {} above 100", self.effect_chance)
        })?;
        for stage in &self.battle_stage_mod {
            check((-99..=99).contains(&stage.modificator), || {
                format!("battle stage modificator {} outside -99..=99", stage.modificator)
            })?;
        }
        for status in &self.move_status {
            check(status.luck_rate <= 100, || {
                format!("status luckRate {} above 100", status.luck_rate)
            })?;
        }
        Ok(())
    }

    /// Stage change applied by this move for `stage`, zero when absent.
    pub fn battle_stage_modificator(&self, stage: BattleStage) -> i32 {
        self.battle_stage_mod
            .iter()
            .find(|m| m.battle_stage == stage)
            .map(|m| m.modificator)
            .unwrap_or(0)
    }
}

/// `[a-z_][a-z0-9_]+`
fn is_engine_method(s: &str) -> bool {
    let mut chars = s.chars();
    let first_ok = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');
    first_ok && s.len() >= 2 && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
