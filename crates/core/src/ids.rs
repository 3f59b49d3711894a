use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

use crate::error::CoreError;

/// Correlation id of a request/response call across the bridge.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", &self.0.to_string()[..8])
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// String identifier of an entity, unique within its collection.
///
/// Symbols are lowercase ascii words: `[a-z_][a-z0-9_]*`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DbSymbol(String);

impl DbSymbol {
    /// Placeholder symbol used when a collection has nothing to select.
    pub const UNDEFINED: &'static str = "__undef__";

    pub fn new(symbol: impl Into<String>) -> Result<Self, CoreError> {
        let symbol = symbol.into();
        if is_valid_symbol(&symbol) {
            Ok(Self(symbol))
        } else {
            Err(CoreError::InvalidSymbol(symbol))
        }
    }

    pub fn undefined() -> Self {
        Self(Self::UNDEFINED.to_string())
    }

    pub fn is_undefined(&self) -> bool {
        self.0 == Self::UNDEFINED
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

fn is_valid_symbol(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl fmt::Debug for DbSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DbSymbol({})", self.0)
    }
}

impl fmt::Display for DbSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DbSymbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for DbSymbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for DbSymbol {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for DbSymbol {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl TryFrom<&str> for DbSymbol {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for DbSymbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DbSymbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

/// The closed set of entity collections of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Pokemon,
    Moves,
    Items,
    Quests,
    Trainers,
    Types,
    Zones,
    Abilities,
    Groups,
    Dex,
    MapLinks,
    Maps,
}

impl Collection {
    pub const ALL: [Collection; 12] = [
        Self::Pokemon,
        Self::Moves,
        Self::Items,
        Self::Quests,
        Self::Trainers,
        Self::Types,
        Self::Zones,
        Self::Abilities,
        Self::Groups,
        Self::Dex,
        Self::MapLinks,
        Self::Maps,
    ];

    /// Key of the collection in project data payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pokemon => "pokemon",
            Self::Moves => "moves",
            Self::Items => "items",
            Self::Quests => "quests",
            Self::Trainers => "trainers",
            Self::Types => "types",
            Self::Zones => "zones",
            Self::Abilities => "abilities",
            Self::Groups => "groups",
            Self::Dex => "dex",
            Self::MapLinks => "mapLinks",
            Self::Maps => "maps",
        }
    }

    /// Name of the selection slot tracking the current entity of this collection.
    pub fn slot_name(&self) -> &'static str {
        match self {
            Self::Pokemon => "pokemon",
            Self::Moves => "move",
            Self::Items => "item",
            Self::Quests => "quest",
            Self::Trainers => "trainer",
            Self::Types => "type",
            Self::Zones => "zone",
            Self::Abilities => "ability",
            Self::Groups => "group",
            Self::Dex => "dex",
            Self::MapLinks => "mapLink",
            Self::Maps => "map",
        }
    }

    /// Folder under `Data/Studio` holding one JSON file per entity.
    pub fn folder(&self) -> &'static str {
        match self {
            Self::MapLinks => "maplinks",
            other => other.as_str(),
        }
    }

    /// Text file holding entity display names, indexed by entity id or text id.
    pub fn name_text_file(&self) -> Option<u32> {
        match self {
            Self::Pokemon => Some(100_000),
            Self::Types => Some(100_003),
            Self::Abilities => Some(100_004),
            Self::Moves => Some(100_006),
            Self::Zones => Some(100_010),
            Self::Items => Some(100_012),
            Self::Quests => Some(100_045),
            Self::Groups => Some(100_061),
            Self::Trainers => Some(100_062),
            Self::Dex => Some(100_063),
            Self::Maps => Some(100_065),
            Self::MapLinks => None,
        }
    }

    /// Whether the selection slot holds a `{ specie, form }` pair.
    pub fn has_compound_selection(&self) -> bool {
        matches!(self, Self::Pokemon)
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::InvalidData(format!("unknown collection: {s}")))
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Collection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Value of a selection slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectedIdentifier {
    Symbol(DbSymbol),
    Species { specie: DbSymbol, form: u32 },
}

impl SelectedIdentifier {
    pub fn undefined() -> Self {
        Self::Symbol(DbSymbol::undefined())
    }

    /// The entity symbol this selection points at.
    pub fn db_symbol(&self) -> &DbSymbol {
        match self {
            Self::Symbol(symbol) => symbol,
            Self::Species { specie, .. } => specie,
        }
    }

    /// Selection of `symbol` in the shape expected by `collection`'s slot.
    pub fn for_collection(collection: Collection, symbol: DbSymbol) -> Self {
        if collection.has_compound_selection() {
            Self::Species { specie: symbol, form: 0 }
        } else {
            Self::Symbol(symbol)
        }
    }
}

impl From<DbSymbol> for SelectedIdentifier {
    fn from(symbol: DbSymbol) -> Self {
        Self::Symbol(symbol)
    }
}

impl fmt::Display for SelectedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(symbol) => write!(f, "{symbol}"),
            Self::Species { specie, form } => write!(f, "{specie}#{form}"),
        }
    }
}
