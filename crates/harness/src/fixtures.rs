//! Complete records for collections that are validated against a typed model.

use serde_json::{Value, json};

/// A `BallItem` accepted by the item validator.
pub fn ball(db_symbol: &str, id: u32) -> Value {
    json!({
        "klass": "BallItem", "id": id, "dbSymbol": db_symbol, "icon": db_symbol,
        "price": 200, "socket": 3, "position": id,
        "isBattleUsable": true, "isMapUsable": false, "isLimited": true, "isHoldable": true,
        "flingPower": 0, "catchRate": 1, "spriteFilename": format!("ball_{id}"),
        "color": {"red": 255, "green": 0, "blue": 0, "alpha": 255}
    })
}

/// A plain physical move accepted by the move validator.
pub fn physical_move(db_symbol: &str, id: u32) -> Value {
    json!({
        "klass": "Move", "id": id, "dbSymbol": db_symbol, "mapUse": 0,
        "battleEngineMethod": "s_basic", "type": "normal",
        "power": 40, "accuracy": 100, "pp": 35, "category": "physical",
        "movecriticalRate": 1, "priority": 0,
        "isAuthentic": false, "isBallistics": false, "isBite": false, "isBlocable": true,
        "isCharge": false, "isDance": false, "isDirect": true, "isDistance": false,
        "isGravity": false, "isHeal": false, "isKingRockUtility": true,
        "isMagicCoatAffected": false, "isMental": false, "isMirrorMove": true,
        "isNonSkyBattle": false, "isPowder": false, "isPulse": false, "isPunch": false,
        "isRecharge": false, "isSnatchable": false, "isSoundAttack": false,
        "isSlicingAttack": false, "isUnfreeze": false, "isWind": false,
        "battleEngineAimedTarget": "adjacent_pokemon",
        "battleStageMod": [],
        "moveStatus": []
    })
}

/// `record` with `field` replaced.
pub fn with(mut record: Value, field: &str, value: impl Into<Value>) -> Value {
    if let Some(map) = record.as_object_mut() {
        map.insert(field.to_string(), value.into());
    }
    record
}
