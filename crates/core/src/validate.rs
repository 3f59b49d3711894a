use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use crate::entity::Entity;
use crate::error::CoreError;
use crate::ids::{Collection, DbSymbol};
use crate::models::{StudioItem, StudioMove};

/// Checks an entity's shape before it is accepted into the store.
pub trait EntityValidator: Send + Sync {
    fn validate(&self, entity: &Entity) -> Result<(), String>;
}

/// Shape every collection shares: a `klass`, a valid `dbSymbol`, and a
/// non-negative integer `id` when one is present.
pub struct BaseValidator;

impl EntityValidator for BaseValidator {
    fn validate(&self, entity: &Entity) -> Result<(), String> {
        if entity.klass().is_none() {
            return Err("missing klass".into());
        }
        let symbol = entity.db_symbol().ok_or("missing dbSymbol")?;
        DbSymbol::new(symbol).map_err(|e| e.to_string())?;
        if let Some(id) = entity.get("id")
            && id.as_u64().is_none()
        {
            return Err(format!("id must be a non-negative integer, got {id}"));
        }
        Ok(())
    }
}

/// Validates by decoding into a typed model, then running its range checks.
pub struct TypedValidator<T> {
    check: fn(&T) -> Result<(), CoreError>,
}

impl<T> TypedValidator<T> {
    pub fn new(check: fn(&T) -> Result<(), CoreError>) -> Self {
        Self { check }
    }
}

impl<T: DeserializeOwned> EntityValidator for TypedValidator<T> {
    fn validate(&self, entity: &Entity) -> Result<(), String> {
        let typed: T =
            serde_json::from_value(entity.clone().into_value()).map_err(|e| e.to_string())?;
        (self.check)(&typed).map_err(|e| e.to_string())
    }
}

pub type MoveValidator = TypedValidator<StudioMove>;
pub type ItemValidator = TypedValidator<StudioItem>;

/// Validator per collection. Collections without a dedicated validator use
/// [`BaseValidator`].
pub struct ValidatorSet {
    validators: BTreeMap<Collection, Box<dyn EntityValidator>>,
    fallback: BaseValidator,
}

impl Default for ValidatorSet {
    fn default() -> Self {
        let mut set = Self::empty();
        set.register(
            Collection::Moves,
            MoveValidator::new(StudioMove::check_ranges),
        );
        set.register(
            Collection::Items,
            ItemValidator::new(StudioItem::check_ranges),
        );
        set
    }
}

impl ValidatorSet {
    pub fn empty() -> Self {
        Self {
            validators: BTreeMap::new(),
            fallback: BaseValidator,
        }
    }

    pub fn register(&mut self, collection: Collection, validator: impl EntityValidator + 'static) {
        self.validators.insert(collection, Box::new(validator));
    }

    /// Validate `entity` stored under `key` in `collection`. The key must
    /// match the entity's own `dbSymbol`.
    pub fn validate(&self, collection: Collection, key: &str, entity: &Entity) -> Result<(), CoreError> {
        let invalid = |reason: String| CoreError::InvalidEntity {
            collection,
            db_symbol: key.to_string(),
            reason,
        };
        self.fallback.validate(entity).map_err(invalid)?;
        if entity.db_symbol() != Some(key) {
            return Err(invalid(format!(
                "stored under {key} but dbSymbol is {}",
                entity.db_symbol().unwrap_or_default()
            )));
        }
        if let Some(validator) = self.validators.get(&collection) {
            validator.validate(entity).map_err(invalid)?;
        }
        Ok(())
    }
}
