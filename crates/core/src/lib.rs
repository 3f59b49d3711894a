pub mod dirty;
pub mod entity;
pub mod error;
pub mod ids;
pub mod models;
pub mod text;
pub mod validate;

pub use dirty::{DirtyEntry, DirtyKey, DirtySet, SaveIntent};
pub use entity::Entity;
pub use error::CoreError;
pub use ids::*;
pub use text::{BoundEntity, LanguageConfig, ProjectText, TextBinding, TextTable};
pub use validate::{
    BaseValidator, EntityValidator, ItemValidator, MoveValidator, TypedValidator, ValidatorSet,
};
