//! Project state of the editor: the entity store, selection slots and dirty
//! set behind one accessor, plus loading and saving through the worker.

pub mod accessor;
pub mod close;
pub mod error;
pub mod loader;
pub mod navigation;
pub mod save;
pub mod state;
pub mod text_flags;

pub use accessor::ProjectData;
pub use close::{CloseHandshake, CloseOutcome};
pub use error::EngineError;
pub use loader::{build_state, load_project};
pub use navigation::{Direction, NavigationOrder, adjacent_identifier};
pub use save::{
    PlannedEntry, SaveAction, SaveFailure, SavePlan, SaveReport, SaveTarget, begin_save, execute_save,
    finish_save, save_project,
};
pub use state::{CollectionMap, ProjectSnapshot, ProjectState};
pub use text_flags::TextDirtyFlags;
