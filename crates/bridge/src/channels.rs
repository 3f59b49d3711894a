//! Names of the channels the worker serves.

pub const READ_PROJECT_DATA: &str = "read-project-data";
pub const READ_PROJECT_CONFIGS: &str = "read-project-configs";
pub const READ_PROJECT_TEXTS: &str = "read-project-texts";
pub const SAVE_PROJECT_DATA: &str = "save-project-data";
pub const DELETE_PROJECT_DATA: &str = "delete-project-data";
pub const SAVE_PROJECT_TEXTS: &str = "save-project-texts";
pub const FILE_EXISTS: &str = "file-exists";

/// Synchronous: answered inline on the caller.
pub const GET_CONTENT_HASH: &str = "get-content-hash";

/// Fire-and-forget.
pub const START_GAME: &str = "start-game";
pub const WINDOW_CLOSE_CONFIRMED: &str = "window-close-confirmed";

/// Worker to UI events.
pub const REQUEST_WINDOW_CLOSE: &str = "request-window-close";
