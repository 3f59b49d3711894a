pub mod error;
pub mod fs;
pub mod schema;
pub mod sqlite;
pub mod text_table;
pub mod traits;

pub use error::StorageError;
pub use fs::FsProjectStorage;
pub use sqlite::SqliteStorage;
pub use traits::*;
