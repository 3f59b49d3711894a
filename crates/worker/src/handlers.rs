use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use studio_bridge::{
    DeleteEntityRequest, FileExistsRequest, ProjectConfigsPayload, ProjectDataPayload, ProjectTextsPayload,
    Router, SaveEntityRequest, SaveTextFileRequest, StartGameCommand, SyncHandlers, channels,
};
use studio_core::Collection;
use studio_storage::{ProjectStorage, StorageError};

use crate::error::WorkerError;

pub type SharedStorage = Arc<Mutex<Box<dyn ProjectStorage + Send>>>;

/// Hex blake3 digest of `content`.
pub fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// Queries both sides answer inline; the UI builds its client with these.
pub fn sync_handlers() -> SyncHandlers {
    let mut router = Router::new();
    register_sync(&mut router);
    router.sync_handlers()
}

fn register_sync(router: &mut Router) {
    router.handle_sync(channels::GET_CONTENT_HASH, |content: String| {
        Ok::<_, WorkerError>(content_hash(&content))
    });
}

/// Run `f` against the storage on the blocking pool.
async fn with_storage<T, F>(storage: &SharedStorage, f: F) -> Result<T, WorkerError>
where
    T: Send + 'static,
    F: FnOnce(&mut (dyn ProjectStorage + Send)) -> Result<T, StorageError> + Send + 'static,
{
    let storage = Arc::clone(storage);
    let result = tokio::task::spawn_blocking(move || {
        let mut guard = storage.lock();
        f(&mut **guard)
    })
    .await
    .map_err(|e| WorkerError::Task(e.to_string()))?;
    Ok(result?)
}

/// Resolve a project-relative path, refusing anything that could leave
/// the project folder.
fn resolve_in_project(root: &Path, relative: &str) -> Result<PathBuf, WorkerError> {
    let path = Path::new(relative);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(WorkerError::InvalidPath(relative.to_string()));
    }
    Ok(root.join(path))
}

/// Worker-side state: the project storage plus the close signal.
pub struct Worker {
    storage: SharedStorage,
    project_root: PathBuf,
    close_confirmed: Arc<Notify>,
}

impl Worker {
    pub fn new(storage: impl ProjectStorage + Send + 'static, project_root: impl Into<PathBuf>) -> Self {
        Self {
            storage: Arc::new(Mutex::new(Box::new(storage))),
            project_root: project_root.into(),
            close_confirmed: Arc::new(Notify::new()),
        }
    }

    pub fn storage(&self) -> SharedStorage {
        Arc::clone(&self.storage)
    }

    /// Notified once the UI sends `window-close-confirmed`.
    pub fn close_confirmed(&self) -> Arc<Notify> {
        Arc::clone(&self.close_confirmed)
    }

    /// Router serving every project channel.
    pub fn router(&self) -> Router {
        let mut router = Router::new();
        register_sync(&mut router);

        let storage = self.storage();
        router.handle(channels::READ_PROJECT_DATA, move |_: ()| {
            let storage = Arc::clone(&storage);
            async move {
                with_storage(&storage, |store| {
                    let mut collections = BTreeMap::new();
                    for collection in Collection::ALL {
                        let records: BTreeMap<_, _> = store.load_collection(collection)?.into_iter().collect();
                        collections.insert(collection, records);
                    }
                    Ok(ProjectDataPayload { collections })
                })
                .await
            }
        });

        let storage = self.storage();
        router.handle(channels::READ_PROJECT_CONFIGS, move |_: ()| {
            let storage = Arc::clone(&storage);
            async move {
                with_storage(&storage, |store| {
                    Ok(ProjectConfigsPayload {
                        language: store.load_language_config()?,
                    })
                })
                .await
            }
        });

        let storage = self.storage();
        router.handle(channels::READ_PROJECT_TEXTS, move |_: ()| {
            let storage = Arc::clone(&storage);
            async move {
                with_storage(&storage, |store| {
                    Ok(ProjectTextsPayload {
                        files: store.load_texts()?.files,
                    })
                })
                .await
            }
        });

        let storage = self.storage();
        router.handle(channels::SAVE_PROJECT_DATA, move |req: SaveEntityRequest| {
            let storage = Arc::clone(&storage);
            async move {
                if req.entity.db_symbol() != Some(req.db_symbol.as_str()) {
                    return Err(WorkerError::SymbolMismatch {
                        expected: req.db_symbol.into_string(),
                        found: req.entity.db_symbol().unwrap_or_default().to_string(),
                    });
                }
                tracing::debug!(collection = %req.collection, id = %req.db_symbol, "saving entity");
                with_storage(&storage, move |store| {
                    store.save_entity(req.collection, &req.db_symbol, &req.entity)
                })
                .await
            }
        });

        let storage = self.storage();
        router.handle(channels::DELETE_PROJECT_DATA, move |req: DeleteEntityRequest| {
            let storage = Arc::clone(&storage);
            async move {
                tracing::debug!(collection = %req.collection, id = %req.db_symbol, "deleting entity");
                with_storage(&storage, move |store| store.delete_entity(req.collection, &req.db_symbol)).await
            }
        });

        let storage = self.storage();
        router.handle(channels::SAVE_PROJECT_TEXTS, move |req: SaveTextFileRequest| {
            let storage = Arc::clone(&storage);
            async move {
                tracing::debug!(file_id = req.file_id, "saving text file");
                with_storage(&storage, move |store| store.save_text_file(req.file_id, &req.table)).await
            }
        });

        let root = self.project_root.clone();
        router.handle(channels::FILE_EXISTS, move |req: FileExistsRequest| {
            let root = root.clone();
            async move {
                let path = resolve_in_project(&root, &req.path)?;
                Ok::<_, WorkerError>(tokio::task::spawn_blocking(move || path.exists())
                    .await
                    .map_err(|e| WorkerError::Task(e.to_string()))?)
            }
        });

        router.on(channels::START_GAME, |command: StartGameCommand| async move {
            tracing::info!(mode = ?command.mode, "game launch requested");
        });

        let close_confirmed = self.close_confirmed();
        router.on(channels::WINDOW_CLOSE_CONFIRMED, move |_: ()| {
            let close_confirmed = Arc::clone(&close_confirmed);
            async move {
                tracing::info!("ui confirmed window close");
                close_confirmed.notify_one();
            }
        });

        router
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_hex_blake3() {
        let hash = content_hash("tackle");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, content_hash("tackle"));
        assert_ne!(hash, content_hash("Tackle"));
    }

    #[test]
    fn sync_hash_answers_inline() {
        let sync = sync_handlers();
        let payload = studio_bridge::encode_payload("ember").unwrap();
        let answer: String = studio_bridge::decode_payload(&sync.call(channels::GET_CONTENT_HASH, &payload).unwrap()).unwrap();
        assert_eq!(answer, content_hash("ember"));
    }

    #[test]
    fn paths_cannot_leave_the_project() {
        let root = Path::new("/projects/demo");
        assert_eq!(
            resolve_in_project(root, "Data/Studio/moves/tackle.json").unwrap(),
            root.join("Data/Studio/moves/tackle.json")
        );
        assert!(resolve_in_project(root, "../secrets").is_err());
        assert!(resolve_in_project(root, "/etc/passwd").is_err());
    }
}
