use crate::services::notify::Notifier;
use crate::storage::{FileStore, Store};
use std::sync::Arc;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub files: FileStore,
    pub notifier: Option<Arc<Notifier>>,
    pub admin_username: String,
    pub admin_password: String,
}

pub type SharedState = Arc<AppState>;
