// Application state module
// Shared, read-only state handed to every request

use super::types::Config;
use crate::upload::ImageStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: ImageStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = ImageStore::new(&config.storage.root, &config.storage.public_path);
        Self { config, store }
    }
}
