//! Registry for source-language readers.

use crate::traits::Reader;
use std::sync::{OnceLock, RwLock};

/// Global reader registry.
static READERS: RwLock<Vec<&'static dyn Reader>> = RwLock::new(Vec::new());
static READERS_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Register a custom reader.
pub fn register_reader(reader: &'static dyn Reader) {
    READERS
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .push(reader);
}

fn init_readers() {
    READERS_INITIALIZED.get_or_init(|| {
        #[cfg(feature = "read-go")]
        {
            register_reader(&crate::input::go::GO_READER);
        }
    });
}

fn snapshot() -> Vec<&'static dyn Reader> {
    init_readers();
    READERS
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Get a reader by language name.
pub fn reader_for_language(lang: &str) -> Option<&'static dyn Reader> {
    snapshot().into_iter().find(|r| r.language() == lang)
}

/// Get a reader by file extension.
pub fn reader_for_extension(ext: &str) -> Option<&'static dyn Reader> {
    snapshot()
        .into_iter()
        .find(|r| r.extensions().contains(&ext))
}

/// Get all registered readers.
pub fn readers() -> Vec<&'static dyn Reader> {
    snapshot()
}
