//! Process-wide holder for the current tile library snapshot.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;

use crate::{LibraryError, TileLibrary};

/// Shared pointer to the current [`TileLibrary`].
///
/// Readers take an `Arc` snapshot once per request and never touch the holder
/// again; a reload builds a complete library first and only then swaps the
/// pointer, so a reader sees either the old or the new library.
#[derive(Debug, Clone, Default)]
pub struct LibraryHolder {
    current: Arc<RwLock<Arc<TileLibrary>>>,
}

impl LibraryHolder {
    /// Creates a holder publishing `library`.
    pub fn new(library: TileLibrary) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(library))),
        }
    }

    /// Returns the current snapshot.
    ///
    /// # Errors
    /// Returns [`LibraryError::LockPoisoned`] when a writer panicked.
    pub fn snapshot(&self) -> Result<Arc<TileLibrary>, LibraryError> {
        let current = self
            .current
            .read()
            .map_err(|_| LibraryError::LockPoisoned)?;
        Ok(Arc::clone(&current))
    }

    /// Publishes `library` and returns the snapshot it replaced.
    ///
    /// # Errors
    /// Returns [`LibraryError::LockPoisoned`] when a writer panicked.
    pub fn replace(&self, library: TileLibrary) -> Result<Arc<TileLibrary>, LibraryError> {
        let mut current = self
            .current
            .write()
            .map_err(|_| LibraryError::LockPoisoned)?;
        Ok(std::mem::replace(&mut *current, Arc::new(library)))
    }

    /// Rebuilds the library from `dir` and publishes it.
    ///
    /// Returns the number of indexed tiles. On a build failure the current
    /// snapshot stays published.
    ///
    /// # Errors
    /// Returns [`LibraryError`] when the directory cannot be read or the lock
    /// is poisoned.
    pub fn reload(&self, dir: impl Into<PathBuf>) -> Result<usize, LibraryError> {
        let library = TileLibrary::build(dir.into())?;
        let tiles = library.len();
        self.replace(library)?;
        Ok(tiles)
    }

    /// Runs [`LibraryHolder::reload`] on a background thread.
    ///
    /// # Errors
    /// Returns [`LibraryError::Spawn`] when the thread cannot be started.
    pub fn spawn_reload(
        &self,
        dir: impl Into<PathBuf>,
    ) -> Result<JoinHandle<Result<usize, LibraryError>>, LibraryError> {
        let holder = self.clone();
        let dir = dir.into();

        std::thread::Builder::new()
            .name("photomosaic-library-reload".to_string())
            .spawn(move || {
                let outcome = holder.reload(&dir);
                match &outcome {
                    Ok(tiles) => tracing::info!(dir = %dir.display(), tiles, "tile library reloaded"),
                    Err(error) => {
                        tracing::error!(dir = %dir.display(), error = %error, "tile library reload failed")
                    }
                }
                outcome
            })
            .map_err(LibraryError::Spawn)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for snapshot publication.

    use std::path::PathBuf;

    use photomosaic_core::AverageColor;

    use super::*;
    use crate::TileEntry;

    fn single(key: &str) -> TileLibrary {
        TileLibrary::from_entries(vec![TileEntry {
            key: PathBuf::from(key),
            color: AverageColor::from_rgb8(1, 2, 3),
        }])
    }

    #[test]
    fn snapshot_survives_replace() {
        let holder = LibraryHolder::new(single("old"));
        let before = holder.snapshot().expect("snapshot should be readable");

        let previous = holder.replace(single("new")).expect("replace should work");
        let after = holder.snapshot().expect("snapshot should be readable");

        assert_eq!(before.entries()[0].key, PathBuf::from("old"));
        assert_eq!(previous.entries()[0].key, PathBuf::from("old"));
        assert_eq!(after.entries()[0].key, PathBuf::from("new"));
    }

    #[test]
    fn failed_reload_keeps_current_snapshot() {
        let holder = LibraryHolder::new(single("kept"));
        let result = holder.reload("/definitely/not/a/tile/dir");

        assert!(matches!(result, Err(LibraryError::ReadDir { .. })));
        let current = holder.snapshot().expect("snapshot should be readable");
        assert_eq!(current.entries()[0].key, PathBuf::from("kept"));
    }
}
