use crate::catalog::Catalog;
use crate::dataset::{Dataset, DatasetSource};
use crate::error::{Error, Result};
use log::{error, info, warn};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// What a presentation layer sees when it asks for the catalog.
#[derive(Debug, Clone)]
pub enum CatalogState {
    /// Loading has not finished.
    NotLoaded,
    /// Loading finished with no characters, possibly because it failed.
    Empty,
    /// Loading finished with data.
    Ready(Arc<Catalog>),
}

impl CatalogState {
    /// Returns whether loading has finished, with or without data.
    pub fn is_loaded(&self) -> bool {
        !matches!(self, CatalogState::NotLoaded)
    }
}

#[derive(Debug)]
struct Installed {
    catalog: Arc<Catalog>,
    failure: Option<String>,
}

/// A catalog that is installed exactly once, possibly from a background thread.
///
/// The catalog and the reason a load failed are published together, so a
/// reader that sees `Empty` after a failed load also sees the failure.
#[derive(Debug, Default)]
pub struct CatalogHandle {
    installed: OnceCell<Installed>,
}

impl CatalogHandle {
    /// Creates a handle in the `NotLoaded` state.
    pub fn new() -> Self {
        CatalogHandle::default()
    }

    /// Creates a handle that is already loaded.
    pub fn with_catalog(catalog: Catalog) -> Self {
        let handle = CatalogHandle::new();
        handle.install(Ok(catalog));
        handle
    }

    /// Installs the result of a load.
    ///
    /// A failed load installs an empty catalog and records the reason, so
    /// queries degrade to "loaded and empty". Returns `false` if a catalog
    /// was already installed, in which case nothing changes.
    pub fn install(&self, loaded: Result<Catalog>) -> bool {
        let (catalog, failure) = match loaded {
            Ok(catalog) => (catalog, None),
            Err(Error::DatasetUnavailable(reason)) => (Catalog::empty(), Some(reason)),
            Err(other) => (Catalog::empty(), Some(other.to_string())),
        };
        let installed = Installed {
            catalog: Arc::new(catalog),
            failure,
        };
        if self.installed.set(installed).is_err() {
            warn!("catalog already installed, ignoring reload");
            return false;
        }
        if let Some(installed) = self.installed.get() {
            match &installed.failure {
                Some(reason) => error!("catalog unavailable: {}", reason),
                None => info!(
                    "catalog loaded: {} groups, {} characters",
                    installed.catalog.list_groups().len(),
                    installed.catalog.len()
                ),
            }
        }
        true
    }

    /// Loads `source` on the calling thread and installs the result.
    pub fn load_blocking(&self, source: &DatasetSource) -> bool {
        info!("loading dataset from {:?}", source);
        let loaded = source.load().map(|dataset: Dataset| Catalog::new(&dataset));
        self.install(loaded)
    }

    /// Loads `source` on a worker thread.
    pub fn spawn_load(self: &Arc<Self>, source: DatasetSource) -> JoinHandle<bool> {
        let handle = Arc::clone(self);
        thread::spawn(move || handle.load_blocking(&source))
    }

    /// The current lifecycle state.
    pub fn state(&self) -> CatalogState {
        match self.installed.get() {
            None => CatalogState::NotLoaded,
            Some(installed) if installed.catalog.is_empty() => CatalogState::Empty,
            Some(installed) => CatalogState::Ready(Arc::clone(&installed.catalog)),
        }
    }

    /// The installed catalog, empty or not.
    pub fn catalog(&self) -> Option<Arc<Catalog>> {
        self.installed
            .get()
            .map(|installed| Arc::clone(&installed.catalog))
    }

    /// Why loading failed, if it did.
    pub fn load_failure(&self) -> Option<&str> {
        self.installed.get()?.failure.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codepoint_ty::Codepoint;
    use std::path::PathBuf;

    #[test]
    fn test_starts_not_loaded() {
        let handle = CatalogHandle::new();
        assert!(matches!(handle.state(), CatalogState::NotLoaded));
        assert!(!handle.state().is_loaded());
        assert!(handle.catalog().is_none());
    }

    #[test]
    fn test_failed_load_is_empty_not_missing() {
        let handle = CatalogHandle::new();
        let source = DatasetSource::Snapshot(PathBuf::from("/nonexistent/ucd.toml"));
        assert!(handle.load_blocking(&source));
        assert!(matches!(handle.state(), CatalogState::Empty));
        assert!(handle.load_failure().unwrap().contains("/nonexistent/ucd.toml"));
        assert!(handle.catalog().unwrap().list_groups().is_empty());
    }

    #[test]
    fn test_loaded_with_data() {
        let mut dataset = Dataset::new();
        dataset.push_group("Arrows");
        dataset.push_character(Codepoint::from('\u{2190}'), "LEFTWARDS ARROW", "Arrows");
        let handle = CatalogHandle::with_catalog(Catalog::new(&dataset));
        match handle.state() {
            CatalogState::Ready(catalog) => assert_eq!(catalog.len(), 1),
            other => panic!("unexpected state {:?}", other),
        }
        assert!(handle.load_failure().is_none());
    }

    #[test]
    fn test_install_only_once() {
        let handle = CatalogHandle::new();
        assert!(handle.install(Ok(Catalog::empty())));
        assert!(!handle.install(Err(Error::DatasetUnavailable("late".into()))));
        assert!(handle.load_failure().is_none());
    }

    #[test]
    fn test_failure_visible_with_empty_state() {
        let handle = Arc::new(CatalogHandle::new());
        let reader = {
            let handle = Arc::clone(&handle);
            thread::spawn(move || loop {
                match handle.state() {
                    CatalogState::NotLoaded => thread::yield_now(),
                    CatalogState::Empty => {
                        assert_eq!(handle.load_failure(), Some("disk gone"));
                        break;
                    }
                    CatalogState::Ready(_) => panic!("failed load reported as ready"),
                }
            })
        };
        assert!(handle.install(Err(Error::DatasetUnavailable("disk gone".into()))));
        reader.join().unwrap();
    }

    #[test]
    fn test_background_load_of_bundled_snapshot() {
        let handle = Arc::new(CatalogHandle::new());
        let worker = handle.spawn_load(DatasetSource::Bundled);
        assert!(worker.join().unwrap());
        assert!(matches!(handle.state(), CatalogState::Ready(_)));
    }
}
