//! In-memory source maps keyed by generated file path.

use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;
use source_map::SourceMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Source maps for generated files, shared between generation workers and
/// the diagnostic remapper.
///
/// One map is usually registered under several paths: where the file would
/// live in the source tree and where the overlay actually put it.
#[derive(Debug, Default)]
pub struct SourceMapRegistry {
    maps: RwLock<FxHashMap<Utf8PathBuf, Arc<SourceMap>>>,
}

impl SourceMapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `map` under every path in `paths`.
    pub fn insert<I, P>(&self, paths: I, map: SourceMap)
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        let map = Arc::new(map);
        let mut maps = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        for path in paths {
            maps.insert(path.into(), Arc::clone(&map));
        }
    }

    pub fn get(&self, path: &Utf8Path) -> Option<Arc<SourceMap>> {
        let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
        maps.get(path).cloned()
    }

    /// Number of registered paths.
    pub fn len(&self) -> usize {
        self.maps.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
