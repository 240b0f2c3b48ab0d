use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// State of one build invocation: the artifacts (re)produced so far.
///
/// Staleness checks read it concurrently; compile and link actions register
/// their output as each one completes.
#[derive(Debug, Default)]
pub struct BuildSession {
    rebuilt: RwLock<HashSet<PathBuf>>,
}

impl BuildSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_rebuilt(&self, artifact: &Path) {
        self.rebuilt.write().insert(artifact.to_path_buf());
    }

    pub fn was_rebuilt(&self, artifact: &Path) -> bool {
        self.rebuilt.read().contains(artifact)
    }

    pub fn rebuilt_count(&self) -> usize {
        self.rebuilt.read().len()
    }
}
