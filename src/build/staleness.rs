//! Timestamp-based currency checks.
//!
//! An artifact is stale when anything it transitively derives from is
//! strictly newer than it. Equal timestamps count as current.

use super::session::BuildSession;
use crate::project::{FileId, ProjectIndex};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Why an artifact has to be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    Missing,
    ConfigNewer,
    SourceNewer(PathBuf),
    PchRebuilt,
    ObjectRebuilt(PathBuf),
    ObjectNewer(PathBuf),
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::Missing => write!(f, "no previous artifact"),
            StaleReason::ConfigNewer => write!(f, "configuration changed"),
            StaleReason::SourceNewer(p) => write!(f, "{} changed", p.display()),
            StaleReason::PchRebuilt => write!(f, "precompiled header rebuilt"),
            StaleReason::ObjectRebuilt(p) => write!(f, "object {} rebuilt", p.display()),
            StaleReason::ObjectNewer(p) => write!(f, "object {} is newer", p.display()),
        }
    }
}

pub struct StalenessCheck<'a> {
    index: &'a ProjectIndex,
    session: &'a BuildSession,
    config_modified: Option<SystemTime>,
}

pub(crate) fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl<'a> StalenessCheck<'a> {
    pub fn new(
        index: &'a ProjectIndex,
        session: &'a BuildSession,
        config_modified: Option<SystemTime>,
    ) -> Self {
        Self {
            index,
            session,
            config_modified,
        }
    }

    pub fn is_up_to_date(&self, artifact: &Path, file: FileId) -> bool {
        self.check(artifact, file).is_none()
    }

    /// `None` when `artifact` is current with respect to `file`, the
    /// configuration, and everything `file` transitively includes.
    pub fn check(&self, artifact: &Path, file: FileId) -> Option<StaleReason> {
        let Some(built) = modified(artifact) else {
            return Some(StaleReason::Missing);
        };

        if self.config_modified.is_some_and(|c| c > built) {
            return Some(StaleReason::ConfigNewer);
        }

        let mut visited = HashSet::new();
        self.newer_input(file, built, &mut visited)
            .map(|id| StaleReason::SourceNewer(self.index.get(id).path.clone()))
    }

    /// First file reachable from `id` that is newer than `built`. A node seen
    /// before counts as current, which keeps include cycles finite.
    fn newer_input(
        &self,
        id: FileId,
        built: SystemTime,
        visited: &mut HashSet<FileId>,
    ) -> Option<FileId> {
        if !visited.insert(id) {
            return None;
        }

        let file = self.index.get(id);
        if file.modified > built {
            return Some(id);
        }

        file.deps()
            .iter()
            .find_map(|dep| self.newer_input(dep.file, built, visited))
    }

    /// Object check. When a precompiled header is in use the object also
    /// depends on it: rebuilt this run, or newer on disk, means recompile.
    pub fn check_object(
        &self,
        object: &Path,
        file: FileId,
        pch: Option<&Path>,
    ) -> Option<StaleReason> {
        if let Some(reason) = self.check(object, file) {
            return Some(reason);
        }

        if let Some(pch) = pch {
            if self.session.was_rebuilt(pch) {
                return Some(StaleReason::PchRebuilt);
            }
            if let (Some(p), Some(o)) = (modified(pch), modified(object))
                && p > o
            {
                return Some(StaleReason::PchRebuilt);
            }
        }

        None
    }

    /// Link check against the object closure of one executable.
    pub fn check_executable(&self, exe: &Path, objects: &[PathBuf]) -> Option<StaleReason> {
        let Some(linked) = modified(exe) else {
            return Some(StaleReason::Missing);
        };

        if self.config_modified.is_some_and(|c| c > linked) {
            return Some(StaleReason::ConfigNewer);
        }

        for obj in objects {
            if self.session.was_rebuilt(obj) {
                return Some(StaleReason::ObjectRebuilt(obj.clone()));
            }
            match modified(obj) {
                None => return Some(StaleReason::Missing),
                Some(t) if t > linked => return Some(StaleReason::ObjectNewer(obj.clone())),
                Some(_) => {}
            }
        }

        None
    }
}
