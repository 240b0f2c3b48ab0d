//! Where artifacts live.
//!
//! Objects go to a cache directory shared by all projects, one file per source
//! named by the URL-safe base64 of its absolute path. The name is reversible,
//! which lets `bake clean` find a project's artifacts without any manifest.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use std::path::{Path, PathBuf};

const PCH_SUFFIX: &str = ".pch";

#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    pub cache_dir: PathBuf,
    pub dst_dir: PathBuf,
}

impl ArtifactLayout {
    pub fn new(cache_dir: impl Into<PathBuf>, dst_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            dst_dir: dst_dir.into(),
        }
    }

    pub fn object_path(&self, source: &Path) -> PathBuf {
        self.cache_dir.join(encode_name(source))
    }

    pub fn pch_path(&self, header: &Path) -> PathBuf {
        self.cache_dir
            .join(format!("{}{}", encode_name(header), PCH_SUFFIX))
    }

    pub fn executable_path(&self, name: &str) -> PathBuf {
        if cfg!(target_os = "windows") {
            self.dst_dir.join(format!("{}.exe", name))
        } else {
            self.dst_dir.join(name)
        }
    }

    pub fn is_cache_artifact(&self, path: &Path) -> bool {
        path.starts_with(&self.cache_dir)
    }
}

fn encode_name(source: &Path) -> String {
    URL_SAFE.encode(source.to_string_lossy().as_bytes())
}

/// Recovers the source path an artifact file name was derived from.
pub fn decode_artifact_name(name: &str) -> Option<PathBuf> {
    let encoded = name.strip_suffix(PCH_SUFFIX).unwrap_or(name);
    let bytes = URL_SAFE.decode(encoded).ok()?;
    String::from_utf8(bytes).ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_reversible() {
        let layout = ArtifactLayout::new("/cache", "/p/bin");
        let src = Path::new("/p/src/a b/main.cpp");

        let obj = layout.object_path(src);
        let name = obj.file_name().unwrap().to_str().unwrap();
        assert!(!name.contains('/'));
        assert_eq!(decode_artifact_name(name), Some(src.to_path_buf()));

        let pch = layout.pch_path(src);
        let name = pch.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with(".pch"));
        assert_eq!(decode_artifact_name(name), Some(src.to_path_buf()));
        assert!(layout.is_cache_artifact(&pch));
    }

    #[test]
    fn test_foreign_names_do_not_decode() {
        assert_eq!(decode_artifact_name("not base64!"), None);
    }
}
