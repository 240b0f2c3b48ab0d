use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

pub const CONFIG_FILE: &str = "bake.toml";

/// Contents of `bake.toml`.
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct BakeConfig {
    #[serde(default)]
    pub build: BuildConfig,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct BuildConfig {
    /// Compile template: `{include}`, `{source}`, `{output}`
    pub compiler: Option<String>,
    /// Link template: `{objects}`, `{output}`, `{libs}`
    pub linker: Option<String>,
    /// PCH emission template: `{include}`, `{header}`, `{output}`
    pub emit_pch: Option<String>,
    /// Appended to compile commands when a PCH exists: `{pch}`
    pub include_pch: Option<String>,
    /// Destination of linked executables, relative to the project root
    #[serde(default = "default_dst")]
    pub dst: String,
    /// Object cache; defaults to `<user cache dir>/bake`
    pub cache: Option<String>,
    #[serde(default)]
    pub compile_commands: bool,
}

fn default_dst() -> String {
    "bin".to_string()
}

/// Everything one build invocation needs from the outer layer.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub compiler: String,
    pub linker: String,
    pub emit_pch: Option<String>,
    pub include_pch: Option<String>,
    pub dst_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub force: bool,
    pub dry_run: bool,
    pub verbose: bool,
    /// Timestamp of the configuration file, a global staleness input
    pub config_modified: Option<SystemTime>,
    pub compile_commands: bool,
}

impl BuildSettings {
    /// Settings with the given templates and directories, all flags off.
    pub fn new(
        compiler: impl Into<String>,
        linker: impl Into<String>,
        dst_dir: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            compiler: compiler.into(),
            linker: linker.into(),
            emit_pch: None,
            include_pch: None,
            dst_dir: dst_dir.into(),
            cache_dir: cache_dir.into(),
            force: false,
            dry_run: false,
            verbose: false,
            config_modified: None,
            compile_commands: false,
        }
    }

    /// Both PCH templates are needed before a `//! pch` header is used.
    pub fn pch_enabled(&self) -> bool {
        self.emit_pch.is_some() && self.include_pch.is_some()
    }
}

/// Starter configuration written by `bake init`.
pub fn starter_config() -> BakeConfig {
    BakeConfig {
        build: BuildConfig {
            compiler: Some("c++ -std=c++17 {include} -c {source} -o {output}".to_string()),
            linker: Some("c++ {objects} -o {output} {libs}".to_string()),
            emit_pch: None,
            include_pch: None,
            dst: default_dst(),
            cache: None,
            compile_commands: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let cfg: BakeConfig = toml::from_str(
            r#"
[build]
compiler = "cc {include} -c {source} -o {output}"
linker = "cc {objects} -o {output} {libs}"
"#,
        )
        .unwrap();
        assert_eq!(cfg.build.dst, "bin");
        assert!(cfg.build.emit_pch.is_none());
        assert!(!cfg.build.compile_commands);
    }

    #[test]
    fn test_starter_config_round_trips() {
        let text = toml::to_string_pretty(&starter_config()).unwrap();
        let back: BakeConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.build.linker, starter_config().build.linker);
    }

    #[test]
    fn test_pch_needs_both_templates() {
        let mut s = BuildSettings::new("cc", "cc", "/bin", "/cache");
        s.emit_pch = Some("cc {include} {header} -o {output}".into());
        assert!(!s.pch_enabled());
        s.include_pch = Some("-include-pch {pch}".into());
        assert!(s.pch_enabled());
    }
}
