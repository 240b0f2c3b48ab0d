use std::path::PathBuf;
use std::process::ExitStatus;

/// Terminal error of a scan or build invocation.
///
/// Every variant names the file, template or target at fault so the cause can
/// be located without a verbose rerun.
#[derive(Debug)]
pub enum BuildError {
    /// A source file could not be read while scanning the tree
    Scan {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Filesystem error outside of scanning (cache dir, compile_commands.json, ...)
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Missing or incomplete configuration
    Config(String),
    /// A value was supplied for a placeholder the template never mentions
    MissingPlaceholder {
        context: String,
        placeholder: String,
        template: String,
    },
    /// The template mentions placeholders this build step does not know
    UnrecognizedPlaceholder {
        context: String,
        placeholders: Vec<String>,
    },
    /// More than one file is annotated as the precompiled header
    MultiplePch(Vec<PathBuf>),
    TargetNotFound(String),
    TargetAmbiguous {
        name: String,
        candidates: Vec<PathBuf>,
    },
    /// The external program could not be started
    Spawn {
        program: String,
        source: std::io::Error,
    },
    /// The external program exited unsuccessfully
    Process { command: String, status: ExitStatus },
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Scan { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            BuildError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            BuildError::Config(msg) => write!(f, "configuration error: {}", msg),
            BuildError::MissingPlaceholder {
                context,
                placeholder,
                template,
            } => write!(
                f,
                "{} template doesn't contain {{{}}} ({})",
                context, placeholder, template
            ),
            BuildError::UnrecognizedPlaceholder {
                context,
                placeholders,
            } => write!(
                f,
                "unrecognized template placeholder(s) in {}: {}",
                context,
                placeholders.join(", ")
            ),
            BuildError::MultiplePch(paths) => {
                let list: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                write!(
                    f,
                    "multiple precompiled headers found (there can only be one): {}",
                    list.join(", ")
                )
            }
            BuildError::TargetNotFound(name) => write!(f, "target '{}' not found", name),
            BuildError::TargetAmbiguous { name, candidates } => {
                let list: Vec<String> = candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                write!(f, "target '{}' is ambiguous: {}", name, list.join(", "))
            }
            BuildError::Spawn { program, source } => {
                write!(f, "failed to start '{}': {}", program, source)
            }
            BuildError::Process { command, status } => {
                write!(f, "command failed ({}): {}", status, command)
            }
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Scan { source, .. }
            | BuildError::Io { source, .. }
            | BuildError::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}
