mod clean;
mod command;
mod compdb;
mod core;
mod layout;
mod scheduler;
mod session;
mod staleness;
mod target;
mod template;
mod utils;
mod watcher;

pub use clean::clean;
pub use command::{CommandLine, Executor, ProcessExecutor};
pub use compdb::{COMPDB_FILE, CompileEntry};
pub use core::{BuildOutcome, Builder, TargetSummary};
pub use layout::{ArtifactLayout, decode_artifact_name};
pub use scheduler::run_par;
pub use session::BuildSession;
pub use staleness::{StaleReason, StalenessCheck};
pub use target::{TargetRole, Targets, render_include_flags, render_lib_flags};
pub use template::fill_template;
pub use utils::{find_project_root, load_config, settings_from_config};
pub use watcher::watch;
