//! `compile_commands.json` export for editors and clangd.

use super::command::CommandLine;
use crate::error::BuildError;
use serde_json::json;
use std::fs;
use std::path::Path;

pub const COMPDB_FILE: &str = "compile_commands.json";

pub struct CompileEntry {
    value: serde_json::Value,
}

impl CompileEntry {
    pub fn new(root: &Path, source: &Path, command: &CommandLine) -> Self {
        Self {
            value: json!({
                "directory": root.to_string_lossy(),
                "command": command.to_shell_string(),
                "file": source.to_string_lossy(),
            }),
        }
    }
}

pub fn write(root: &Path, entries: &[CompileEntry]) -> Result<(), BuildError> {
    let values: Vec<&serde_json::Value> = entries.iter().map(|e| &e.value).collect();
    let path = root.join(COMPDB_FILE);
    let text = serde_json::to_string_pretty(&values)
        .map_err(|e| BuildError::io(&path, std::io::Error::other(e)))?;
    fs::write(&path, text).map_err(|e| BuildError::io(&path, e))
}
