use crate::error::BuildError;
use colored::*;
use std::path::Path;
use std::process::{Command, Stdio};

/// A filled template, split into program and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Splits on whitespace. Quoting is not interpreted.
    pub fn parse(filled: &str, context: &str) -> Result<Self, BuildError> {
        let mut fields = filled.split_whitespace().map(str::to_string);
        let program = fields
            .next()
            .ok_or_else(|| BuildError::Config(format!("{} template is empty", context)))?;

        Ok(Self {
            program,
            args: fields.collect(),
        })
    }

    pub fn to_shell_string(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Echo form: runs of cache artifacts collapse into `<obj>`, `<N-objs>` or
    /// `<pch>`, and paths under the project root are shown as `./...`.
    pub fn display(&self, root: &Path, cache_dir: &Path) -> String {
        let mut out = self.program.clone();
        let mut cached = 0usize;
        let mut pch = false;

        let flush = |out: &mut String, cached: &mut usize, pch: &mut bool| {
            if *cached == 0 {
                return;
            }
            out.push(' ');
            if *pch && *cached == 1 {
                out.push_str("<pch>");
            } else if *cached == 1 {
                out.push_str("<obj>");
            } else {
                out.push_str(&format!("<{}-objs>", cached));
            }
            *cached = 0;
            *pch = false;
        };

        for arg in &self.args {
            let path = Path::new(arg);
            if path.starts_with(cache_dir) {
                cached += 1;
                pch |= arg.ends_with(".pch");
                continue;
            }
            flush(&mut out, &mut cached, &mut pch);

            out.push(' ');
            match path.strip_prefix(root) {
                Ok(rel) if path.is_absolute() => {
                    out.push_str(&Path::new(".").join(rel).to_string_lossy());
                }
                _ => out.push_str(arg),
            }
        }
        flush(&mut out, &mut cached, &mut pch);

        out
    }
}

/// Runs external build commands.
pub trait Executor: Send + Sync {
    fn execute(&self, command: &CommandLine) -> Result<(), BuildError>;
}

/// Spawns real processes with inherited stdio so compiler output streams live.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn execute(&self, command: &CommandLine) -> Result<(), BuildError> {
        let status = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| BuildError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(BuildError::Process {
                command: command.to_shell_string(),
                status,
            });
        }
        Ok(())
    }
}

pub(crate) fn echo(command: &CommandLine, root: &Path, cache_dir: &Path, dry_run: bool) {
    let line = command.display(root, cache_dir);
    if dry_run {
        println!("   {} {}", "~".dimmed(), line.dimmed());
    } else {
        println!("   {} {}", "$".cyan(), line);
    }
}
