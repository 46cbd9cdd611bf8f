//! Executable-subcommand spawn plan.
//!
//! The dispatcher computes *what* to run; actually running it is platform
//! glue behind a pluggable spawner. The default spawner launches the file
//! directly with `std::process` and reports the child's exit code.

use std::io;
use std::path::PathBuf;

/// What an executable subcommand dispatch resolved to.
#[derive(Debug, Clone)]
pub struct ExecPlan {
    /// Executable to launch: the child's declared file, or
    /// `<program>-<subcommand>`, joined to the executable dir when set.
    pub file: PathBuf,
    /// User arguments for the child (operands and unknown tokens, in order).
    pub args: Vec<String>,
    /// Interpreter arguments with debugger ports already rewritten; consumed
    /// by spawners that relaunch through an interpreter.
    pub interpreter_args: Vec<String>,
}

/// Default spawner: run the file, wait, return its exit code.
pub(crate) fn default_spawner(plan: &ExecPlan) -> io::Result<i32> {
    let status = std::process::Command::new(&plan.file)
        .args(&plan.args)
        .status()?;
    Ok(status.code().unwrap_or(1))
}
