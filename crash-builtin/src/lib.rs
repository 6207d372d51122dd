use anyhow::Result;
use crash_types::{Context, ExitStatus};
use once_cell::sync::Lazy;
use std::collections::HashMap;

mod bg;
mod fg;
mod jobs;
mod nuke;
mod quit;

/// Trait that provides an interface for builtin commands to interact with
/// the shell without direct coupling to its implementation.
pub trait ShellProxy {
    /// Terminates the shell immediately with exit code 0.
    fn exit_shell(&mut self);

    /// Dispatches a builtin verb to the shell's job-control engine.
    ///
    /// An `Err` is a single user-facing failure for the whole command;
    /// per-argument failures of multi-argument verbs are reported by the
    /// shell itself and do not surface here.
    fn dispatch(&mut self, ctx: &Context, cmd: &str, argv: Vec<String>) -> Result<()>;
}

/// Builtin command function signature. `argv[0]` is the verb itself.
pub type BuiltinCommand =
    fn(ctx: &Context, argv: Vec<String>, proxy: &mut dyn ShellProxy) -> ExitStatus;

/// Registry of all builtin commands, looked up by the first token of a
/// statement before anything is launched as an external process.
pub static BUILTIN_COMMAND: Lazy<HashMap<&'static str, BuiltinCommand>> = Lazy::new(|| {
    let mut builtin: HashMap<&'static str, BuiltinCommand> = HashMap::new();

    builtin.insert("quit", quit::command as BuiltinCommand);
    builtin.insert("jobs", jobs::command as BuiltinCommand);
    builtin.insert("fg", fg::command as BuiltinCommand);
    builtin.insert("bg", bg::command as BuiltinCommand);
    builtin.insert("nuke", nuke::command as BuiltinCommand);

    builtin
});

pub fn lookup(name: &str) -> Option<BuiltinCommand> {
    BUILTIN_COMMAND.get(name).copied()
}
