use crate::process::job::JobControl;
use crate::process::{reaper, signal};
use crate::repl::Repl;
use crate::shell::Shell;
use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

mod lexer;
mod process;
mod repl;
mod shell;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run a single command line instead of starting the interactive loop
    #[arg(short, long)]
    command: Option<String>,
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("ERROR: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    // The shell calls tcsetpgrp while it is not the foreground process
    // group; without this the kernel would stop it with SIGTTOU.
    signal::ignore_sigttou()?;

    // All job-control signals are consumed by the reaper thread via
    // sigwait, so they must be blocked before any thread is spawned and
    // stay blocked in every thread. Children unblock them before exec.
    signal::block_job_signals()?;

    let jobs = JobControl::new();
    let _reaper = reaper::spawn(jobs.clone())?;

    let mut shell = Shell::new(jobs);
    if let Some(line) = cli.command.as_deref() {
        // Background children of the line are not waited for, but a
        // failing line is visible in the exit code.
        Ok(shell.eval_line(line))
    } else {
        Repl::new(shell).run()
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    // Diagnostics stay off unless CRASH_LOG is set; user-visible output
    // never goes through tracing.
    let filter = EnvFilter::try_from_env("CRASH_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
