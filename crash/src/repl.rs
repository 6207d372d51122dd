use crate::shell::Shell;
use anyhow::Result;
use std::io::{self, BufRead, Write};
use tracing::debug;

const PROMPT: &str = "crash> ";

/// The read-eval loop: prompt, read a line, hand it to the shell.
pub struct Repl {
    shell: Shell,
}

impl Repl {
    pub fn new(shell: Shell) -> Self {
        Repl { shell }
    }

    /// Runs until EOF (exit code 0) or a stdin read error (exit code 1).
    /// `quit` and SIGQUIT exit the process directly and never return here.
    pub fn run(&mut self) -> Result<i32> {
        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            self.prompt()?;
            line.clear();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => {
                    debug!("stdin reached EOF");
                    return Ok(0);
                }
                Ok(_) => {
                    // Interactively, a failed line just prints its
                    // error; only EOF and read errors end the loop.
                    self.shell.eval_line(&line);
                }
                Err(err) => {
                    eprintln!("ERROR: {err}");
                    return Ok(1);
                }
            }
        }
    }

    fn prompt(&self) -> Result<()> {
        let mut stdout = io::stdout();
        stdout.write_all(PROMPT.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}
