use super::ShellProxy;
use crash_types::{Context, CrashError, ExitStatus};
use tracing::debug;

pub fn command(ctx: &Context, argv: Vec<String>, proxy: &mut dyn ShellProxy) -> ExitStatus {
    if argv.len() > 1 {
        ctx.report_error(&CrashError::TakesNoArguments("quit"));
        return ExitStatus::ExitedWith(1);
    }
    debug!("quit requested, shutting down");
    proxy.exit_shell();
    ExitStatus::ExitedWith(0)
}
