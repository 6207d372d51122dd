pub mod job;
pub mod launch;
pub mod reaper;
pub mod signal;
pub mod state;
pub mod status;
