/// State of an occupied job slot. A job that has been reaped to
/// completion leaves the table entirely, so there is no terminal state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum JobState {
    Running,
    Stopped,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            JobState::Running => formatter.write_str("running"),
            JobState::Stopped => formatter.write_str("suspended"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_words_match_status_lines() {
        assert_eq!(JobState::Running.to_string(), "running");
        assert_eq!(JobState::Stopped.to_string(), "suspended");
    }
}
