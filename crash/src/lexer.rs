//! Splits an input line into statements.
//!
//! A statement is a whitespace-delimited token list terminated by `;`,
//! `&`, or the end of the line; `&` marks the statement for background
//! execution. No quoting, expansion, or escaping is performed.

/// One command to evaluate: its argv and whether it runs in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub argv: Vec<String>,
    pub background: bool,
}

pub fn parse_line(line: &str) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut argv: Vec<String> = Vec::new();
    let mut token = String::new();

    let mut end_statement = |argv: &mut Vec<String>, token: &mut String, background: bool| {
        if !token.is_empty() {
            argv.push(std::mem::take(token));
        }
        if !argv.is_empty() {
            statements.push(Statement {
                argv: std::mem::take(argv),
                background,
            });
        }
    };

    for ch in line.chars() {
        match ch {
            ' ' | '\t' | '\n' => {
                if !token.is_empty() {
                    argv.push(std::mem::take(&mut token));
                }
            }
            ';' => end_statement(&mut argv, &mut token, false),
            '&' => end_statement(&mut argv, &mut token, true),
            _ => token.push(ch),
        }
    }
    end_statement(&mut argv, &mut token, false);

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn single_command() {
        let parsed = parse_line("sleep 100\n");
        assert_eq!(
            parsed,
            vec![Statement {
                argv: argv(&["sleep", "100"]),
                background: false,
            }]
        );
    }

    #[test]
    fn background_marker() {
        let parsed = parse_line("sleep 100 &\n");
        assert_eq!(
            parsed,
            vec![Statement {
                argv: argv(&["sleep", "100"]),
                background: true,
            }]
        );
    }

    #[test]
    fn background_marker_attached_to_token() {
        let parsed = parse_line("sleep 100&");
        assert_eq!(
            parsed,
            vec![Statement {
                argv: argv(&["sleep", "100"]),
                background: true,
            }]
        );
    }

    #[test]
    fn multiple_statements() {
        let parsed = parse_line("sleep 5 & jobs; quit\n");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].argv, argv(&["sleep", "5"]));
        assert!(parsed[0].background);
        assert_eq!(parsed[1].argv, argv(&["jobs"]));
        assert!(!parsed[1].background);
        assert_eq!(parsed[2].argv, argv(&["quit"]));
        assert!(!parsed[2].background);
    }

    #[test]
    fn empty_statements_are_skipped() {
        assert!(parse_line("\n").is_empty());
        assert!(parse_line(" ;  ; &\n").is_empty());
        assert_eq!(parse_line(";; jobs ;;").len(), 1);
    }

    #[test]
    fn whitespace_runs_between_tokens() {
        let parsed = parse_line("  fg \t %1  \n");
        assert_eq!(
            parsed,
            vec![Statement {
                argv: argv(&["fg", "%1"]),
                background: false,
            }]
        );
    }
}
