use crate::error::ParseError;

/// Longest accepted line, trailing newline included.
pub const MAX_LINE_LEN: usize = 2048;
/// Most words a command may carry, program name included.
pub const MAX_ARGS: usize = 512;

/// One tokenized command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub program: String,
    /// Program name first; redirections and the `&` marker are stripped.
    pub arguments: Vec<String>,
    pub input_redirect: Option<String>,
    pub output_redirect: Option<String>,
    pub background: bool,
}

impl Command {
    /// Tokenizes a raw line. `Ok(None)` means there is nothing to run: an
    /// empty line, a comment, or a line made only of whitespace.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        if line.len() > MAX_LINE_LEN {
            return Err(ParseError::LineTooLong {
                len: line.len(),
                limit: MAX_LINE_LEN,
            });
        }

        let line = line.trim_end_matches('\n').trim_end_matches('\r');
        if line.trim_start().starts_with('#') {
            return Ok(None);
        }

        let mut tokens: Vec<&str> = line.split_whitespace().collect();

        // only a standalone trailing '&' puts the command in the background
        let background = tokens.last() == Some(&"&");
        if background {
            tokens.pop();
        }

        let mut arguments = Vec::new();
        let mut input_redirect = None;
        let mut output_redirect = None;

        let mut tokens = tokens.into_iter();
        while let Some(token) = tokens.next() {
            match token {
                "<" => {
                    let target = tokens
                        .next()
                        .ok_or(ParseError::MissingRedirectTarget { operator: "<" })?;
                    input_redirect = Some(target.to_string());
                }
                ">" => {
                    let target = tokens
                        .next()
                        .ok_or(ParseError::MissingRedirectTarget { operator: ">" })?;
                    output_redirect = Some(target.to_string());
                }
                _ => arguments.push(token.to_string()),
            }
        }

        if arguments.len() > MAX_ARGS {
            return Err(ParseError::TooManyArguments {
                count: arguments.len(),
                limit: MAX_ARGS,
            });
        }

        let Some(program) = arguments.first().cloned() else {
            return Ok(None);
        };

        Ok(Some(Command {
            program,
            arguments,
            input_redirect,
            output_redirect,
            background,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_simple_command() {
        let cmd = parse("ls -la /tmp\n");
        assert_eq!(cmd.program, "ls");
        assert_eq!(cmd.arguments, vec!["ls", "-la", "/tmp"]);
        assert!(!cmd.background);
        assert_eq!(cmd.input_redirect, None);
        assert_eq!(cmd.output_redirect, None);
    }

    #[test]
    fn test_empty_and_blank_lines() {
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("\n").unwrap(), None);
        assert_eq!(Command::parse("   \t  \n").unwrap(), None);
    }

    #[test]
    fn test_comments() {
        assert_eq!(Command::parse("# ls -la\n").unwrap(), None);
        assert_eq!(Command::parse("   #indented > out &\n").unwrap(), None);
        // a '#' later in the line is an ordinary word
        let cmd = parse("echo #not-a-comment");
        assert_eq!(cmd.arguments, vec!["echo", "#not-a-comment"]);
    }

    #[test]
    fn test_redirections_are_stripped() {
        let cmd = parse("sort < in.txt > out.txt\n");
        assert_eq!(cmd.arguments, vec!["sort"]);
        assert_eq!(cmd.input_redirect.as_deref(), Some("in.txt"));
        assert_eq!(cmd.output_redirect.as_deref(), Some("out.txt"));
    }

    #[test]
    fn test_redirections_in_any_order() {
        let cmd = parse("wc > count -l < words");
        assert_eq!(cmd.arguments, vec!["wc", "-l"]);
        assert_eq!(cmd.input_redirect.as_deref(), Some("words"));
        assert_eq!(cmd.output_redirect.as_deref(), Some("count"));
    }

    #[test]
    fn test_last_redirect_wins() {
        let cmd = parse("cat < a < b > c > d");
        assert_eq!(cmd.input_redirect.as_deref(), Some("b"));
        assert_eq!(cmd.output_redirect.as_deref(), Some("d"));
    }

    #[test]
    fn test_missing_redirect_target() {
        assert!(matches!(
            Command::parse("cat <"),
            Err(ParseError::MissingRedirectTarget { operator: "<" })
        ));
        assert!(matches!(
            Command::parse("echo hi >\n"),
            Err(ParseError::MissingRedirectTarget { operator: ">" })
        ));
    }

    #[test]
    fn test_trailing_ampersand_is_background() {
        let cmd = parse("sleep 5 &\n");
        assert!(cmd.background);
        assert_eq!(cmd.arguments, vec!["sleep", "5"]);

        let cmd = parse("sleep 5 > /dev/null &   ");
        assert!(cmd.background);
        assert_eq!(cmd.output_redirect.as_deref(), Some("/dev/null"));
    }

    #[test]
    fn test_ampersand_elsewhere_is_an_argument() {
        let cmd = parse("echo a & b");
        assert!(!cmd.background);
        assert_eq!(cmd.arguments, vec!["echo", "a", "&", "b"]);

        let cmd = parse("echo a&");
        assert!(!cmd.background);
        assert_eq!(cmd.arguments, vec!["echo", "a&"]);
    }

    #[test]
    fn test_lone_ampersand_is_empty() {
        assert_eq!(Command::parse("&\n").unwrap(), None);
    }

    #[test]
    fn test_only_redirections_is_empty() {
        assert_eq!(Command::parse("< in > out").unwrap(), None);
    }

    #[test]
    fn test_line_length_limit() {
        let mut line = "a".repeat(MAX_LINE_LEN - 1);
        line.push('\n');
        assert!(Command::parse(&line).unwrap().is_some());

        line.insert(0, 'a');
        assert!(matches!(
            Command::parse(&line),
            Err(ParseError::LineTooLong { len, .. }) if len == MAX_LINE_LEN + 1
        ));
    }

    #[test]
    fn test_argument_limit() {
        let words = vec!["x"; MAX_ARGS].join(" ");
        assert_eq!(parse(&words).arguments.len(), MAX_ARGS);

        let words = vec!["x"; MAX_ARGS + 1].join(" ");
        assert!(matches!(
            Command::parse(&words),
            Err(ParseError::TooManyArguments { count, .. }) if count == MAX_ARGS + 1
        ));
    }
}
