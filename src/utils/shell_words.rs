use crate::errors::RelayError;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    SingleQuoted,
    DoubleQuoted,
}

/// Splits a command line into words following POSIX shell quoting rules.
///
/// No expansion of any kind is performed: `$VAR`, globs and `~` stay literal.
pub fn split_shell_words(line: &str) -> Result<Vec<String>, RelayError> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut mode = Mode::Normal;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match mode {
            Mode::Normal => match ch {
                '\'' => {
                    mode = Mode::SingleQuoted;
                    in_word = true;
                }
                '"' => {
                    mode = Mode::DoubleQuoted;
                    in_word = true;
                }
                '\\' => match chars.next() {
                    Some('\n') => {}
                    Some(next) => {
                        current.push(next);
                        in_word = true;
                    }
                    None => return Err(RelayError::parse("No escaped character")),
                },
                ' ' | '\t' | '\r' | '\n' => {
                    if in_word {
                        out.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                _ => {
                    current.push(ch);
                    in_word = true;
                }
            },
            Mode::SingleQuoted => {
                if ch == '\'' {
                    mode = Mode::Normal;
                } else {
                    current.push(ch);
                }
            }
            Mode::DoubleQuoted => match ch {
                '"' => mode = Mode::Normal,
                '\\' => match chars.peek().copied() {
                    Some('\n') => {
                        chars.next();
                    }
                    Some(next @ ('$' | '`' | '"' | '\\')) => {
                        chars.next();
                        current.push(next);
                    }
                    _ => current.push('\\'),
                },
                _ => current.push(ch),
            },
        }
    }

    if mode != Mode::Normal {
        return Err(RelayError::parse("No closing quotation"));
    }
    if in_word {
        out.push(current);
    }
    Ok(out)
}
