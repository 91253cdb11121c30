//! Logical lines of a source file.
//!
//! Each backslash immediately followed by a newline is deleted, splicing
//! physical lines into logical lines. Comments are then replaced by a single
//! space; a block comment may span several physical lines, which join into
//! one logical line. Comment markers inside character and string literals are
//! kept as text.

/// One logical line, after splicing and comment removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// Physical line (1-based) the logical line starts on
    pub number: usize,
    pub text: String,
}

enum State {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Characters with their physical line number, line splices removed
fn splice(source: &str) -> Vec<(usize, char)> {
    let mut out = Vec::with_capacity(source.len());
    let mut line = 1;
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('\n') => {
                    chars.next();
                    line += 1;
                    continue;
                }
                Some('\r') => {
                    let mut ahead = chars.clone();
                    ahead.next();
                    if ahead.peek() == Some(&'\n') {
                        chars.next();
                        chars.next();
                        line += 1;
                        continue;
                    }
                }
                _ => {}
            }
        }
        out.push((line, c));
        if c == '\n' {
            line += 1;
        }
    }
    out
}

/// Split `source` into logical lines.
pub fn logical_lines(source: &str) -> Vec<LogicalLine> {
    let chars = splice(source);
    let mut lines = Vec::new();
    let mut text = String::new();
    let mut start = 1;
    let mut state = State::Code;

    let mut i = 0;
    while i < chars.len() {
        let (line, c) = chars[i];
        let next = chars.get(i + 1).map(|&(_, c)| c);
        i += 1;

        if c == '\n' && !matches!(state, State::BlockComment) {
            lines.push(LogicalLine {
                number: start,
                text: std::mem::take(&mut text),
            });
            start = line + 1;
            state = State::Code;
            continue;
        }

        match state {
            State::Code => match (c, next) {
                ('/', Some('/')) => {
                    text.push(' ');
                    state = State::LineComment;
                    i += 1;
                }
                ('/', Some('*')) => {
                    text.push(' ');
                    state = State::BlockComment;
                    i += 1;
                }
                ('"' | '\'', _) => {
                    text.push(c);
                    state = State::Quoted(c);
                }
                _ => text.push(c),
            },
            State::Quoted(quote) => {
                text.push(c);
                if c == '\\' {
                    if let Some(escaped) = next.filter(|&n| n != '\n') {
                        text.push(escaped);
                        i += 1;
                    }
                } else if c == quote {
                    state = State::Code;
                }
            }
            State::LineComment => {}
            State::BlockComment => {
                if c == '*' && next == Some('/') {
                    state = State::Code;
                    i += 1;
                }
            }
        }
    }

    if !text.is_empty() {
        lines.push(LogicalLine {
            number: start,
            text,
        });
    }
    lines
}
