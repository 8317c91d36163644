//! Cleanup of captured terminal output.
//!
//! winget draws progress bars and spinners with cursor movement sequences and
//! carriage returns. None of that is meaningful once the output has been
//! captured, so it is removed before the text reaches the log.

const SPINNER_GLYPHS: [char; 4] = ['-', '|', '/', '\\'];

/// Cleans stdout for display: control sequences, spinner glyphs, blank-line runs.
pub fn clean_stdout(raw: &str) -> String {
    collapse_blank_lines(&strip_spinner_glyphs(&strip_control_sequences(raw)))
}

/// Cleans stderr for display. Spinners are only ever drawn on stdout.
pub fn clean_stderr(raw: &str) -> String {
    collapse_blank_lines(&strip_control_sequences(raw))
}

/// Removes ANSI escape sequences and C0/C1 control characters.
///
/// Newlines and tabs survive; carriage returns are dropped.
pub fn strip_control_sequences(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x1b' => match chars.peek().copied() {
                Some('[') => {
                    chars.next();
                    // Parameter and intermediate bytes run until a final byte in 0x40..=0x7e.
                    for next in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&next) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    // OSC ends with BEL or ESC \.
                    while let Some(next) = chars.next() {
                        if next == '\x07' {
                            break;
                        }
                        if next == '\x1b' {
                            if chars.peek() == Some(&'\\') {
                                chars.next();
                            }
                            break;
                        }
                    }
                }
                Some(_) => {
                    chars.next();
                }
                None => {}
            },
            '\n' | '\t' => result.push(c),
            c if is_control(c) => {}
            _ => result.push(c),
        }
    }

    result
}

fn is_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{1f}' | '\u{7f}'..='\u{9f}')
}

/// Removes runs of spinner glyphs.
///
/// A single `-` or `/` between two alphanumerics is kept: it belongs to a
/// version like `1.0-beta` or an architecture like `x64/arm64`.
pub fn strip_spinner_glyphs(input: &str) -> String {
    let mut lines = Vec::new();

    for line in input.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        let mut cleaned = String::with_capacity(line.len());
        let mut index = 0;

        while index < chars.len() {
            if !SPINNER_GLYPHS.contains(&chars[index]) {
                cleaned.push(chars[index]);
                index += 1;
                continue;
            }

            let start = index;
            while index < chars.len() && SPINNER_GLYPHS.contains(&chars[index]) {
                index += 1;
            }

            let run = &chars[start..index];
            let joins_words = run.len() == 1
                && matches!(run[0], '-' | '/')
                && start > 0
                && chars[start - 1].is_alphanumeric()
                && chars.get(index).is_some_and(|next| next.is_alphanumeric());
            if joins_words {
                cleaned.push(run[0]);
            }
        }

        lines.push(cleaned);
    }

    lines.join("\n")
}

/// Collapses runs of blank lines into one and trims the whole stream.
pub fn collapse_blank_lines(input: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut previous_blank = true;

    for line in input.lines().map(str::trim_end) {
        let blank = line.is_empty();
        if blank && previous_blank {
            continue;
        }
        kept.push(line);
        previous_blank = blank;
    }

    kept.join("\n").trim().to_string()
}

/// Prepares one raw listing line for column matching.
///
/// Keeps only what a terminal would finally show after carriage-return
/// overwrites, then drops escape sequences.
pub fn normalize_listing_line(line: &str) -> String {
    let line = line.trim_end_matches('\r');
    let visible = line.rsplit('\r').next().unwrap_or(line);
    strip_control_sequences(visible)
}
