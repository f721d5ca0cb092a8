//! Line and word level splitting of assembly source.

/// Split source into lines, guaranteeing the final line is newline-terminated first.
///
/// A trailing `\r` is kept, and removed along with other whitespace by [`trim`].
pub fn split_lines(src: &str) -> Vec<String> {
    let mut src = src.to_string();
    if !src.ends_with('\n') {
        src.push('\n');
    }
    let mut lines: Vec<String> = src.split('\n').map(String::from).collect();
    // Empty string after the final newline
    lines.pop();
    lines
}

pub fn trim(line: &str) -> &str {
    line.trim()
}

/// Remove a `;` comment from a trimmed line.
///
/// A `;` only starts a comment at the start of the line or directly after whitespace.
pub fn strip_comment(line: &str) -> &str {
    let mut prev: Option<char> = None;
    for (i, ch) in line.char_indices() {
        if ch == ';' && prev.map_or(true, char::is_whitespace) {
            return line[..i].trim_end();
        }
        prev = Some(ch);
    }
    line
}

/// Whitespace-separated words of a line.
pub fn split_words(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Whether `word` defines a label, i.e. `name:`.
pub fn is_label_definition(word: &str) -> bool {
    word.len() >= 2 && word.ends_with(':')
}

/// Parse an integer literal.
///
/// Bare digits are decimal. A `$`, `0x`, `x` or `V` prefix (any case) makes the rest hexadecimal.
/// Returns `None` for empty input or anything that is not entirely a literal.
pub fn parse_int(s: &str) -> Option<u32> {
    let (digits, radix) = if let Some(rest) = s.strip_prefix("0x").or(s.strip_prefix("0X")) {
        (rest, 16)
    } else if let Some(rest) = s.strip_prefix(['$', 'x', 'X', 'v', 'V']) {
        (rest, 16)
    } else {
        (s, 10)
    };
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(digits, radix).ok()
}

/// Value of a single hexadecimal digit.
pub fn hex_digit(ch: char) -> Option<u8> {
    ch.to_digit(16).map(|digit| digit as u8)
}
