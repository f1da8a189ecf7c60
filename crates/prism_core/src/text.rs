//! Line-oriented text helpers shared by the section parser and the preprocessor.

use std::borrow::Cow;

/// Removes `//` line comments and `/* */` block comments.
///
/// Newlines inside block comments are kept so line structure survives.
/// Comment markers inside double-quoted strings are left alone.
#[must_use]
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if c == '"' || c == '\n' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                // Line comment: drop everything up to (not including) the newline
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Drops lines that are empty or whitespace-only, and trims trailing whitespace.
#[must_use]
pub fn strip_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Comment and blank-line stripping applied to a whole document before parsing.
#[must_use]
pub fn clean_document(text: &str) -> String {
    strip_blank_lines(&strip_comments(text))
}

/// Splits a line into whitespace separated tokens.
#[inline]
#[must_use]
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Splits `name[N]` (optionally followed by `;`) into the bare name and the array length.
///
/// A name without brackets has length 1. Returns `None` when the brackets are
/// malformed or the length is not a positive integer.
#[must_use]
pub fn split_array_suffix(token: &str) -> Option<(&str, u32)> {
    let token = token.trim().trim_end_matches(';').trim_end();

    let Some(open) = token.find('[') else {
        return (!token.is_empty() && !token.contains(']')).then_some((token, 1));
    };

    let name = token[..open].trim_end();
    let rest = &token[open + 1..];
    let close = rest.find(']')?;
    if !rest[close + 1..].trim().is_empty() || name.is_empty() {
        return None;
    }

    match rest[..close].trim().parse::<u32>() {
        Ok(len) if len > 0 => Some((name, len)),
        _ => None,
    }
}

/// Parses a hexadecimal mask such as `F`, `ff` or `0xFF`.
#[must_use]
pub fn parse_hex(token: &str) -> Option<u32> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Splits a `#directive rest` line into its name and trimmed remainder.
///
/// Whitespace between `#` and the name is tolerated. Returns `None` for lines
/// that are not directives.
#[must_use]
pub fn directive(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim_start().strip_prefix('#')?.trim_start();
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some((&rest[..end], rest[end..].trim()))
}

#[inline]
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[inline]
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Returns `true` if `word` is a valid identifier.
#[must_use]
pub fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_char)
}

/// Rewrites every identifier in `text` for which `replace` returns `Some`.
///
/// Numeric tokens such as `1e5` or `0x1F` are never split into identifiers.
pub fn replace_identifiers<'a, F>(text: &'a str, mut replace: F) -> Cow<'a, str>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out: Option<String> = None;
    let mut copied = 0;
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if is_ident_start(c) || c.is_ascii_digit() {
            let start = i;
            while i < bytes.len() && is_ident_char(bytes[i] as char) {
                i += 1;
            }
            if c.is_ascii_digit() {
                continue;
            }
            let word = &text[start..i];
            if let Some(replacement) = replace(word) {
                let buf = out.get_or_insert_with(|| String::with_capacity(text.len()));
                buf.push_str(&text[copied..start]);
                buf.push_str(&replacement);
                copied = i;
            }
        } else {
            i += 1;
            // Skip the continuation bytes of multi-byte characters
            while i < bytes.len() && !text.is_char_boundary(i) {
                i += 1;
            }
        }
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&text[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("a // b\nc"), "a \nc");
        assert_eq!(strip_comments("a /* b */ c"), "a  c");
        assert_eq!(strip_comments("a /* b\nb */ c"), "a \n c");
        assert_eq!(strip_comments("#include \"a//b\""), "#include \"a//b\"");
    }

    #[test]
    fn test_clean_document() {
        let doc = "#section layout\n\n   \nvec3 position // pos\n/* block */\nvec2 uv\n";
        assert_eq!(clean_document(doc), "#section layout\nvec3 position\nvec2 uv\n");
    }

    #[test]
    fn test_split_array_suffix() {
        assert_eq!(split_array_suffix("color"), Some(("color", 1)));
        assert_eq!(split_array_suffix("color;"), Some(("color", 1)));
        assert_eq!(split_array_suffix("lights[4];"), Some(("lights", 4)));
        assert_eq!(split_array_suffix("lights [4]"), Some(("lights", 4)));
        assert_eq!(split_array_suffix("lights[0]"), None);
        assert_eq!(split_array_suffix("lights[x]"), None);
        assert_eq!(split_array_suffix("lights[4"), None);
        assert_eq!(split_array_suffix("[4]"), None);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("F"), Some(15));
        assert_eq!(parse_hex("0xff"), Some(255));
        assert_eq!(parse_hex("0x"), None);
        assert_eq!(parse_hex("zz"), None);
    }

    #[test]
    fn test_directive() {
        assert_eq!(directive("#define X 1"), Some(("define", "X 1")));
        assert_eq!(directive("  #  endif"), Some(("endif", "")));
        assert_eq!(directive("#include<lib>"), Some(("include", "<lib>")));
        assert_eq!(directive("x = 1;"), None);
        assert_eq!(directive("#"), None);
    }

    #[test]
    fn test_replace_identifiers() {
        let out = replace_identifiers("X + XY * 1e5 + X", |w| (w == "X").then(|| "2".to_string()));
        assert_eq!(out, "2 + XY * 1e5 + 2");

        let untouched = replace_identifiers("a + b", |_| None);
        assert!(matches!(untouched, Cow::Borrowed(_)));
    }
}
