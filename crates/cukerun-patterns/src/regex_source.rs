//! Static inspection of raw regular-expression sources.

/// Count the characters of `source` that sit outside capturing groups.
///
/// Escape sequences count as one character and a leading `^` or trailing `$`
/// anchor is ignored. Non-capturing groups (`(?:…)`, flags, look-arounds)
/// contribute their characters; named groups capture.
pub(crate) fn literal_chars(source: &str) -> usize {
    let body = source.strip_prefix('^').unwrap_or(source);
    let body = match body.strip_suffix('$') {
        Some(trimmed) if !trimmed.ends_with('\\') => trimmed,
        _ => body,
    };

    let mut groups: Vec<bool> = Vec::new();
    let mut capture_depth = 0usize;
    let mut in_class = false;
    let mut count = 0usize;
    let mut chars = body.chars().peekable();

    while let Some(ch) = chars.next() {
        let outside = capture_depth == 0;
        match ch {
            '\\' => {
                chars.next();
                if outside {
                    count += 1;
                }
            }
            '[' if !in_class => {
                in_class = true;
                if chars.peek() == Some(&'^') {
                    chars.next();
                    count += usize::from(outside);
                }
                if chars.peek() == Some(&']') {
                    chars.next();
                    count += usize::from(outside);
                }
                count += usize::from(outside);
            }
            ']' if in_class => {
                in_class = false;
                count += usize::from(outside);
            }
            '(' if !in_class => {
                let capturing = opens_capture(&mut chars.clone());
                groups.push(capturing);
                if capturing {
                    capture_depth += 1;
                } else if outside {
                    count += 1;
                }
            }
            ')' if !in_class => match groups.pop() {
                Some(true) => capture_depth = capture_depth.saturating_sub(1),
                _ => count += usize::from(outside),
            },
            _ => count += usize::from(outside),
        }
    }
    count
}

/// Decide whether the group whose `(` was just consumed captures.
fn opens_capture(rest: &mut impl Iterator<Item = char>) -> bool {
    if rest.next() != Some('?') {
        return true;
    }
    match rest.next() {
        Some('P') => rest.next() == Some('<'),
        Some('<') => !matches!(rest.next(), Some('=' | '!')),
        _ => false,
    }
}
