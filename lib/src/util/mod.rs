mod macros;

pub use macros::*;

/// Convert spaces to hyphens. Remove characters that aren't alphanumerics,
/// underscores, or hyphens. Convert to lowercase. Also strip leading and
/// trailing whitespace.
pub fn slugify(string: &str) -> String {
    let mut output = String::with_capacity(string.len());

    let mut need_dash = false;
    for ch in string.chars() {
        // `deunicode` maps some of these to nothing.
        if ch.is_whitespace() || ch.is_control() {
            need_dash = !output.is_empty();
            continue;
        }

        for b in deunicode::deunicode_char(ch).unwrap_or("-").bytes() {
            match b {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' => {
                    if need_dash {
                        output.push('-');
                        need_dash = false;
                    }

                    output.push(b.to_ascii_lowercase() as char);
                }
                _ => {
                    // All runs of characters that aren't alphanumeric or `_`
                    // collapse into a single `-`.
                    need_dash = !output.is_empty();
                }
            }
        }
    }

    output
}

/// Returns `true` if `input` may contain a placeholder (`{{`) or a loop block
/// (`[[(`). A `false` means `input` renders to itself.
///
/// ```rust
/// use pressroom::util::is_template;
///
/// assert!(is_template("Hi {{ name }}"));
/// assert!(is_template("[[(posts) x ]]"));
/// assert!(!is_template("plain { text } and [[1]]"));
/// ```
pub fn is_template(input: &str) -> bool {
    let bytes = input.as_bytes();
    let mut start = 0;
    while let Some(i) = memchr::memchr2(b'{', b'[', &bytes[start..]) {
        let i = start + i;
        match (bytes[i], bytes.get(i + 1), bytes.get(i + 2)) {
            (b'{', Some(b'{'), _) => return true,
            (b'[', Some(b'['), Some(b'(')) => return true,
            (_, None, _) => return false,
            _ => start = i + 1,
        }
    }

    false
}
