use std::ops::Range;

use crate::template::path::{Path, PathError};

const LOOP_OPEN: &[u8] = b"[[(";
const LOOP_CLOSE: &[u8] = b"]]";
const PLACEHOLDER_OPEN: &[u8] = b"{{";
const PLACEHOLDER_CLOSE: &str = "}}";

/// A parsed piece of a template. Spans are byte ranges into the source.
#[derive(Debug)]
pub(crate) enum Node {
    Text(Range<usize>),
    Placeholder {
        span: Range<usize>,
        path: Result<Path, PathError>,
    },
    Loop {
        span: Range<usize>,
        path: Path,
        body: Vec<Node>,
    },
}

#[derive(Debug)]
pub(crate) struct Syntax {
    pub offset: usize,
    pub reason: String,
}

/// A loop block whose `]]` hasn't been seen yet.
struct Open {
    start: usize,
    path: Path,
    body: Vec<Node>,
}

fn current<'a>(root: &'a mut Vec<Node>, open: &'a mut [Open]) -> &'a mut Vec<Node> {
    match open.last_mut() {
        Some(block) => &mut block.body,
        None => root,
    }
}

fn push_text(nodes: &mut Vec<Node>, span: Range<usize>) {
    if !span.is_empty() {
        nodes.push(Node::Text(span));
    }
}

/// Splits `source` into text, placeholders, and loop blocks.
///
/// Loop delimiters are matched first and balanced: every `]]` closes the
/// innermost open `[[(`. A `]]` outside of any loop, or a `{{` never followed
/// by `}}`, is plain text. Placeholder paths that fail to parse are kept as
/// errors so rendering can decide what to do with them; loop paths that fail
/// to parse are syntax errors.
pub(crate) fn scan(source: &str) -> Result<Vec<Node>, Syntax> {
    let bytes = source.as_bytes();
    let mut root = vec![];
    let mut open: Vec<Open> = vec![];
    let (mut cursor, mut text_start) = (0, 0);

    while let Some(i) = memchr::memchr3(b'{', b'[', b']', &bytes[cursor..]) {
        let i = cursor + i;
        let rest = &bytes[i..];

        if rest.starts_with(LOOP_OPEN) {
            let head = i + LOOP_OPEN.len();
            let head_end = match memchr::memchr2(b')', b'\n', &bytes[head..]) {
                Some(j) if bytes[head + j] == b')' => head + j,
                _ => return Err(Syntax {
                    offset: i,
                    reason: "loop block is missing a `)` after its path".into(),
                }),
            };

            let path = Path::parse(source[head..head_end].trim())
                .map_err(|e| Syntax { offset: i, reason: e.to_string() })?;

            push_text(current(&mut root, &mut open), text_start..i);
            open.push(Open { start: i, path, body: vec![] });

            cursor = head_end + 1;
            while bytes.get(cursor).map_or(false, |b| b.is_ascii_whitespace()) {
                cursor += 1;
            }

            text_start = cursor;
        } else if rest.starts_with(LOOP_CLOSE) && !open.is_empty() {
            push_text(current(&mut root, &mut open), text_start..i);
            cursor = i + LOOP_CLOSE.len();
            text_start = cursor;

            if let Some(block) = open.pop() {
                current(&mut root, &mut open).push(Node::Loop {
                    span: block.start..cursor,
                    path: block.path,
                    body: block.body,
                });
            }
        } else if rest.starts_with(PLACEHOLDER_OPEN) {
            let inner = i + PLACEHOLDER_OPEN.len();
            match source[inner..].find(PLACEHOLDER_CLOSE) {
                Some(j) => {
                    let end = inner + j + PLACEHOLDER_CLOSE.len();
                    push_text(current(&mut root, &mut open), text_start..i);
                    current(&mut root, &mut open).push(Node::Placeholder {
                        span: i..end,
                        path: Path::parse(source[inner..inner + j].trim()),
                    });

                    cursor = end;
                    text_start = cursor;
                }
                None => cursor = inner,
            }
        } else {
            cursor = i + 1;
        }
    }

    if let Some(block) = open.last() {
        return Err(Syntax {
            offset: block.start,
            reason: format!("loop over `{}` is never closed with `]]`", block.path.as_str()),
        });
    }

    push_text(&mut root, text_start..bytes.len());
    Ok(root)
}
