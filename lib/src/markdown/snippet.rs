use std::fmt::Write;

use pulldown_cmark::{Event, Tag, TagEnd};

/// Captures the leading blocks of a document as HTML into `snippet`, stopping
/// at the first top-level block boundary after `min_length` bytes of text.
/// Headings, code blocks, lists, and tables are never captured.
pub(crate) struct SnippetIterator<'s, I> {
    snippet: &'s mut String,
    inner: I,
    capture: Vec<bool>,
    snip_text_len: usize,
    min_length: usize,
    done: bool,
}

impl<'s, I> SnippetIterator<'s, I> {
    pub fn new(snippet: &'s mut String, min_length: usize, inner: I) -> Self {
        SnippetIterator {
            snippet,
            inner,
            capture: vec![],
            snip_text_len: 0,
            min_length,
            done: min_length == 0,
        }
    }
}

macro_rules! open {
    ($it:expr) => ($it.capture.push(false));
    ($it:expr, $($fmt:tt)*) => ({
        if $it.capture.last().copied().unwrap_or(true) {
            let _ = write!($it.snippet, $($fmt)*);
            $it.capture.push(true);
        } else {
            $it.capture.push(false);
        }
    })
}

macro_rules! close {
    ($it:expr) => ({
        $it.capture.pop();
        if $it.capture.is_empty() && $it.snip_text_len >= $it.min_length {
            $it.done = true;
        }
    });
    ($it:expr, $($fmt:tt)*) => ({
        if $it.capture.last().copied().unwrap_or_default() {
            let _ = write!($it.snippet, $($fmt)*);
        }

        close!($it);
    })
}

macro_rules! capture {
    ($it:expr, $str:expr) => (capture!($it, $str, "{}", Escaped($str)));
    ($it:expr, $str:expr, $($fmt:tt)*) => ({
        if $it.capture.last().copied().unwrap_or_default() {
            let _ = write!($it.snippet, $($fmt)*);
            $it.snip_text_len += $str.len();
        }
    })
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for SnippetIterator<'_, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let event = self.inner.next()?;
        if self.done {
            return Some(event);
        }

        match &event {
            Event::Start(tag) => match tag {
                Tag::Paragraph => open!(self, "<p>"),
                Tag::Emphasis => open!(self, "<em>"),
                Tag::Strong => open!(self, "<strong>"),
                Tag::Strikethrough => open!(self, "<del>"),
                Tag::BlockQuote => open!(self, "<blockquote>"),
                Tag::Link { dest_url, .. } => {
                    open!(self, r#"<a href="{}">"#, Escaped(dest_url))
                }
                _ => open!(self),
            },
            Event::End(tag) => match tag {
                TagEnd::Paragraph => close!(self, "</p>"),
                TagEnd::Emphasis => close!(self, "</em>"),
                TagEnd::Strong => close!(self, "</strong>"),
                TagEnd::Strikethrough => close!(self, "</del>"),
                TagEnd::BlockQuote => close!(self, "</blockquote>"),
                TagEnd::Link => close!(self, "</a>"),
                _ => close!(self),
            },

            Event::SoftBreak => capture!(self, " "),
            Event::HardBreak => capture!(self, "", "<br>"),
            Event::Code(text) => capture!(self, text, "<code>{}</code>", Escaped(text)),
            Event::Text(text) => capture!(self, text),
            _ => { /* markup, footnotes, math: not part of a snippet */ }
        }

        Some(event)
    }
}

/// Displays a string with `&`, `<`, `>`, and `"` escaped for HTML.
struct Escaped<'a>(&'a str);

impl std::fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut last = 0;
        for (i, b) in self.0.bytes().enumerate() {
            let escaped = match b {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                _ => continue,
            };

            f.write_str(&self.0[last..i])?;
            f.write_str(escaped)?;
            last = i + 1;
        }

        f.write_str(&self.0[last..])
    }
}
