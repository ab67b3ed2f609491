//! Markdown to HTML conversion.
//!
//! A single pass over the `pulldown-cmark` event stream renders the HTML and,
//! on the side, collects a short HTML snippet and a table of contents.

mod heading;
mod snippet;
mod toc;

use pulldown_cmark::{html, Options, Parser};

use crate::value::Value;

pub use toc::Entry as TocEntry;

/// Default number of text bytes captured into a snippet.
pub const SNIPPET_LENGTH: usize = 250;

/// Converts Markdown to HTML.
#[derive(Debug, Clone, Copy)]
pub struct Markdown {
    options: Options,
    snippet_length: usize,
}

/// The products of converting one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub html: String,
    /// The leading paragraphs, as HTML.
    pub snippet: String,
    pub toc: Vec<TocEntry>,
}

impl Default for Markdown {
    fn default() -> Self {
        Markdown {
            options: Options::all().difference(Options::ENABLE_SMART_PUNCTUATION),
            snippet_length: SNIPPET_LENGTH,
        }
    }
}

impl Markdown {
    /// Sets the minimum amount of text captured into the snippet. `0` disables
    /// snippets.
    pub fn snippet_length(mut self, length: usize) -> Self {
        self.snippet_length = length;
        self
    }

    pub fn render(&self, input: &str) -> Rendered {
        let (mut snippet, mut toc) = (String::new(), vec![]);
        let mut html = String::with_capacity(input.len() * 3 / 2);

        let events = Parser::new_ext(input, self.options);
        let events = heading::HeadingIds::new(events);
        let events = toc::TableOfContents::new(&mut toc, events);
        let events = snippet::SnippetIterator::new(&mut snippet, self.snippet_length, events);
        html::push_html(&mut html, events);

        Rendered { html, snippet, toc }
    }
}

impl Rendered {
    /// The table of contents as a list of `{title, level, id, children}`.
    pub fn toc_value(&self) -> Value {
        self.toc.iter().map(Value::from).collect()
    }
}

/// Converts `input` with the default options.
///
/// ```rust
/// use pressroom::markdown::render;
///
/// let rendered = render("# Hello\n\nSome *text*.");
/// assert_eq!(rendered.html, "<h1 id=\"hello\">Hello</h1>\n<p>Some <em>text</em>.</p>\n");
/// assert_eq!(rendered.snippet, "<p>Some <em>text</em>.</p>");
/// assert_eq!(rendered.toc[0].title, "Hello");
/// ```
pub fn render(input: &str) -> Rendered {
    Markdown::default().render(input)
}
