use std::collections::VecDeque;
use std::fmt::Write;

use pulldown_cmark::{Event, Tag, TagEnd};
use rustc_hash::FxHashMap;

/// Gives every heading without an explicit `{#id}` an `id` derived from its
/// text. Repeated ids get a `-n` suffix.
pub(crate) struct HeadingIds<'a, I: Iterator<Item = Event<'a>>> {
    stack: VecDeque<Event<'a>>,
    seen: FxHashMap<String, usize>,
    inner: I,
}

impl<'a, I: Iterator<Item = Event<'a>>> HeadingIds<'a, I> {
    pub fn new(inner: I) -> Self {
        HeadingIds { stack: VecDeque::with_capacity(4), seen: FxHashMap::default(), inner }
    }

    fn unique(&mut self, mut id: String) -> String {
        match self.seen.get_mut(&id) {
            Some(n) => {
                let _ = write!(&mut id, "-{n}");
                *n += 1;
            }
            None => {
                self.seen.insert(id.clone(), 1);
            }
        }

        id
    }
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for HeadingIds<'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.stack.pop_front() {
            return Some(event);
        }

        match self.inner.next()? {
            Event::Start(Tag::Heading { level, id: None, classes, attrs }) => {
                let mut text = String::new();
                loop {
                    let event = self.inner.next()?;
                    if let Event::Text(ref s) | Event::Code(ref s) = event {
                        text.push_str(s);
                    } else if let Event::End(TagEnd::Heading(..)) = event {
                        break;
                    }

                    self.stack.push_back(event);
                }

                let id = self.unique(crate::util::slugify(&text));
                self.stack.push_back(Event::End(TagEnd::Heading(level)));
                Some(Event::Start(Tag::Heading { level, id: Some(id.into()), classes, attrs }))
            },
            event => Some(event)
        }
    }
}
