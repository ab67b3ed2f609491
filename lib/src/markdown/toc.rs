use pulldown_cmark::{Event, Tag, TagEnd};

use crate::value::Value;

/// A heading and the headings nested beneath it.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub title: String,
    pub level: usize,
    pub id: Option<String>,
    pub children: Vec<Entry>,
}

/// Passes events through untouched while recording headings into `entries`.
pub(crate) struct TableOfContents<'t, I> {
    entries: &'t mut Vec<Entry>,
    entry: Option<Entry>,
    inner: I,
}

impl<'t, I> TableOfContents<'t, I> {
    pub fn new(entries: &'t mut Vec<Entry>, inner: I) -> Self {
        TableOfContents { entries, entry: None, inner }
    }
}

/// Appends `entry` under the most recent heading of a lower level, if any.
fn attach(entries: &mut Vec<Entry>, entry: Entry) {
    let nests = entries.last().map_or(false, |last| last.level < entry.level);
    match entries.last_mut() {
        Some(last) if nests => attach(&mut last.children, entry),
        _ => entries.push(entry),
    }
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for TableOfContents<'_, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let event = self.inner.next()?;
        match &event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                self.entry = Some(Entry {
                    title: String::new(),
                    level: *level as usize,
                    id: id.as_ref().map(|id| id.to_string()),
                    children: vec![],
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(entry) = &mut self.entry {
                    entry.title.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(..)) => {
                if let Some(entry) = self.entry.take() {
                    attach(self.entries, entry);
                }
            }
            _ => {}
        }

        Some(event)
    }
}

impl From<&Entry> for Value {
    fn from(value: &Entry) -> Self {
        crate::value![
            "title" => value.title.as_str(),
            "level" => value.level,
            "id" => value.id.as_deref(),
            "children" => value.children.iter()
                .map(Value::from)
                .collect::<Vec<_>>(),
        ]
    }
}
