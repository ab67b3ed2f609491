//! A minimal template language.
//!
//! Templates are plain text with two kinds of markup:
//!
//!   * **Placeholders**, `{{ path }}`, are replaced by the textual form of the
//!     value at `path` in the context.
//!
//!   * **Loop blocks**, `[[( path ) body ]]`, are replaced by `body` rendered
//!     once for every element of the array at `path`. While rendering `body`,
//!     the element is available as `item`; every other key of the enclosing
//!     context stays visible. Loop blocks nest.
//!
//! Paths are `.`-separated keys, each optionally followed by `[n]` indices:
//! `page.meta.title`, `posts[0].url`. See [`Path`].
//!
//! ```rust
//! use pressroom::{template::fill, value};
//!
//! let context = value![
//!     "title" => "Notes",
//!     "posts" => vec![value!["name" => "one"], value!["name" => "two"]],
//! ];
//!
//! let html = fill("<h1>{{ title }}</h1>[[(posts) <p>{{ item.name }} of {{ title }}</p>]]", &context);
//! assert_eq!(html.unwrap(), "<h1>Notes</h1><p>one of Notes</p><p>two of Notes</p>");
//! ```
//!
//! There are no conditionals, expressions, includes, or escaping: values are
//! inserted verbatim.

mod path;
mod scan;

use std::fmt::{self, Write};
use std::sync::Arc;

use tracing::warn;

use crate::value::Value;
use scan::Node;

pub use path::{Path, PathError, resolve};

/// The context key that holds the current element inside a loop body.
pub const LOOP_ITEM: &str = "item";

/// What to do with a placeholder whose path doesn't resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Leave the placeholder's text in the output and record the failure.
    #[default]
    Lenient,
    /// Fail the render.
    Strict,
}

/// A parsed template, ready to be filled any number of times.
#[derive(Debug)]
pub struct Template {
    name: Arc<str>,
    source: Arc<str>,
    nodes: Vec<Node>,
}

/// The result of filling a template.
#[derive(Debug, Clone, PartialEq)]
pub struct Filled {
    pub output: String,
    /// Placeholders left untouched under [`Policy::Lenient`], in output order.
    pub unresolved: Vec<PathError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// The template's markup is malformed.
    Syntax { template: Arc<str>, line: usize, column: usize, reason: String },
    /// A placeholder failed to resolve under [`Policy::Strict`].
    Unresolved { template: Arc<str>, error: PathError },
    /// A loop's path failed to resolve.
    LoopPath { template: Arc<str>, error: PathError },
    /// A loop's path resolved to something other than an array.
    NotASequence { template: Arc<str>, path: Arc<str>, found: &'static str },
}

/// Which kinds of top-level markup a render pass replaces. Loop bodies are
/// always rendered completely.
#[derive(Debug, Clone, Copy)]
struct Mode {
    loops: bool,
    placeholders: bool,
}

impl Mode {
    const FILL: Mode = Mode { loops: true, placeholders: true };
    const EXPAND: Mode = Mode { loops: true, placeholders: false };
    const SUBSTITUTE: Mode = Mode { loops: false, placeholders: true };
}

struct Renderer<'t> {
    template: &'t Template,
    policy: Policy,
    mode: Mode,
    output: String,
    unresolved: Vec<PathError>,
}

impl Template {
    /// Parses `source`. `name` only appears in diagnostics.
    pub fn parse<N, S>(name: N, source: S) -> Result<Template, TemplateError>
        where N: Into<Arc<str>>, S: Into<Arc<str>>
    {
        let (name, source) = (name.into(), source.into());
        match scan::scan(&source) {
            Ok(nodes) => Ok(Template { name, source, nodes }),
            Err(syntax) => {
                let (line, column) = line_column(&source, syntax.offset);
                Err(TemplateError::Syntax { template: name, line, column, reason: syntax.reason })
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Expands loops, then substitutes placeholders, leaving unresolved
    /// placeholders in place.
    pub fn fill(&self, context: &Value) -> Result<Filled, TemplateError> {
        self.fill_with(context, Policy::Lenient)
    }

    pub fn fill_with(&self, context: &Value, policy: Policy) -> Result<Filled, TemplateError> {
        self.render(context, policy, Mode::FILL)
    }

    /// Replaces every top-level loop block with its expansion, leaving
    /// top-level placeholders as they are. Loop bodies are filled completely.
    pub fn expand_loops(&self, context: &Value, policy: Policy) -> Result<Filled, TemplateError> {
        self.render(context, policy, Mode::EXPAND)
    }

    /// Replaces every top-level placeholder, leaving loop blocks as they are.
    pub fn substitute(&self, context: &Value, policy: Policy) -> Result<Filled, TemplateError> {
        self.render(context, policy, Mode::SUBSTITUTE)
    }

    fn render(&self, context: &Value, policy: Policy, mode: Mode) -> Result<Filled, TemplateError> {
        let mut renderer = Renderer {
            template: self,
            policy,
            mode,
            output: String::with_capacity(self.source.len()),
            unresolved: vec![],
        };

        renderer.render(&self.nodes, context, 0)?;
        Ok(Filled { output: renderer.output, unresolved: renderer.unresolved })
    }
}

impl Renderer<'_> {
    fn render(&mut self, nodes: &[Node], context: &Value, depth: usize) -> Result<(), TemplateError> {
        let template = self.template;
        for node in nodes {
            match node {
                Node::Text(span) => self.output.push_str(&template.source[span.clone()]),
                Node::Placeholder { span, .. } if depth == 0 && !self.mode.placeholders => {
                    self.output.push_str(&template.source[span.clone()]);
                }
                Node::Loop { span, .. } if depth == 0 && !self.mode.loops => {
                    self.output.push_str(&template.source[span.clone()]);
                }
                Node::Placeholder { span, path } => {
                    let resolved = match path {
                        Ok(path) => path.resolve(context),
                        Err(e) => Err(e.clone()),
                    };

                    match resolved {
                        Ok(value) => {
                            let _ = write!(self.output, "{value}");
                        }
                        Err(error) if self.policy == Policy::Lenient => {
                            self.output.push_str(&template.source[span.clone()]);
                            self.unresolved.push(error);
                        }
                        Err(error) => return Err(TemplateError::Unresolved {
                            template: template.name.clone(),
                            error,
                        }),
                    }
                }
                Node::Loop { path, body, .. } => {
                    let items = match path.resolve(context) {
                        Ok(Value::Array(items)) => items,
                        Ok(other) => return Err(TemplateError::NotASequence {
                            template: template.name.clone(),
                            path: path.as_str().into(),
                            found: other.kind(),
                        }),
                        Err(error) => return Err(TemplateError::LoopPath {
                            template: template.name.clone(),
                            error,
                        }),
                    };

                    for item in items.iter() {
                        let scope = context.with(LOOP_ITEM, item.clone());
                        self.render(body, &scope, depth + 1)?;
                    }
                }
            }
        }

        Ok(())
    }
}

/// 1-based line and column (in characters) of byte `offset` in `source`.
fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (line, before[line_start..].chars().count() + 1)
}

/// Fills `template` with `context`: loops first, then placeholders.
///
/// Placeholders that don't resolve are left as written and logged as
/// warnings. A loop whose path doesn't resolve to an array is an error.
pub fn fill(template: &str, context: &Value) -> Result<String, TemplateError> {
    if !crate::util::is_template(template) {
        return Ok(template.to_string());
    }

    let filled = Template::parse("<inline>", template)?.fill(context)?;
    for error in &filled.unresolved {
        warn!(%error, "left placeholder unresolved");
    }

    Ok(filled.output)
}

/// Replaces `{{ path }}` placeholders in `template`. Loop blocks are left
/// untouched.
pub fn substitute(template: &str, context: &Value) -> Result<String, TemplateError> {
    let filled = Template::parse("<inline>", template)?.substitute(context, Policy::Lenient)?;
    for error in &filled.unresolved {
        warn!(%error, "left placeholder unresolved");
    }

    Ok(filled.output)
}

/// Expands `[[( path ) body ]]` loop blocks in `template`. Placeholders
/// outside of loops are left untouched.
pub fn expand_loops(template: &str, context: &Value) -> Result<String, TemplateError> {
    let filled = Template::parse("<inline>", template)?.expand_loops(context, Policy::Lenient)?;
    for error in &filled.unresolved {
        warn!(%error, "left placeholder unresolved");
    }

    Ok(filled.output)
}

impl TemplateError {
    pub fn template(&self) -> &str {
        match self {
            TemplateError::Syntax { template, .. }
            | TemplateError::Unresolved { template, .. }
            | TemplateError::LoopPath { template, .. }
            | TemplateError::NotASequence { template, .. } => template,
        }
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Syntax { template, line, column, reason } => {
                write!(f, "syntax error in template `{template}` at {line}:{column}: {reason}")
            }
            TemplateError::Unresolved { template, error } => {
                write!(f, "unresolved placeholder in template `{template}`: {error}")
            }
            TemplateError::LoopPath { template, error } => {
                write!(f, "loop in template `{template}` has no array to iterate: {error}")
            }
            TemplateError::NotASequence { template, path, found } => {
                write!(f, "loop in template `{template}` iterates over `{path}`, \
                    which is a {found}, not an array")
            }
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::Unresolved { error, .. } | TemplateError::LoopPath { error, .. } => {
                Some(error)
            }
            _ => None,
        }
    }
}

impl_error_detail_with_std_error!(TemplateError);

#[cfg(test)]
static_assertions::assert_impl_all!(Template: Send, Sync);
