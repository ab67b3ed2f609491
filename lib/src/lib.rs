//! A small static site pipeline.
//!
//! # Overview
//!
//! `pressroom` turns a directory of posts into a static HTML site:
//!
//! ```text
//!   config.json ----------------------------+
//!                                           v
//!   content/<slug>/meta.json  --+      +---------+      dist/index.html
//!   content/<slug>/content.md --+----> | fill()  | ---> dist/<slug>.html
//!   templates/*.html -------------+--> +---------+      dist/<static files>
//! ```
//!
//! 1. The [site](site) configuration names two templates: one for the index
//!    page and one for every post page.
//! 2. [Posts](content) are loaded in parallel. Each post's metadata is read
//!    from JSON (or TOML) and its content converted from
//!    [Markdown](markdown) to HTML.
//! 3. Pages are rendered by filling a [template](template) with a
//!    [`Value`](value::Value) context. Templates understand exactly two
//!    constructs: `{{ path }}` placeholders and `[[( path ) body ]]` loops.
//!
//! Errors are reported through [`error::Error`], which chains context onto
//! causes. A post that fails to load or render is skipped; anything else
//! fails the build.

#[macro_use]
pub mod error;
pub mod util;
pub mod fstree;
pub mod value;
pub mod template;
pub mod markdown;
pub mod content;
pub mod config;
pub mod site;

pub use site::{Site, Report};
pub use config::Config;

#[doc(hidden)]
pub use tracing;
