//! Loading posts from a content directory.
//!
//! Every visible subdirectory of the content root is one post, named by its
//! directory (the _slug_):
//!
//! ```text
//! content/
//!   hello-world/
//!     meta.json      (or meta.toml)
//!     content.md
//!   second-post/
//!     ...
//! ```

use std::sync::Arc;
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{Chainable, Error, Result};
use crate::fstree::{Entry, FsTree};
use crate::markdown::Markdown;
use crate::value::{Dict, Format, Json, Source, Toml, Value};

pub const META_FILE: &str = "meta.json";
pub const META_TOML_FILE: &str = "meta.toml";
pub const CONTENT_FILE: &str = "content.md";

/// A loaded post: its metadata and its content converted to HTML.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub slug: Arc<str>,
    pub meta: Arc<Dict>,
    /// The rendered HTML.
    pub content: Arc<str>,
    pub snippet: Arc<str>,
    pub toc: Value,
}

/// A post that failed to load.
#[derive(Debug)]
pub struct Skipped {
    pub slug: Arc<str>,
    pub reason: Error,
}

/// Every post in a content directory, in directory name order.
#[derive(Debug, Default)]
pub struct Posts {
    pub loaded: Vec<Post>,
    pub skipped: Vec<Skipped>,
}

impl Post {
    /// The output file name of the post's page.
    pub fn url(&self) -> String {
        format!("{}.html", self.slug)
    }

    /// The `title` metadata value if it's a string, the slug otherwise.
    pub fn title(&self) -> Arc<str> {
        match self.meta.get("title") {
            Some(Value::String(title)) => title.clone(),
            _ => self.slug.clone(),
        }
    }

    /// The post as seen by templates: every metadata key at the top level,
    /// plus `slug`, `url`, `title`, `meta`, `content`, `snippet`, and `toc`.
    /// The computed keys take precedence over metadata keys of the same name.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use pressroom::{dict, value::Value, content::Post};
    ///
    /// let post = Post {
    ///     slug: "hello".into(),
    ///     meta: Arc::new(dict!["author" => "Ada"]),
    ///     content: "<p>hi</p>".into(),
    ///     snippet: "<p>hi</p>".into(),
    ///     toc: Value::from(Vec::<Value>::new()),
    /// };
    ///
    /// let record = post.record();
    /// assert_eq!(record.get("author"), Some(&Value::from("Ada")));
    /// assert_eq!(record.get("url"), Some(&Value::from("hello.html")));
    /// assert_eq!(record.get("title"), Some(&Value::from("hello")));
    /// ```
    pub fn record(&self) -> Value {
        let mut record = (*self.meta).clone();
        record.extend(crate::dict![
            "slug" => self.slug.clone(),
            "url" => self.url(),
            "title" => self.title(),
            "meta" => self.meta.clone(),
            "content" => self.content.clone(),
            "snippet" => self.snippet.clone(),
            "toc" => self.toc.clone(),
        ]);

        Value::from(record)
    }
}

/// Loads every post under `root` in parallel.
///
/// Fails only if `root` can't be read. A post whose metadata or content is
/// missing or malformed is logged and reported in [`Posts::skipped`].
pub fn load_posts(root: &Path, markdown: &Markdown) -> Result<Posts> {
    let tree = FsTree::build(root).chain_with(|| error! {
        "failed to read content directory",
        "content root" => root.display(),
    })?;

    let dirs: Vec<_> = tree.children(tree.root_id())
        .filter(|entry| entry.is_dir())
        .collect();

    debug!(root = %root.display(), candidates = dirs.len(), "loading posts");
    let results: Vec<_> = dirs.par_iter()
        .map(|dir| (Arc::<str>::from(dir.file_name.as_str()), load_post(&tree, dir, markdown)))
        .collect();

    let mut posts = Posts::default();
    for (slug, result) in results {
        match result {
            Ok(post) => posts.loaded.push(post),
            Err(reason) => {
                warn!(%slug, reason = %reason.root_cause(), "skipping post");
                debug!("{reason}");
                posts.skipped.push(Skipped { slug, reason });
            }
        }
    }

    Ok(posts)
}

fn load_post(tree: &FsTree, dir: &Entry, markdown: &Markdown) -> Result<Post> {
    let slug: Arc<str> = dir.file_name.as_str().into();
    let meta = match tree.get_file(dir.id, META_FILE) {
        Some(file) => read_meta::<Json>(file)?,
        None => match tree.get_file(dir.id, META_TOML_FILE) {
            Some(file) => read_meta::<Toml>(file)?,
            None => return err! {
                "post has no metadata file",
                "post" => &slug,
                "expected" => dir.path.join(META_FILE).display(),
            },
        }
    };

    let source = tree.get_file(dir.id, CONTENT_FILE)
        .ok_or_else(|| error! {
            "post has no content file",
            "post" => &slug,
            "expected" => dir.path.join(CONTENT_FILE).display(),
        })?;

    let markdown_source = source.try_read::<String>()?;
    let rendered = markdown.render(&markdown_source);
    debug!(%slug, bytes = rendered.html.len(), "converted post");

    Ok(Post {
        meta,
        content: rendered.html.as_str().into(),
        snippet: rendered.snippet.as_str().into(),
        toc: rendered.toc_value(),
        slug,
    })
}

fn read_meta<F: Format>(file: &Entry) -> Result<Arc<Dict>> {
    let meta: Value = F::read(file)?;
    meta.into_dict().map_err(|value| error! {
        "post metadata must be an object",
        "file path" => file.path.display(),
        "found" => value.kind(),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use super::*;

    fn write(root: &Path, path: &str, contents: &str) {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn load(root: &Path) -> Posts {
        load_posts(root, &Markdown::default()).unwrap()
    }

    #[test]
    fn loads_posts_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b/meta.json", r#"{"title": "Bee"}"#);
        write(dir.path(), "b/content.md", "# B\n\nbody b");
        write(dir.path(), "a/meta.json", r#"{"title": "Ay", "tags": ["x"]}"#);
        write(dir.path(), "a/content.md", "body *a*");

        let posts = load(dir.path());
        assert!(posts.skipped.is_empty());

        let slugs: Vec<_> = posts.loaded.iter().map(|p| &*p.slug).collect();
        assert_eq!(slugs, ["a", "b"]);

        let a = &posts.loaded[0];
        assert_eq!(&*a.content, "<p>body <em>a</em></p>\n");
        assert_eq!(&*a.title(), "Ay");
        assert_eq!(a.url(), "a.html");
        assert_eq!(a.meta.get("tags").map(|t| t.to_string()), Some("x".into()));
        assert!(posts.loaded[1].toc.as_slice().map_or(false, |toc| toc.len() == 1));
    }

    #[test]
    fn skips_broken_posts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "good/meta.json", "{}");
        write(dir.path(), "good/content.md", "ok");
        write(dir.path(), "no-content/meta.json", "{}");
        write(dir.path(), "no-meta/content.md", "text");
        write(dir.path(), "bad-meta/meta.json", "{ nope");
        write(dir.path(), "bad-meta/content.md", "text");
        write(dir.path(), "array-meta/meta.json", "[1, 2]");
        write(dir.path(), "array-meta/content.md", "text");

        let posts = load(dir.path());
        assert_eq!(posts.loaded.len(), 1);
        assert_eq!(&*posts.loaded[0].slug, "good");
        assert_eq!(&*posts.loaded[0].title(), "good");

        let skipped: Vec<_> = posts.skipped.iter()
            .map(|s| (&*s.slug, s.reason.headline()))
            .collect();

        assert_eq!(skipped, [
            ("array-meta", "post metadata must be an object".to_string()),
            ("bad-meta", "invalid json data".to_string()),
            ("no-content", "post has no content file".to_string()),
            ("no-meta", "post has no metadata file".to_string()),
        ]);
    }

    #[test]
    fn ignores_files_and_hidden_dirs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "README.md", "not a post");
        write(dir.path(), ".drafts/meta.json", "{}");
        write(dir.path(), ".drafts/content.md", "secret");
        write(dir.path(), "post/meta.json", "{}");
        write(dir.path(), "post/content.md", "");

        let posts = load(dir.path());
        assert_eq!(posts.loaded.len(), 1);
        assert!(posts.skipped.is_empty());
        assert_eq!(&*posts.loaded[0].content, "");
    }

    #[test]
    fn toml_metadata_fallback() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "post/meta.toml", "title = \"From TOML\"\ndate = \"2024-01-01\"\n");
        write(dir.path(), "post/content.md", "text");

        let posts = load(dir.path());
        assert_eq!(&*posts.loaded[0].title(), "From TOML");
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let error = load_posts(&dir.path().join("missing"), &Markdown::default()).unwrap_err();
        assert_eq!(error.headline(), "failed to read content directory");
    }

    #[test]
    fn record_prefers_computed_keys() {
        let post = Post {
            slug: "s".into(),
            meta: Arc::new(crate::dict!["url" => "elsewhere", "content" => "meta", "n" => 1u8]),
            content: "<p>html</p>".into(),
            snippet: "".into(),
            toc: Value::Null,
        };

        let record = post.record();
        assert_eq!(record.get("url"), Some(&Value::from("s.html")));
        assert_eq!(record.get("content"), Some(&Value::from("<p>html</p>")));
        assert_eq!(record.get("n"), Some(&Value::from(1u8)));
        assert_eq!(
            record.get("meta").and_then(|m| m.get("content")),
            Some(&Value::from("meta"))
        );
    }
}
