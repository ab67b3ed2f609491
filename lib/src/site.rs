//! Building a site: the whole pipeline from a site root to an output tree.
//!
//! ```text
//! site/
//!   config.json
//!   templates/   index.html, page.html (named by `routes`)
//!   content/     one directory per post
//!   static/      copied verbatim
//!   dist/        the output, recreated on every build
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{Config, Paths};
use crate::content::{self, Post, Skipped};
use crate::error::{Chainable, Result};
use crate::fstree::FsTree;
use crate::markdown::Markdown;
use crate::template::{Filled, Policy, Template};
use crate::util::time;
use crate::value::{Dict, Sink, Source, Value};

pub const INDEX_FILE: &str = "index.html";

/// A site root and its configuration, ready to be built.
#[derive(Debug, Clone)]
pub struct Site {
    pub root: PathBuf,
    pub config: Config,
    /// `config.paths`, resolved against `root`.
    pub paths: Paths,
    pub policy: Policy,
    pub markdown: Markdown,
}

/// What a build did.
#[derive(Debug, Default)]
pub struct Report {
    pub output: PathBuf,
    /// Slugs of the posts written, in index order.
    pub built: Vec<Arc<str>>,
    /// Posts that failed to load or render.
    pub skipped: Vec<Skipped>,
    /// Number of static files copied.
    pub assets: usize,
    /// Number of placeholders left unresolved across all pages.
    pub unresolved: usize,
}

struct Templates {
    main: Template,
    pages: Template,
}

impl Site {
    /// Loads the configuration in `root`. See [`Config::discover()`].
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Site> {
        let root = root.as_ref();
        Ok(Site::with_config(root, Config::discover(root)?))
    }

    pub fn with_config<P: AsRef<Path>>(root: P, config: Config) -> Site {
        let root = root.as_ref().to_path_buf();
        let policy = if config.strict { Policy::Strict } else { Policy::Lenient };
        Site {
            paths: config.paths.resolve(&root),
            markdown: Markdown::default(),
            root,
            config,
            policy,
        }
    }

    /// Writes to `output` instead of the configured output directory.
    pub fn output<P: AsRef<Path>>(mut self, output: P) -> Self {
        self.paths.output = self.root.join(output);
        self
    }

    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds the site. Post failures are logged and recorded in the
    /// [`Report`]; everything else is fatal.
    pub fn build(&self) -> Result<Report> {
        let output = &self.paths.output;
        info!(root = %self.root.display(), output = %output.display(), "building site");

        time!("reset output", self.reset_output())?;
        let assets = time!("copy static", self.copy_static())?;
        let templates = time!("load templates", self.load_templates())?;
        let posts = time!("load posts", content::load_posts(&self.paths.content, &self.markdown))?;

        let mut report = Report {
            output: output.clone(),
            skipped: posts.skipped,
            assets,
            ..Report::default()
        };

        let (loaded, clashing): (Vec<_>, Vec<_>) = posts.loaded.into_iter()
            .partition(|post| !post.url().eq_ignore_ascii_case(INDEX_FILE));

        for post in clashing {
            warn!(slug = %post.slug, "skipping post: its page would overwrite the index");
            let reason = error! {
                "post would overwrite the index page",
                "post" => &post.slug,
                "page" => INDEX_FILE,
            };

            report.skipped.push(Skipped { slug: post.slug, reason });
        }

        let rendered: Vec<_> = time!("render pages", loaded.into_par_iter()
            .map(|post| {
                let result = self.render_page(&templates.pages, &post);
                (post, result)
            })
            .collect());

        let mut built = vec![];
        for (post, result) in rendered {
            match result {
                Ok(unresolved) => {
                    report.unresolved += unresolved;
                    report.built.push(post.slug.clone());
                    built.push(post);
                }
                Err(reason) => {
                    warn!(slug = %post.slug, reason = %reason.root_cause(), "skipping post");
                    debug!("{reason}");
                    report.skipped.push(Skipped { slug: post.slug, reason });
                }
            }
        }

        report.unresolved += time!("render index", self.render_index(&templates.main, &built))?;
        info!(
            built = report.built.len(),
            skipped = report.skipped.len(),
            assets = report.assets,
            "site built"
        );

        Ok(report)
    }

    /// The context shared by every template: `title` and the config globals.
    pub fn globals(&self) -> Dict {
        let mut globals = self.config.globals.clone();
        globals.insert("title".into(), self.config.title.clone().into());
        globals
    }

    /// `{ title, posts: [record...], <globals> }`
    pub fn index_context(&self, posts: &[Post]) -> Value {
        let mut context = self.globals();
        let records: Vec<Value> = posts.iter().map(Post::record).collect();
        context.insert("posts".into(), records.into());
        context.into()
    }

    /// `{ title, page: record, <globals> }`
    pub fn page_context(&self, post: &Post) -> Value {
        let mut context = self.globals();
        context.insert("page".into(), post.record());
        context.into()
    }

    fn reset_output(&self) -> Result<()> {
        let output = &self.paths.output;
        if self.root.starts_with(output) {
            return err! {
                "refusing to clear output directory: it contains the site",
                "output directory" => output.display(),
                "site root" => self.root.display(),
            };
        }

        let sources = [&self.paths.content, &self.paths.templates, &self.paths.assets];
        let overlap = sources.iter().find(|dir| output.starts_with(dir) || dir.starts_with(output));
        if let Some(source) = overlap {
            return err! {
                "refusing to clear output directory: it overlaps a source directory",
                "output directory" => output.display(),
                "source directory" => source.display(),
            };
        }

        if output.exists() {
            debug!(path = %output.display(), "removing previous output");
            fs::remove_dir_all(output).chain_with(|| error! {
                "failed to clear output directory",
                "output directory" => output.display(),
            })?;
        }

        fs::create_dir_all(output).chain_with(|| error! {
            "failed to create output directory",
            "output directory" => output.display(),
        })
    }

    fn copy_static(&self) -> Result<usize> {
        let assets = &self.paths.assets;
        if !assets.is_dir() {
            debug!(path = %assets.display(), "no static directory");
            return Ok(0);
        }

        let tree = FsTree::build_all(assets)?;
        let files = tree.files(tree.root_id());
        files.par_iter()
            .map(|file| -> Result<()> {
                let relative = file.path_relative_to(tree.root()).unwrap_or(&*file.path);
                let target = self.paths.output.join(relative);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }

                debug!(asset = %relative.display(), "copying");
                fs::copy(&file.path, &target).chain_with(|| error! {
                    "failed to copy static file",
                    "source" => file.path.display(),
                    "destination" => target.display(),
                })?;

                Ok(())
            })
            .collect::<Result<Vec<()>>>()?;

        Ok(files.len())
    }

    fn load_templates(&self) -> Result<Templates> {
        let load = |route: &Path| -> Result<Template> {
            let path = self.paths.templates.join(route);
            let source = path.as_path().try_read::<String>().chain_with(|| error! {
                "failed to load template",
                "template" => route.display(),
            })?;

            let template = Template::parse(route.to_string_lossy(), source)?;
            Ok(template)
        };

        Ok(Templates {
            main: load(self.config.routes.main.as_path())?,
            pages: load(self.config.routes.pages.as_path())?,
        })
    }

    /// Renders one post's page, returning the number of unresolved
    /// placeholders left in it.
    fn render_page(&self, template: &Template, post: &Post) -> Result<usize> {
        let filled = template.fill_with(&self.page_context(post), self.policy)
            .chain_with(|| error! {
                "failed to render post page",
                "post" => &post.slug,
            })?;

        let path = self.paths.output.join(post.url());
        self.write(template, &path, filled)
    }

    fn render_index(&self, template: &Template, posts: &[Post]) -> Result<usize> {
        let filled = template.fill_with(&self.index_context(posts), self.policy)
            .chain_with(|| "failed to render index page")?;

        self.write(template, &self.paths.output.join(INDEX_FILE), filled)
    }

    fn write(&self, template: &Template, path: &Path, filled: Filled) -> Result<usize> {
        for error in &filled.unresolved {
            warn!(template = template.name(), output = %path.display(), %error,
                "placeholder left unresolved");
        }

        let unresolved = filled.unresolved.len();
        path.write(filled.output)?;
        debug!(path = %path.display(), "wrote page");
        Ok(unresolved)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        let (built, assets) = (self.built.len(), self.assets);
        write!(f, "built {built} post{} and copied {assets} static file{} into {}",
            plural(built), plural(assets), self.output.display())?;

        if !self.skipped.is_empty() {
            let names: Vec<_> = self.skipped.iter().map(|s| &*s.slug).collect();
            write!(f, "; skipped {}", names.join(", "))?;
        }

        if self.unresolved > 0 {
            write!(f, "; {} unresolved placeholder{}", self.unresolved, plural(self.unresolved))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(globals: &str) -> Site {
        let config = Config::from_json(&format!(r#"{{
            "title": "Blog",
            "routes": {{ "main": "index.html", "pages": "page.html" }}
            {globals}
        }}"#)).unwrap();

        Site::with_config("/site", config)
    }

    fn post(slug: &str) -> Post {
        Post {
            slug: slug.into(),
            meta: Arc::new(crate::dict!["title" => slug.to_uppercase()]),
            content: format!("<p>{slug}</p>").into(),
            snippet: "".into(),
            toc: Value::Null,
        }
    }

    #[test]
    fn contexts_have_canonical_shape() {
        let site = site(r#", "author": "Ada""#);
        let posts = [post("a"), post("b")];

        let index = site.index_context(&posts);
        assert_eq!(index.get("title"), Some(&Value::from("Blog")));
        assert_eq!(index.get("author"), Some(&Value::from("Ada")));
        let records = index.get("posts").and_then(|p| p.as_slice()).unwrap();
        assert_eq!(records[1].get("url"), Some(&Value::from("b.html")));
        assert_eq!(records[1].get("title"), Some(&Value::from("B")));

        let page = site.page_context(&posts[0]);
        assert_eq!(page.get("title"), Some(&Value::from("Blog")));
        let record = page.get("page").unwrap();
        assert_eq!(record.get("content"), Some(&Value::from("<p>a</p>")));
        assert_eq!(record.get("meta").and_then(|m| m.get("title")), Some(&Value::from("A")));
    }

    #[test]
    fn site_title_wins_over_global_title() {
        let site = site("");
        let mut config = site.config.clone();
        config.globals.insert("title".into(), "shadow".into());
        let site = Site::with_config("/site", config);
        assert_eq!(site.globals().get("title"), Some(&Value::from("Blog")));
    }

    #[test]
    fn strict_config_sets_policy() {
        assert_eq!(site("").policy, Policy::Lenient);
        assert_eq!(site(r#", "strict": true"#).policy, Policy::Strict);
        assert_eq!(site("").policy(Policy::Strict).policy, Policy::Strict);
    }

    #[test]
    fn output_override_resolves_against_root() {
        let site = site("").output("public");
        assert_eq!(site.paths.output, Path::new("/site/public"));
        assert_eq!(site.paths.content, Path::new("/site/content"));
    }

    #[test]
    fn refuses_to_clear_site_root() {
        let dir = tempfile::tempdir().unwrap();
        let site = site("").output(dir.path());
        let site = Site { root: dir.path().join("nested"), ..site };
        assert!(site.reset_output().is_err());
    }

    #[test]
    fn refuses_to_clear_source_directories() {
        for output in ["content", "templates", "static/dist", "."] {
            let error = site("").output(output).reset_output().unwrap_err();
            assert!(error.to_string().contains("refusing to clear output directory"), "{output}");
        }

        let dir = tempfile::tempdir().unwrap();
        let site = Site { root: dir.path().into(), ..site("") }.output("parts");
        let site = Site { paths: Paths { content: dir.path().join("parts/posts"), ..site.paths }, ..site };
        assert!(site.reset_output().is_err());
        assert!(!dir.path().join("parts").exists());
    }

    #[test]
    fn report_summary() {
        let mut report = Report { output: "dist".into(), assets: 1, ..Report::default() };
        report.built = vec!["a".into(), "b".into()];
        assert_eq!(report.to_string(), "built 2 posts and copied 1 static file into dist");

        report.unresolved = 1;
        report.skipped.push(Skipped { slug: "c".into(), reason: "broken".into() });
        assert_eq!(
            report.to_string(),
            "built 2 posts and copied 1 static file into dist; skipped c; 1 unresolved placeholder"
        );
    }
}
