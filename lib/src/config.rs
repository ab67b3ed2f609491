use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Chainable, Result};
use crate::value::{read_data, Dict, Json, Toml, Format};

/// Configuration file names, in lookup order.
pub const CONFIG_FILES: &[&str] = &["config.json", "config.toml"];

/// Site configuration, read from `config.json` or `config.toml`.
///
/// ```json
/// {
///   "title": "My Site",
///   "routes": { "main": "index.html", "pages": "page.html" },
///   "author": "Ada"
/// }
/// ```
///
/// Keys other than `title`, `routes`, `strict`, and `paths` are collected
/// into [`Config::globals`] and exposed at the top level of every template
/// context.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub title: Arc<str>,
    pub routes: Routes,
    /// Fail instead of leaving unresolved placeholders in the output.
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub paths: Paths,
    #[serde(flatten)]
    pub globals: Dict,
}

/// Template file names, relative to [`Paths::templates`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Routes {
    /// Renders `index.html`.
    pub main: PathBuf,
    /// Renders each post's page.
    pub pages: PathBuf,
}

/// Site directories. Relative paths are relative to the site root.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Paths {
    pub content: PathBuf,
    pub templates: PathBuf,
    #[serde(rename = "static")]
    pub assets: PathBuf,
    pub output: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            content: "content".into(),
            templates: "templates".into(),
            assets: "static".into(),
            output: "dist".into(),
        }
    }
}

impl Config {
    /// Reads the first of [`CONFIG_FILES`] that exists in `root`.
    pub fn discover(root: &Path) -> Result<Config> {
        let path = CONFIG_FILES.iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file());

        match path {
            Some(path) => Config::read(&path),
            None => err! {
                "site configuration not found",
                "site root" => root.display(),
                "expected one of" => CONFIG_FILES.join(", "),
            }
        }
    }

    /// Reads the configuration at `path`, a `.json` or `.toml` file.
    pub fn read(path: &Path) -> Result<Config> {
        read_data(path).chain_with(|| error! {
            "failed to load site configuration",
            "file path" => path.display(),
        })
    }

    pub fn from_json(json: &str) -> Result<Config> {
        Json::read(json)
    }

    pub fn from_toml(toml: &str) -> Result<Config> {
        Toml::read(toml)
    }
}

impl Paths {
    /// Returns `self` with every relative path joined onto `root`.
    pub fn resolve(&self, root: &Path) -> Paths {
        Paths {
            content: root.join(&self.content),
            templates: root.join(&self.templates),
            assets: root.join(&self.assets),
            output: root.join(&self.output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_json(r#"{
            "title": "Blog",
            "routes": { "main": "index.html", "pages": "page.html" }
        }"#).unwrap();

        assert_eq!(&*config.title, "Blog");
        assert_eq!(config.routes.pages, Path::new("page.html"));
        assert!(!config.strict);
        assert_eq!(config.paths, Paths::default());
        assert!(config.globals.is_empty());
    }

    #[test]
    fn unknown_keys_become_globals() {
        let config = Config::from_toml(r#"
            title = "Blog"
            author = "Ada"
            strict = true

            [routes]
            main = "main.html"
            pages = "post.html"

            [paths]
            static = "assets"

            [nav]
            home = "/"
        "#).unwrap();

        assert!(config.strict);
        assert_eq!(config.paths.assets, Path::new("assets"));
        assert_eq!(config.paths.content, Path::new("content"));
        assert_eq!(config.globals.get("author"), Some(&Value::from("Ada")));
        assert_eq!(config.globals["nav"].get("home"), Some(&Value::from("/")));
        assert!(!config.globals.contains_key("routes"));
    }

    #[test]
    fn missing_routes_are_an_error() {
        assert!(Config::from_json(r#"{"title": "Blog"}"#).is_err());
        assert!(Config::from_json(r#"{"routes": {"main": "a", "pages": "b"}}"#).is_err());
    }

    #[test]
    fn discover_prefers_json() {
        let dir = tempfile::tempdir().unwrap();
        let error = Config::discover(dir.path()).unwrap_err();
        assert_eq!(error.headline(), "site configuration not found");

        std::fs::write(dir.path().join("config.toml"), r#"
            title = "From TOML"
            routes = { main = "index.html", pages = "page.html" }
        "#).unwrap();
        assert_eq!(&*Config::discover(dir.path()).unwrap().title, "From TOML");

        std::fs::write(dir.path().join("config.json"), r#"{
            "title": "From JSON",
            "routes": { "main": "index.html", "pages": "page.html" }
        }"#).unwrap();
        assert_eq!(&*Config::discover(dir.path()).unwrap().title, "From JSON");
    }

    #[test]
    fn malformed_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), "{ \"title\": ").unwrap();
        let error = Config::discover(dir.path()).unwrap_err();
        assert_eq!(error.headline(), "failed to load site configuration");
        assert!(error.to_string().contains("invalid json data"));
    }

    #[test]
    fn relative_paths_resolve_against_root() {
        let paths = Paths { output: "/tmp/out".into(), ..Paths::default() };
        let resolved = paths.resolve(Path::new("/site"));
        assert_eq!(resolved.content, Path::new("/site/content"));
        assert_eq!(resolved.output, Path::new("/tmp/out"));
    }
}
