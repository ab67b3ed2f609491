use std::fs;
use std::path::Path;

use pressroom::template::Policy;
use pressroom::Site;

const CONFIG: &str = r#"{
    "title": "Field Notes",
    "routes": { "main": "index.html", "pages": "page.html" },
    "author": "Ada"
}"#;

const INDEX: &str = "\
<h1>{{ title }}</h1>
<ul>[[(posts) <li><a href=\"{{ item.url }}\">{{ item.title }}</a> by {{ author }}</li>
]]</ul>";

const PAGE: &str = "\
<title>{{ page.title }} | {{ title }}</title>
<article>{{ page.content }}</article>";

fn write(root: &Path, path: &str, contents: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "config.json", CONFIG);
    write(root, "templates/index.html", INDEX);
    write(root, "templates/page.html", PAGE);
    write(root, "content/A/meta.json", r#"{"title": "Post A"}"#);
    write(root, "content/A/content.md", "Hello from *A*.");
    write(root, "content/B/meta.json", r#"{"title": "Post B"}"#);
    write(root, "content/B/content.md", "# B\n\nHello from B.");
    write(root, "static/css/site.css", "body {}");
    dir
}

#[test]
fn builds_index_pages_and_assets() {
    let dir = fixture();
    let report = Site::new(dir.path()).unwrap().build().unwrap();

    assert_eq!(report.built.iter().map(|s| &**s).collect::<Vec<_>>(), ["A", "B"]);
    assert!(report.skipped.is_empty());
    assert_eq!(report.assets, 1);
    assert_eq!(report.unresolved, 0);

    let out = dir.path().join("dist");
    assert_eq!(read(&out, "index.html"), "\
<h1>Field Notes</h1>
<ul><li><a href=\"A.html\">Post A</a> by Ada</li>
<li><a href=\"B.html\">Post B</a> by Ada</li>
</ul>");

    assert_eq!(read(&out, "A.html"), "\
<title>Post A | Field Notes</title>
<article><p>Hello from <em>A</em>.</p>\n</article>");

    assert!(read(&out, "B.html").contains("<h1 id=\"b\">B</h1>"));
    assert_eq!(read(&out, "css/site.css"), "body {}");
}

#[test]
fn post_without_content_is_skipped() {
    let dir = fixture();
    write(dir.path(), "content/C/meta.json", r#"{"title": "Post C"}"#);

    let report = Site::new(dir.path()).unwrap().build().unwrap();
    assert_eq!(report.built.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(&*report.skipped[0].slug, "C");

    let out = dir.path().join("dist");
    assert!(!out.join("C.html").exists());
    assert!(!read(&out, "index.html").contains("Post C"));
}

#[test]
fn missing_config_is_fatal() {
    let dir = fixture();
    fs::remove_file(dir.path().join("config.json")).unwrap();
    assert!(Site::new(dir.path()).is_err());
}

#[test]
fn missing_template_is_fatal() {
    let dir = fixture();
    fs::remove_file(dir.path().join("templates/page.html")).unwrap();
    let error = Site::new(dir.path()).unwrap().build().unwrap_err();
    assert!(error.to_string().contains("failed to load template"));
}

#[test]
fn unbalanced_template_is_fatal() {
    let dir = fixture();
    write(dir.path(), "templates/index.html", "<ul>[[(posts) <li>{{ item.title }}</li>");
    let error = Site::new(dir.path()).unwrap().build().unwrap_err();
    assert!(error.to_string().contains("index.html"));
}

#[test]
fn missing_static_dir_is_tolerated() {
    let dir = fixture();
    fs::remove_dir_all(dir.path().join("static")).unwrap();

    let report = Site::new(dir.path()).unwrap().build().unwrap();
    assert_eq!(report.assets, 0);
    assert_eq!(report.built.len(), 2);
}

#[test]
fn output_is_reset_between_builds() {
    let dir = fixture();
    write(dir.path(), "dist/stale.html", "old");

    Site::new(dir.path()).unwrap().build().unwrap();
    assert!(!dir.path().join("dist/stale.html").exists());
    assert!(dir.path().join("dist/index.html").exists());
}

#[test]
fn unresolved_placeholders_are_left_in_place() {
    let dir = fixture();
    write(dir.path(), "templates/page.html", "<p>{{ page.meta.subtitle }}</p>");

    let report = Site::new(dir.path()).unwrap().build().unwrap();
    assert_eq!(report.unresolved, 2);
    assert_eq!(read(&dir.path().join("dist"), "A.html"), "<p>{{ page.meta.subtitle }}</p>");
}

#[test]
fn strict_policy_skips_pages_but_fails_index() {
    let dir = fixture();
    write(dir.path(), "templates/page.html", "<p>{{ page.meta.subtitle }}</p>");

    let site = Site::new(dir.path()).unwrap().policy(Policy::Strict);
    let report = site.build().unwrap();
    assert!(report.built.is_empty());
    assert_eq!(report.skipped.len(), 2);

    write(dir.path(), "templates/index.html", "{{ missing }}");
    assert!(site.build().is_err());
}

#[test]
fn loop_over_non_array_skips_page() {
    let dir = fixture();
    write(dir.path(), "templates/page.html", "[[(page.tags) #{{ item }}]]");
    write(dir.path(), "content/A/meta.json", r#"{"title": "Post A", "tags": ["x", "y"]}"#);

    let report = Site::new(dir.path()).unwrap().build().unwrap();
    assert_eq!(report.built.iter().map(|s| &**s).collect::<Vec<_>>(), ["A"]);
    assert_eq!(&*report.skipped[0].slug, "B");
    assert_eq!(read(&dir.path().join("dist"), "A.html"), "#x#y");
}

#[test]
fn output_override_and_toml_config() {
    let dir = fixture();
    fs::remove_file(dir.path().join("config.json")).unwrap();
    write(dir.path(), "config.toml", r#"
        title = "Field Notes"
        author = "Ada"
        routes = { main = "index.html", pages = "page.html" }
    "#);

    let report = Site::new(dir.path()).unwrap().output("public").build().unwrap();
    assert_eq!(report.output, dir.path().join("public"));
    assert!(read(&report.output, "index.html").contains("Post B"));
}

#[test]
fn hidden_static_files_are_copied() {
    let dir = fixture();
    write(dir.path(), "static/.nojekyll", "");
    write(dir.path(), "static/.well-known/security.txt", "Contact: ada@example.com");
    write(dir.path(), "content/.drafts/meta.json", r#"{"title": "Draft"}"#);
    write(dir.path(), "content/.drafts/content.md", "Not yet.");

    let report = Site::new(dir.path()).unwrap().build().unwrap();
    assert_eq!(report.assets, 3);
    assert_eq!(report.built.len(), 2);

    let out = dir.path().join("dist");
    assert!(out.join(".nojekyll").is_file());
    assert_eq!(read(&out, ".well-known/security.txt"), "Contact: ada@example.com");
    assert!(!out.join(".drafts.html").exists());
}

#[test]
fn output_overlapping_sources_is_refused() {
    let dir = fixture();
    let error = Site::new(dir.path()).unwrap().output("content").build().unwrap_err();
    assert!(error.to_string().contains("overlaps a source directory"));
    assert_eq!(read(dir.path(), "content/A/content.md"), "Hello from *A*.");

    write(dir.path(), "config.json", r#"{
        "title": "Field Notes",
        "routes": { "main": "index.html", "pages": "page.html" },
        "paths": { "output": "templates" }
    }"#);

    assert!(Site::new(dir.path()).unwrap().build().is_err());
    assert!(dir.path().join("templates/page.html").is_file());
}

#[test]
fn post_named_index_is_skipped() {
    let dir = fixture();
    write(dir.path(), "content/index/meta.json", r#"{"title": "Sneaky"}"#);
    write(dir.path(), "content/index/content.md", "I am not the index.");

    let report = Site::new(dir.path()).unwrap().build().unwrap();
    assert_eq!(report.built.iter().map(|s| &**s).collect::<Vec<_>>(), ["A", "B"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(&*report.skipped[0].slug, "index");

    let index = read(&dir.path().join("dist"), "index.html");
    assert!(index.starts_with("<h1>Field Notes</h1>"));
    assert!(!index.contains("Sneaky"));
}
