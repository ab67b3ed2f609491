use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// A parsed path expression such as `page.meta.title` or `posts[0].url`.
///
/// A path is a `.`-separated list of segments. Each segment names a key and
/// may be followed by any number of `[n]` indices into sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    raw: Arc<str>,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
struct Segment {
    name: Arc<str>,
    indices: Vec<usize>,
}

/// Why a path failed to parse or resolve.
#[derive(Debug, Clone, PartialEq)]
pub enum PathError {
    /// The path expression itself is malformed.
    Syntax { path: Arc<str>, reason: &'static str },
    /// A `null` was reached before every segment was consumed.
    Undefined { path: Arc<str>, segment: Arc<str> },
    /// A dictionary has no entry for the segment's key.
    MissingKey { path: Arc<str>, segment: Arc<str> },
    /// A key was looked up in something other than a dictionary.
    NotADict { path: Arc<str>, segment: Arc<str>, found: &'static str },
    /// An index was applied to something other than a sequence.
    NotASequence { path: Arc<str>, segment: Arc<str>, found: &'static str },
    /// An index was past the end of its sequence.
    OutOfBounds { path: Arc<str>, segment: Arc<str>, index: usize, len: usize },
}

impl Path {
    /// Parses `raw`, which should already be trimmed of surrounding whitespace.
    ///
    /// ```rust
    /// use pressroom::template::Path;
    ///
    /// assert!(Path::parse("a.b[1].c").is_ok());
    /// assert!(Path::parse("grid[0][2]").is_ok());
    /// assert!(Path::parse("a..b").is_err());
    /// assert!(Path::parse("a[x]").is_err());
    /// assert!(Path::parse("").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Path, PathError> {
        let syntax = |reason| PathError::Syntax { path: raw.into(), reason };
        if raw.is_empty() {
            return Err(syntax("empty path"));
        }

        let mut segments = vec![];
        for part in raw.split('.') {
            let (name, mut rest) = part.split_at(part.find('[').unwrap_or(part.len()));
            if name.is_empty() {
                return Err(syntax("empty segment name"));
            }

            if name.contains(']') {
                return Err(syntax("unexpected `]`"));
            }

            let mut indices = vec![];
            while !rest.is_empty() {
                let inner = rest.strip_prefix('[').ok_or(syntax("unexpected text after index"))?;
                let (digits, tail) = inner.split_once(']').ok_or(syntax("unterminated index"))?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(syntax("index must be a non-negative integer"));
                }

                indices.push(digits.parse().map_err(|_| syntax("index is too large"))?);
                rest = tail;
            }

            segments.push(Segment { name: name.into(), indices });
        }

        Ok(Path { raw: raw.into(), segments })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Follows `self` from `root`, returning the value it points to.
    ///
    /// ```rust
    /// use pressroom::template::Path;
    ///
    /// let root = serde_json::from_str(r#"{"a": {"b": [{"c": 1}, {"c": 2}]}}"#).unwrap();
    ///
    /// let path = Path::parse("a.b[1].c").unwrap();
    /// assert_eq!(path.resolve(&root).unwrap().to_string(), "2");
    ///
    /// let path = Path::parse("a.x").unwrap();
    /// let error = path.resolve(&root).unwrap_err();
    /// assert_eq!(error.segment(), Some("x"));
    /// ```
    pub fn resolve<'v>(&self, root: &'v Value) -> Result<&'v Value, PathError> {
        let mut current = root;
        for segment in &self.segments {
            let dict = match current {
                Value::Dict(dict) => dict,
                Value::Null => return Err(PathError::Undefined {
                    path: self.raw.clone(),
                    segment: segment.name.clone(),
                }),
                other => return Err(PathError::NotADict {
                    path: self.raw.clone(),
                    segment: segment.name.clone(),
                    found: other.kind(),
                }),
            };

            current = dict.get(&*segment.name).ok_or_else(|| PathError::MissingKey {
                path: self.raw.clone(),
                segment: segment.name.clone(),
            })?;

            for &index in &segment.indices {
                let array = match current {
                    Value::Array(array) => array,
                    other => return Err(PathError::NotASequence {
                        path: self.raw.clone(),
                        segment: segment.name.clone(),
                        found: other.kind(),
                    }),
                };

                current = array.get(index).ok_or_else(|| PathError::OutOfBounds {
                    path: self.raw.clone(),
                    segment: segment.name.clone(),
                    index,
                    len: array.len(),
                })?;
            }
        }

        Ok(current)
    }
}

/// Parses `path` and resolves it against `root` in one step.
pub fn resolve<'v>(path: &str, root: &'v Value) -> Result<&'v Value, PathError> {
    Path::parse(path)?.resolve(root)
}

impl PathError {
    /// The full path expression that failed.
    pub fn path(&self) -> &str {
        match self {
            PathError::Syntax { path, .. }
            | PathError::Undefined { path, .. }
            | PathError::MissingKey { path, .. }
            | PathError::NotADict { path, .. }
            | PathError::NotASequence { path, .. }
            | PathError::OutOfBounds { path, .. } => path,
        }
    }

    /// The segment at which resolution failed, if resolution got that far.
    pub fn segment(&self) -> Option<&str> {
        match self {
            PathError::Syntax { .. } => None,
            PathError::Undefined { segment, .. }
            | PathError::MissingKey { segment, .. }
            | PathError::NotADict { segment, .. }
            | PathError::NotASequence { segment, .. }
            | PathError::OutOfBounds { segment, .. } => Some(segment),
        }
    }
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Syntax { path, reason } => {
                write!(f, "invalid path `{path}`: {reason}")
            }
            PathError::Undefined { path, segment } => {
                write!(f, "cannot resolve `{path}`: value is null before `{segment}`")
            }
            PathError::MissingKey { path, segment } => {
                write!(f, "cannot resolve `{path}`: key `{segment}` not found")
            }
            PathError::NotADict { path, segment, found } => {
                write!(f, "cannot resolve `{path}`: looked up `{segment}` in a {found}")
            }
            PathError::NotASequence { path, segment, found } => {
                write!(f, "cannot resolve `{path}`: `{segment}` is a {found}, not an array")
            }
            PathError::OutOfBounds { path, segment, index, len } => {
                write!(f, "cannot resolve `{path}`: index {index} out of bounds for \
                    `{segment}` of length {len}")
            }
        }
    }
}

impl std::error::Error for PathError { }

impl_error_detail_with_std_error!(PathError);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;

    fn fixture() -> Value {
        serde_json::from_str(r#"{
            "a": { "b": [ { "c": 1 }, { "c": 2 } ] },
            "grid": [[1, 2], [3, 4]],
            "title": "Blog",
            "none": null
        }"#).unwrap()
    }

    #[test]
    fn resolves_nested_and_indexed_paths() {
        let root = fixture();
        assert_eq!(resolve("a.b[1].c", &root), Ok(&Value::from(2u8)));
        assert_eq!(resolve("grid[1][0]", &root), Ok(&Value::from(3u8)));
        assert_eq!(resolve("title", &root).map(|v| v.to_string()), Ok("Blog".to_string()));
        assert_eq!(resolve("none", &root), Ok(&Value::Null));
        assert!(resolve("a.b", &root).unwrap().as_slice().is_some());
    }

    #[test]
    fn missing_key_names_segment_and_path() {
        let error = resolve("a.x", &fixture()).unwrap_err();
        assert!(matches!(&error, PathError::MissingKey { segment, .. } if &**segment == "x"));
        assert_eq!(error.path(), "a.x");
        assert!(error.to_string().contains("`x`"));
        assert!(error.to_string().contains("`a.x`"));
    }

    #[test]
    fn null_before_end_is_undefined() {
        let error = resolve("none.deeper", &fixture()).unwrap_err();
        assert!(matches!(error, PathError::Undefined { .. }));
        assert_eq!(error.segment(), Some("deeper"));
    }

    #[test]
    fn indexing_failures_name_the_segment() {
        let root = fixture();

        let error = resolve("title[0]", &root).unwrap_err();
        assert!(matches!(error, PathError::NotASequence { found: "string", .. }));
        assert_eq!(error.segment(), Some("title"));

        let error = resolve("a.b[2]", &root).unwrap_err();
        assert!(matches!(error, PathError::OutOfBounds { index: 2, len: 2, .. }));
        assert_eq!(error.segment(), Some("b"));

        let error = resolve("missing[0]", &root).unwrap_err();
        assert!(matches!(error, PathError::MissingKey { .. }));
        assert_eq!(error.segment(), Some("missing"));
    }

    #[test]
    fn descending_into_scalars_fails() {
        let error = resolve("title.length", &fixture()).unwrap_err();
        assert!(matches!(error, PathError::NotADict { found: "string", .. }));
    }

    #[test]
    fn syntax_errors() {
        for bad in ["", ".a", "a.", "a[", "a[]", "a[-1]", "a[1]b", "a]"] {
            let error = Path::parse(bad).unwrap_err();
            assert!(matches!(error, PathError::Syntax { .. }), "{bad:?} parsed");
            assert_eq!(error.segment(), None);
        }
    }

    #[test]
    fn keys_with_spaces_are_literal() {
        let root = value!["two words" => "ok"];
        assert_eq!(resolve("two words", &root).unwrap().to_string(), "ok");
    }
}
