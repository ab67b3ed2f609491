use std::path::Path;

use crate::error::{ErrorDetail, Result, Chainable};
use crate::value::Source;

/// A serialized data format.
pub trait Format: Sized {
    /// The data format's error type.
    type Error: serde::de::Error + ErrorDetail + 'static;

    /// The file extension files in this format carry.
    const EXTENSION: &'static str;

    /// Parses `string` as the data format `Self` as a `T` or returns an error
    /// if the `string` is an invalid `T`.
    fn from_str<T: serde::de::DeserializeOwned>(string: &str) -> Result<T, Self::Error>;

    fn read<I: Source, T: serde::de::DeserializeOwned>(input: I) -> Result<T> {
        let name = input.path().map(|p| p.display().to_string());
        let input = input.try_read::<String>()?;
        Self::from_str(&input).chain_with(|| error! {
            format!("invalid {} data", Self::EXTENSION),
            if name.is_some() => "file path" => name.as_deref().unwrap_or_default(),
        })
    }
}

macro_rules! impl_format {
    ($name:ident : $ext:literal, $func:expr, $E:ty) => (
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Format for $name {
            type Error = $E;

            const EXTENSION: &'static str = $ext;

            fn from_str<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, $E> {
                $func(s)
            }
        }
    );
}

impl_format!(Json: "json", serde_json::from_str, serde_json::error::Error);
impl_format!(Toml: "toml", toml::from_str, toml::de::Error);

/// Reads `path` as JSON or TOML, as decided by its extension.
pub fn read_data<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(Toml::EXTENSION) => Toml::read(path),
        Some(Json::EXTENSION) => Json::read(path),
        _ => err! {
            "unrecognized data format",
            "file path" => path.display(),
            "supported extensions" => "json, toml",
        }
    }
}
