use std::fs;
use std::path::{Path, PathBuf};
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::{Result, Chainable};
use crate::fstree::Entry;
use crate::value::Value;

/// Something that can be read into a [`Value`].
pub trait Source: Debug {
    type Value: Into<Value> + 'static;

    fn read(self) -> Result<Self::Value>;

    fn try_read<T: TryFrom<Value> + 'static>(self) -> Result<T> where Self: Sized {
        let value: Value = self.read()?.into();
        let kind = value.kind();
        T::try_from(value).map_err(|_| error! {
            "invalid input value type",
            "expected" => std::any::type_name::<T>(),
            "actual type" => kind,
        })
    }

    fn path(&self) -> Option<&Path> {
        None
    }
}

impl Source for Value {
    type Value = Self;

    fn read(self) -> Result<Self::Value> {
        Ok(self)
    }
}

impl Source for String {
    type Value = String;

    fn read(self) -> Result<Self> {
        Ok(self)
    }
}

impl Source for &str {
    type Value = Arc<str>;

    fn read(self) -> Result<Self::Value> {
        Ok(self.into())
    }
}

impl Source for &Path {
    type Value = String;

    fn read(self) -> Result<Self::Value> {
        fs::read_to_string(self).chain(error! {
            "failed to read file",
            "file path" => self.display()
        })
    }

    fn path(&self) -> Option<&Path> {
        Some(self)
    }
}

impl Source for &PathBuf {
    type Value = String;

    fn read(self) -> Result<Self::Value> {
        self.as_path().read()
    }

    fn path(&self) -> Option<&Path> {
        Some(self)
    }
}

impl Source for &Entry {
    type Value = String;

    fn read(self) -> Result<Self::Value> {
        self.path.as_ref().read()
    }

    fn path(&self) -> Option<&Path> {
        Some(&*self.path)
    }
}
