use std::{fs, io};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::fmt::Debug;

use crate::error::{Result, Chainable};
use crate::value::{Value, Source};

/// Something a [`Value`] can be written to.
pub trait Sink: Debug {
    fn write<V: Into<Value> + 'static>(&self, value: V) -> Result<()> {
        self.write_value(value.into())
    }

    fn write_value(&self, value: Value) -> Result<()>;

    #[inline]
    fn write_from<S: Source>(&self, source: S) -> Result<()> {
        self.write(source.read()?)
    }
}

impl Sink for fs::File {
    fn write_value(&self, value: Value) -> Result<()> {
        if let Value::Dict(_) = value {
            return Err("file endpoint does not support dictionary writes".into());
        }

        let mut file = io::BufWriter::new(self);
        write!(file, "{value}")?;
        file.flush()?;
        Ok(())
    }
}

impl Sink for &Path {
    fn write_value(&self, value: Value) -> Result<()> {
        fs::File::create(self)
            .chain(error! {
                "failed to open/create file for writing",
                "file path" => self.display()
            })?
            .write_value(value)
    }
}

impl Sink for PathBuf {
    fn write_value(&self, value: Value) -> Result<()> {
        self.as_path().write_value(value)
    }
}

impl<T: Sink> Sink for &T {
    fn write_value(&self, value: Value) -> Result<()> {
        <T as Sink>::write_value(self, value)
    }
}
