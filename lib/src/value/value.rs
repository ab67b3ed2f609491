use std::fmt;
use std::sync::Arc;
use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

pub type Dict<K = Arc<str>, V = Value> = BTreeMap<K, V>;

/// Represents any valid value: anything a JSON (or TOML) document can hold.
///
/// Containers are reference counted, so cloning a value, or a context built
/// out of values, is cheap regardless of its depth.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Num(Num),
    String(Arc<str>),
    Array(Arc<Vec<Value>>),
    Dict(Arc<Dict>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None
        }
    }

    pub fn to_num(&self) -> Option<Num> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None
        }
    }

    pub fn into_str(self) -> Result<Arc<str>, Value> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None
        }
    }

    pub fn into_vec(self) -> Result<Arc<Vec<Value>>, Value> {
        match self {
            Value::Array(v) => Ok(v),
            _ => Err(self)
        }
    }

    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v.as_slice()),
            _ => None
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(v) => Some(&**v),
            _ => None
        }
    }

    pub fn into_dict(self) -> Result<Arc<Dict>, Value> {
        match self {
            Value::Dict(v) => Ok(v),
            _ => Err(self)
        }
    }

    /// Looks up `key` if `self` is a dictionary.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_dict()?.get(key)
    }

    /// Returns a dictionary with every entry of `self` plus `key => value`,
    /// replacing any existing `key`. A non-dictionary `self` is treated as an
    /// empty dictionary.
    ///
    /// ```rust
    /// use pressroom::value;
    ///
    /// let outer = value!["title" => "Blog", "item" => 1u8];
    /// let inner = outer.with("item", "post".into());
    /// assert_eq!(inner.get("title"), outer.get("title"));
    /// assert_eq!(inner.get("item").and_then(|v| v.as_str()), Some("post"));
    /// ```
    pub fn with(&self, key: &str, value: Value) -> Value {
        let mut dict = self.as_dict().cloned().unwrap_or_default();
        dict.insert(key.into(), value);
        Value::Dict(Arc::new(dict))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
        }
    }
}

/// The textual form substituted into templates: strings verbatim, numbers in
/// decimal, `null` as nothing, arrays as their comma-joined elements, and
/// dictionaries as compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => b.fmt(f),
            Value::Num(n) => n.fmt(f),
            Value::String(s) => f.write_str(s),
            Value::Array(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }

                    value.fmt(f)?;
                }

                Ok(())
            }
            Value::Dict(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

macro_rules! impl_from_primitive {
    ($($T:ty),+ => $E:ident::$kind:ident) => {
        $(
            impl From<$T> for $E {
                fn from(value: $T) -> Self {
                    $E::$kind(value.into())
                }
            }
        )+
    };
}

impl_from_primitive!(bool => Value::Bool);
impl_from_primitive!(&str => Value::String);
impl_from_primitive!(std::borrow::Cow<'_, str> => Value::String);
impl_from_primitive!(String => Value::String);
impl_from_primitive!(Arc<str> => Value::String);
impl_from_primitive!(Arc<Vec<Value>> => Value::Array);
impl_from_primitive!(Arc<Dict> => Value::Dict);
impl_from_primitive!(u8, u16, u32, u64, u128, usize => Value::Num);
impl_from_primitive!(i8, i16, i32, i64, i128, isize => Value::Num);
impl_from_primitive!(f64 => Value::Num);

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T> From<Option<T>> for Value where Value: From<T> {
    fn from(value: Option<T>) -> Self {
        value.map(Value::from).unwrap_or(Value::Null)
    }
}

impl<T> From<Vec<T>> for Value where Value: From<T> {
    fn from(value: Vec<T>) -> Self {
        value.into_iter()
            .map(Value::from)
            .collect()
    }
}

impl<K, V> From<Dict<K, V>> for Value where Arc<str>: From<K>, Value: From<V> {
    fn from(value: Dict<K, V>) -> Self {
        let dict = value.into_iter()
            .map(|(k, v)| (<Arc<str>>::from(k), Value::from(v)))
            .collect::<Dict>();

        Value::Dict(Arc::new(dict))
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        let vec = iter.into_iter().collect::<Vec<Value>>();
        Value::Array(Arc::new(vec))
    }
}

/// A signed, unsigned, or floating point numeric value.
///
/// Deserialization picks the narrowest integer variant that fits and falls
/// back to [`Num::F64`] for anything with a fractional part.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Num {
    /// An 8-bit unsigned integer.
    U8(u8),
    /// A 16-bit unsigned integer.
    U16(u16),
    /// A 32-bit unsigned integer.
    U32(u32),
    /// A 64-bit unsigned integer.
    U64(u64),
    /// A 128-bit unsigned integer.
    U128(u128),
    /// An unsigned integer of platform width.
    USize(usize),
    /// An 8-bit signed integer.
    I8(i8),
    /// A 16-bit signed integer.
    I16(i16),
    /// A 32-bit signed integer.
    I32(i32),
    /// A 64-bit signed integer.
    I64(i64),
    /// A 128-bit signed integer.
    I128(i128),
    /// A signed integer of platform width.
    ISize(isize),
    /// A 64-bit float.
    F64(f64),
}

impl Num {
    /// Converts `self` into a `u128` if it's a non-negative integer, an `i128`
    /// if it's a negative integer, or `None` if it's a float.
    pub fn to_int(self) -> Option<Result<u128, i128>> {
        Some(match self {
            Num::U8(v) => Ok(v as u128),
            Num::U16(v) => Ok(v as u128),
            Num::U32(v) => Ok(v as u128),
            Num::U64(v) => Ok(v as u128),
            Num::U128(v) => Ok(v),
            Num::USize(v) => Ok(v as u128),
            Num::I8(v) => int(v as i128),
            Num::I16(v) => int(v as i128),
            Num::I32(v) => int(v as i128),
            Num::I64(v) => int(v as i128),
            Num::I128(v) => int(v),
            Num::ISize(v) => int(v as i128),
            Num::F64(_) => return None,
        })
    }

    /// Converts `self` into an `f64`, possibly losing precision.
    pub fn to_f64(self) -> f64 {
        match self.to_int() {
            Some(Ok(v)) => v as f64,
            Some(Err(v)) => v as f64,
            None => match self {
                Num::F64(v) => v,
                _ => unreachable!("only floats lack an integer form"),
            }
        }
    }
}

#[inline(always)]
fn int(v: i128) -> Result<u128, i128> {
    if v >= 0 { Ok(v as u128) } else { Err(v) }
}

impl PartialEq for Num {
    fn eq(&self, other: &Self) -> bool {
        match (self.to_int(), other.to_int()) {
            (Some(a), Some(b)) => a == b,
            _ => self.to_f64() == other.to_f64(),
        }
    }
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.to_int(), self) {
            (Some(Ok(v)), _) => v.fmt(f),
            (Some(Err(v)), _) => v.fmt(f),
            (None, Num::F64(v)) => v.fmt(f),
            (None, _) => unreachable!("only floats lack an integer form"),
        }
    }
}

macro_rules! impl_from_for_num_value {
    ($($T:ty: $V:ident),* $(,)?) => ($(
        impl From<$T> for Num {
            fn from(value: $T) -> Num {
                Num::$V(value)
            }
        }
    )*)
}

impl_from_for_num_value! {
    u8: U8, u16: U16, u32: U32, u64: U64, u128: U128, usize: USize,
    i8: I8, i16: I16, i32: I32, i64: I64, i128: I128, isize: ISize,
    f64: F64,
}

macro_rules! impl_try_from_value {
    ($($T:ty),+ => | $v:ident | $e:expr) => {
        $(
            impl TryFrom<$crate::value::Value> for $T {
                type Error = Value;

                fn try_from($v: $crate::value::Value) -> Result<Self, Self::Error> {
                    (|| $e)()
                }
            }
        )+
    };
}

impl_try_from_value!(bool => |v| v.to_bool().ok_or(v));
impl_try_from_value!(Arc<str> => |v| v.into_str());
impl_try_from_value!(String => |v| v.into_str().map(|s| s.to_string()));
impl_try_from_value!(Arc<Dict> => |v| v.into_dict());
impl_try_from_value!(Arc<Vec<Value>> => |v| v.into_vec());
impl_try_from_value!(Num => |v| v.to_num().ok_or(v));
