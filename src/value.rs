use serde::Serialize;
use std::borrow::Cow;
use std::convert::TryFrom;
use std::fmt;
use std::ops::Index;

/// A decoded ISON tree.
///
/// Objects are kept as ordered key/value pairs. Keys are not required to be unique, and
/// duplicates survive a decode/encode cycle untouched.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Byte(u8),
    Double(f64),
    String(String),
    /// A key into an [`InterningTable`][crate::InterningTable]. The decoder never produces this;
    /// it resolves interned strings to [`Value::String`].
    InternedStringRef(u16),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
}

/// Clamp an integer into a [`Value::Byte`] payload. Anything outside of 0-255 becomes 0.
pub fn clamp_byte(v: i64) -> u8 {
    u8::try_from(v).unwrap_or(0)
}

impl Value {
    /// Build a value from a number: non-integral values are kept as [`Value::Double`], integral
    /// ones become a clamped [`Value::Byte`].
    pub fn number(v: f64) -> Value {
        if v.is_finite() && v.fract() == 0.0 {
            if v >= 0.0 && v <= u8::MAX as f64 {
                Value::Byte(v as u8)
            } else {
                Value::Byte(0)
            }
        } else {
            Value::Double(v)
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_byte(&self) -> bool {
        matches!(self, Value::Byte(_))
    }

    pub fn is_double(&self) -> bool {
        matches!(self, Value::Double(_))
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_interned(&self) -> bool {
        matches!(self, Value::InternedStringRef(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_byte(&self) -> Option<u8> {
        if let Value::Byte(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    /// Bytes double as booleans: 0 is false, 1 is true. Other values aren't booleans.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Byte(0) => Some(false),
            Value::Byte(1) => Some(true),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Double(v) => Some(v),
            Value::Byte(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::String(ref v) = *self {
            Some(v.as_str())
        } else {
            None
        }
    }

    pub fn as_interned(&self) -> Option<u16> {
        if let Value::InternedStringRef(v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        if let Value::Array(ref v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        if let Value::Array(ref mut v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_object(&self) -> Option<&Vec<(String, Value)>> {
        if let Value::Object(ref v) = *self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Vec<(String, Value)>> {
        if let Value::Object(ref mut v) = *self {
            Some(v)
        } else {
            None
        }
    }

    /// Get the value of the first pair with the given key, if this is an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Get the value of the first pair with the given key, if this is an object.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.as_object_mut()?
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Iterate over every value stored under the given key, in document order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.as_object()
            .into_iter()
            .flatten()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Append a pair to an object. Does nothing if this isn't an object.
    pub fn push_pair<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) {
        if let Value::Object(ref mut pairs) = *self {
            pairs.push((key.into(), value.into()));
        }
    }

    /// Number of nested values beneath this one, including itself.
    pub fn node_count(&self) -> usize {
        match self {
            Value::Array(v) => 1 + v.iter().map(Value::node_count).sum::<usize>(),
            Value::Object(v) => 1 + v.iter().map(|(_, v)| v.node_count()).sum::<usize>(),
            _ => 1,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{:?}", v),
            Value::String(v) => write!(f, "{:?}", v),
            Value::InternedStringRef(v) => write!(f, "#{}", v),
            Value::Array(v) => {
                f.write_str("[")?;
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Object(v) => {
                f.write_str("{")?;
                for (i, (key, item)) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {}", key, item)?;
                }
                f.write_str("}")
            }
        }
    }
}

static NULL: Value = Value::Null;

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        self.as_array().and_then(|v| v.get(index)).unwrap_or(&NULL)
    }
}

impl Index<&str> for Value {
    type Output = Value;

    fn index(&self, index: &str) -> &Self::Output {
        self.get(index).unwrap_or(&NULL)
    }
}

macro_rules! impl_value_from_integer {
    ($t: ty) => {
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Byte(clamp_byte(v as i64))
            }
        }
    };
}

impl_value_from_integer!(u16);
impl_value_from_integer!(u32);
impl_value_from_integer!(i8);
impl_value_from_integer!(i16);
impl_value_from_integer!(i32);
impl_value_from_integer!(i64);

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Byte(u8::try_from(v).unwrap_or(0))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Byte(u8::try_from(v).unwrap_or(0))
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Byte(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Byte(v as u8)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Double(v as f64)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<'a> From<&'a str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<'a> From<Cow<'a, str>> for Value {
    fn from(v: Cow<'a, str>) -> Self {
        Value::String(v.into_owned())
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(v: Option<V>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Vec<(String, Value)>> for Value {
    fn from(v: Vec<(String, Value)>) -> Self {
        Value::Object(v)
    }
}

impl<V: Into<Value>> std::iter::FromIterator<V> for Value {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        let v: Vec<Value> = iter.into_iter().map(Into::into).collect();
        Value::Array(v)
    }
}

macro_rules! impl_try_from_value {
    ($t: ty, $p: ident) => {
        impl TryFrom<Value> for $t {
            type Error = Value;
            fn try_from(v: Value) -> Result<Self, Self::Error> {
                match v {
                    Value::$p(v) => Ok(v),
                    _ => Err(v),
                }
            }
        }
    };
}

impl_try_from_value!(u8, Byte);
impl_try_from_value!(f64, Double);
impl_try_from_value!(String, String);
impl_try_from_value!(Vec<Value>, Array);
impl_try_from_value!(Vec<(String, Value)>, Object);

impl TryFrom<Value> for bool {
    type Error = Value;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        v.as_bool().ok_or(v)
    }
}

impl Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Byte(v) => serializer.serialize_u8(*v),
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::String(v) => serializer.serialize_str(v),
            Value::InternedStringRef(v) => serializer.serialize_u16(*v),
            Value::Array(v) => v.serialize(serializer),
            Value::Object(v) => {
                let mut map = serializer.serialize_map(Some(v.len()))?;
                for (key, val) in v {
                    map.serialize_entry(key, val)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> serde::Deserialize<'de> for Value {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::*;

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
                fmt.write_str("any valid ISON Value")
            }

            fn visit_bool<E: Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(Value::from(v))
            }

            fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Value::from(v))
            }

            fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Value::from(v))
            }

            fn visit_f64<E: Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(Value::number(v))
            }

            fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(Value::String(v.into()))
            }

            fn visit_string<E: Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(Value::String(v))
            }

            fn visit_unit<E: Error>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E: Error>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D: serde::Deserializer<'de>>(
                self,
                deserializer: D,
            ) -> Result<Self::Value, D::Error> {
                serde::Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                // Allocate with the size hint, but be conservative. 4096 is what serde uses
                // internally for collections, so we'll do likewise.
                let mut seq = match access.size_hint() {
                    Some(size) => Vec::with_capacity(size.min(4096)),
                    None => Vec::new(),
                };
                while let Some(elem) = access.next_element()? {
                    seq.push(elem);
                }
                Ok(Value::Array(seq))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pairs = match access.size_hint() {
                    Some(size) => Vec::with_capacity(size.min(4096)),
                    None => Vec::new(),
                };
                while let Some((key, val)) = access.next_entry::<String, Value>()? {
                    pairs.push((key, val));
                }
                Ok(Value::Object(pairs))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
