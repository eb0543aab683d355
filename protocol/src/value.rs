//! # Contract Values
//!
//! Contract arguments and return values travel in a tagged, self-describing
//! encoding. Every value carries its type, so the remote contract can check
//! that argument `n` is really a `u32` and a client can decode a return
//! value without knowing its shape in advance.
//!
//! ```text
//! ScValue (tagged)  --FromScValue-->  native Rust value
//!        ^                                   |
//!        +-------- ScValue::from(..) --------+
//! ```
//!
//! 128-bit integers are carried as `hi: i64` / `lo: u64` halves because not
//! every consumer of the wire format has native 128-bit arithmetic.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;

// ---------------------------------------------------------------------------
// Type tags
// ---------------------------------------------------------------------------

/// The type tag of a contract value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Void,
    Bool,
    U32,
    I32,
    U64,
    I64,
    U128,
    I128,
    String,
    Symbol,
    Address,
    Vec,
    Map,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::U128 => "u128",
            Self::I128 => "i128",
            Self::String => "string",
            Self::Symbol => "symbol",
            Self::Address => "address",
            Self::Vec => "vec",
            Self::Map => "map",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// High and low halves of a signed 128-bit integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Int128Parts {
    pub hi: i64,
    pub lo: u64,
}

/// High and low halves of an unsigned 128-bit integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UInt128Parts {
    pub hi: u64,
    pub lo: u64,
}

/// A tagged contract value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScValue {
    Void,
    Bool(bool),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    U128(UInt128Parts),
    I128(Int128Parts),
    String(String),
    Symbol(String),
    Address(Address),
    Vec(Vec<ScValue>),
    /// Ordered key/value pairs. Contract records are maps keyed by symbols.
    Map(Vec<(ScValue, ScValue)>),
}

impl ScValue {
    /// Encodes a signed 128-bit integer by splitting it into halves.
    pub fn i128(value: i128) -> Self {
        Self::I128(Int128Parts {
            hi: (value >> 64) as i64,
            lo: value as u64,
        })
    }

    /// Encodes an unsigned 128-bit integer by splitting it into halves.
    pub fn u128(value: u128) -> Self {
        Self::U128(UInt128Parts {
            hi: (value >> 64) as u64,
            lo: value as u64,
        })
    }

    /// Builds a record value from `(field, value)` pairs.
    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, ScValue)>,
        K: Into<String>,
    {
        Self::Map(
            fields
                .into_iter()
                .map(|(k, v)| (Self::Symbol(k.into()), v))
                .collect(),
        )
    }

    /// The value's type tag.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Void => ValueType::Void,
            Self::Bool(_) => ValueType::Bool,
            Self::U32(_) => ValueType::U32,
            Self::I32(_) => ValueType::I32,
            Self::U64(_) => ValueType::U64,
            Self::I64(_) => ValueType::I64,
            Self::U128(_) => ValueType::U128,
            Self::I128(_) => ValueType::I128,
            Self::String(_) => ValueType::String,
            Self::Symbol(_) => ValueType::Symbol,
            Self::Address(_) => ValueType::Address,
            Self::Vec(_) => ValueType::Vec,
            Self::Map(_) => ValueType::Map,
        }
    }

    /// Recombines the halves of an `I128` value.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::I128(parts) => Some((i128::from(parts.hi) << 64) | i128::from(parts.lo)),
            _ => None,
        }
    }

    /// Recombines the halves of a `U128` value.
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            Self::U128(parts) => Some((u128::from(parts.hi) << 64) | u128::from(parts.lo)),
            _ => None,
        }
    }

    /// Decodes into a native value.
    pub fn decode<T: FromScValue>(&self) -> Result<T, ValueError> {
        T::from_sc_value(self)
    }
}

impl From<u32> for ScValue {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<i32> for ScValue {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<u64> for ScValue {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<i64> for ScValue {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<i128> for ScValue {
    fn from(v: i128) -> Self {
        Self::i128(v)
    }
}

impl From<bool> for ScValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ScValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for ScValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Address> for ScValue {
    fn from(v: Address) -> Self {
        Self::Address(v)
    }
}

impl From<&Address> for ScValue {
    fn from(v: &Address) -> Self {
        Self::Address(v.clone())
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Errors produced while decoding a contract value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The value's tag is not the one the caller expected.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: ValueType,
        found: ValueType,
    },

    /// A record is missing a field.
    #[error("record has no field `{0}`")]
    MissingField(String),

    /// A field decoded to the wrong type.
    #[error("field `{field}`: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<ValueError>,
    },

    /// The integer does not fit in the requested native type.
    #[error("integer out of range for {0}")]
    OutOfRange(&'static str),
}

/// Conversion from a tagged value into a native Rust value.
pub trait FromScValue: Sized {
    fn from_sc_value(value: &ScValue) -> Result<Self, ValueError>;
}

fn mismatch(expected: ValueType, value: &ScValue) -> ValueError {
    ValueError::TypeMismatch {
        expected,
        found: value.value_type(),
    }
}

impl FromScValue for ScValue {
    fn from_sc_value(value: &ScValue) -> Result<Self, ValueError> {
        Ok(value.clone())
    }
}

impl FromScValue for bool {
    fn from_sc_value(value: &ScValue) -> Result<Self, ValueError> {
        match value {
            ScValue::Bool(b) => Ok(*b),
            other => Err(mismatch(ValueType::Bool, other)),
        }
    }
}

impl FromScValue for u32 {
    fn from_sc_value(value: &ScValue) -> Result<Self, ValueError> {
        match value {
            ScValue::U32(v) => Ok(*v),
            other => Err(mismatch(ValueType::U32, other)),
        }
    }
}

impl FromScValue for u64 {
    fn from_sc_value(value: &ScValue) -> Result<Self, ValueError> {
        match value {
            ScValue::U64(v) => Ok(*v),
            ScValue::U32(v) => Ok(u64::from(*v)),
            other => Err(mismatch(ValueType::U64, other)),
        }
    }
}

impl FromScValue for i128 {
    fn from_sc_value(value: &ScValue) -> Result<Self, ValueError> {
        match value {
            ScValue::I128(_) => Ok(value.as_i128().unwrap_or_default()),
            ScValue::I64(v) => Ok(i128::from(*v)),
            ScValue::U64(v) => Ok(i128::from(*v)),
            ScValue::U128(_) => {
                let wide = value.as_u128().unwrap_or_default();
                i128::try_from(wide).map_err(|_| ValueError::OutOfRange("i128"))
            }
            other => Err(mismatch(ValueType::I128, other)),
        }
    }
}

impl FromScValue for String {
    fn from_sc_value(value: &ScValue) -> Result<Self, ValueError> {
        match value {
            ScValue::String(s) | ScValue::Symbol(s) => Ok(s.clone()),
            other => Err(mismatch(ValueType::String, other)),
        }
    }
}

impl FromScValue for Address {
    fn from_sc_value(value: &ScValue) -> Result<Self, ValueError> {
        match value {
            ScValue::Address(a) => Ok(a.clone()),
            other => Err(mismatch(ValueType::Address, other)),
        }
    }
}

impl<T: FromScValue> FromScValue for Vec<T> {
    fn from_sc_value(value: &ScValue) -> Result<Self, ValueError> {
        match value {
            ScValue::Vec(items) => items.iter().map(T::from_sc_value).collect(),
            other => Err(mismatch(ValueType::Vec, other)),
        }
    }
}

impl<T: FromScValue> FromScValue for Option<T> {
    fn from_sc_value(value: &ScValue) -> Result<Self, ValueError> {
        match value {
            ScValue::Void => Ok(None),
            other => T::from_sc_value(other).map(Some),
        }
    }
}

/// Read-only view over a record (a map keyed by symbols).
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    entries: &'a [(ScValue, ScValue)],
}

impl<'a> Record<'a> {
    /// Views a value as a record. Fails unless it is a map.
    pub fn new(value: &'a ScValue) -> Result<Self, ValueError> {
        match value {
            ScValue::Map(entries) => Ok(Self { entries }),
            other => Err(mismatch(ValueType::Map, other)),
        }
    }

    /// Raw value of a field, if present.
    pub fn get(&self, name: &str) -> Option<&'a ScValue> {
        self.entries.iter().find_map(|(k, v)| match k {
            ScValue::Symbol(key) | ScValue::String(key) if key == name => Some(v),
            _ => None,
        })
    }

    /// Decodes a required field.
    pub fn field<T: FromScValue>(&self, name: &str) -> Result<T, ValueError> {
        let raw = self
            .get(name)
            .ok_or_else(|| ValueError::MissingField(name.to_string()))?;
        T::from_sc_value(raw).map_err(|e| ValueError::Field {
            field: name.to_string(),
            source: Box::new(e),
        })
    }

    /// Decodes a field that may be absent.
    pub fn optional<T: FromScValue>(&self, name: &str) -> Result<Option<T>, ValueError> {
        match self.get(name) {
            None => Ok(None),
            Some(_) => self.field(name).map(Some),
        }
    }
}

/// Renders any value as plain JSON for display and debugging.
///
/// Integers wider than 64 bits become decimal strings; records with symbol
/// keys become JSON objects.
pub fn to_native_json(value: &ScValue) -> serde_json::Value {
    use serde_json::{json, Map, Value};

    match value {
        ScValue::Void => Value::Null,
        ScValue::Bool(b) => json!(b),
        ScValue::U32(v) => json!(v),
        ScValue::I32(v) => json!(v),
        ScValue::U64(v) => json!(v),
        ScValue::I64(v) => json!(v),
        ScValue::U128(_) => json!(value.as_u128().unwrap_or_default().to_string()),
        ScValue::I128(_) => json!(value.as_i128().unwrap_or_default().to_string()),
        ScValue::String(s) | ScValue::Symbol(s) => json!(s),
        ScValue::Address(a) => json!(a.to_string()),
        ScValue::Vec(items) => Value::Array(items.iter().map(to_native_json).collect()),
        ScValue::Map(entries) => {
            let all_symbolic = entries
                .iter()
                .all(|(k, _)| matches!(k, ScValue::Symbol(_) | ScValue::String(_)));
            if all_symbolic {
                let mut object = Map::new();
                for (k, v) in entries {
                    if let ScValue::Symbol(key) | ScValue::String(key) = k {
                        object.insert(key.clone(), to_native_json(v));
                    }
                }
                Value::Object(object)
            } else {
                Value::Array(
                    entries
                        .iter()
                        .map(|(k, v)| json!([to_native_json(k), to_native_json(v)]))
                        .collect(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i128_splits_into_halves() {
        let v = ScValue::i128(25_000_000);
        assert_eq!(v, ScValue::I128(Int128Parts { hi: 0, lo: 25_000_000 }));

        let big = (7i128 << 64) + 3;
        assert_eq!(ScValue::i128(big), ScValue::I128(Int128Parts { hi: 7, lo: 3 }));
    }

    #[test]
    fn i128_halves_recombine_at_the_extremes() {
        for v in [0i128, -1, 1, i128::MAX, i128::MIN, -25_000_000, 1 << 64] {
            assert_eq!(ScValue::i128(v).as_i128(), Some(v), "value {v}");
        }
        assert_eq!(
            ScValue::i128(-1),
            ScValue::I128(Int128Parts {
                hi: -1,
                lo: u64::MAX
            })
        );
    }

    #[test]
    fn u128_halves_recombine() {
        let v = u128::MAX - 5;
        assert_eq!(ScValue::u128(v).as_u128(), Some(v));
    }

    #[test]
    fn decode_checks_the_tag() {
        assert_eq!(ScValue::U32(10).decode::<u32>().unwrap(), 10);
        assert_eq!(
            ScValue::String("x".into()).decode::<u32>(),
            Err(ValueError::TypeMismatch {
                expected: ValueType::U32,
                found: ValueType::String
            })
        );
    }

    #[test]
    fn decode_lists_and_options() {
        let ids = ScValue::Vec(vec![ScValue::U64(1), ScValue::U64(2), ScValue::U64(5)]);
        assert_eq!(ids.decode::<Vec<u64>>().unwrap(), vec![1, 2, 5]);
        assert_eq!(ScValue::Void.decode::<Option<u64>>().unwrap(), None);
        assert_eq!(ScValue::U64(4).decode::<Option<u64>>().unwrap(), Some(4));
    }

    #[test]
    fn record_fields_decode_by_name() {
        let seller = Address::Account([1u8; 32]);
        let value = ScValue::record([
            ("description", ScValue::from("Rust tutoring")),
            ("hourly_rate", ScValue::i128(25_000_000)),
            ("hours_available", ScValue::U32(10)),
            ("seller", ScValue::from(&seller)),
        ]);

        let record = Record::new(&value).unwrap();
        assert_eq!(record.field::<String>("description").unwrap(), "Rust tutoring");
        assert_eq!(record.field::<i128>("hourly_rate").unwrap(), 25_000_000);
        assert_eq!(record.field::<u32>("hours_available").unwrap(), 10);
        assert_eq!(record.field::<Address>("seller").unwrap(), seller);
        assert_eq!(record.optional::<u32>("missing").unwrap(), None);
    }

    #[test]
    fn record_errors_name_the_field() {
        let value = ScValue::record([("hours", ScValue::from("ten"))]);
        let record = Record::new(&value).unwrap();

        let err = record.field::<u32>("hours").unwrap_err();
        assert!(err.to_string().starts_with("field `hours`"));
        assert_eq!(
            record.field::<u32>("price").unwrap_err(),
            ValueError::MissingField("price".into())
        );
        assert!(Record::new(&ScValue::U32(1)).is_err());
    }

    #[test]
    fn values_survive_json_and_bincode() {
        let value = ScValue::Vec(vec![
            ScValue::i128(-42),
            ScValue::Address(Address::Contract([2u8; 32])),
            ScValue::record([("ok", ScValue::Bool(true))]),
        ]);

        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(serde_json::from_str::<ScValue>(&json).unwrap(), value);

        let bytes = bincode::serialize(&value).unwrap();
        assert_eq!(bincode::deserialize::<ScValue>(&bytes).unwrap(), value);
    }

    #[test]
    fn native_json_rendering() {
        let value = ScValue::record([
            ("id", ScValue::U64(3)),
            ("price", ScValue::i128(1 << 70)),
            ("tags", ScValue::Vec(vec![ScValue::from("a")])),
            ("none", ScValue::Void),
        ]);
        let json = to_native_json(&value);
        assert_eq!(json["id"], 3);
        assert_eq!(json["price"], (1i128 << 70).to_string());
        assert_eq!(json["tags"][0], "a");
        assert!(json["none"].is_null());
    }
}
