//! Canonical message construction.
//!
//! Payloads are held as a [`PayloadValue`] tree whose objects are
//! `BTreeMap`s, so key order is fixed by construction at every depth and two
//! payloads with the same entries encode to the same bytes regardless of how
//! they were built. Arrays keep their element order.
//!
//! The canonical text is compact JSON: no whitespace, keys ascending, numbers
//! in plain decimal with no exponent and no trailing fractional zeros. A number
//! is only admitted into the tree if its wire form is that same text, so what
//! is signed and what is sent never differ.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use rust_decimal::Decimal;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use super::operation::OperationKind;
use crate::{Error, Result};

/// Object node of a payload tree.
pub type PayloadMap = BTreeMap<String, PayloadValue>;

/// A JSON-like payload tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Null,
    Bool(bool),
    Number(PayloadNumber),
    String(String),
    Array(Vec<PayloadValue>),
    Object(PayloadMap),
}

/// Numeric leaf.
///
/// Integral values are always held as integers. `Float` only carries
/// fractional values whose shortest JSON rendering has no exponent; build it
/// through [`PayloadNumber::from_f64`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayloadNumber {
    Int(i64),
    UInt(u64),
    Float(f64),
}

// 2^63 and 2^64, exactly representable as f64.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;

impl PayloadNumber {
    /// Admit a float whose canonical and wire text can be made identical.
    ///
    /// Integral values within 64 bits become integers. Fractional values are
    /// kept when serde_json renders them without an exponent. Everything else
    /// (non-finite values, integers beyond 64 bits, magnitudes small enough to
    /// need an exponent) is rejected rather than rounded.
    pub fn from_f64(f: f64) -> Result<Self> {
        if !f.is_finite() {
            return Err(Error::validation(format!("number {f} is not finite")));
        }
        if f.fract() == 0.0 {
            if (-I64_BOUND..I64_BOUND).contains(&f) {
                return Ok(PayloadNumber::Int(f as i64));
            }
            if (0.0..U64_BOUND).contains(&f) {
                return Ok(PayloadNumber::UInt(f as u64));
            }
            return Err(Error::validation(format!(
                "integer {} does not fit in 64 bits; send it as a string",
                serde_json::Value::from(f)
            )));
        }
        let text = serde_json::Value::from(f).to_string();
        if text.contains(['e', 'E']) {
            return Err(Error::validation(format!(
                "number {text} has no plain decimal wire form; send it as a string"
            )));
        }
        Ok(PayloadNumber::Float(f))
    }

    /// Admit a decimal whose value survives the trip through an f64 exactly.
    pub fn from_decimal(d: Decimal) -> Result<Self> {
        let d = d.normalize();
        if d.scale() == 0 {
            if let Ok(n) = i64::try_from(d) {
                return Ok(PayloadNumber::Int(n));
            }
            if let Ok(n) = u64::try_from(d) {
                return Ok(PayloadNumber::UInt(n));
            }
        }
        let text = d.to_string();
        let number = text
            .parse::<f64>()
            .map_err(|e| Error::validation(format!("decimal {text}: {e}")))
            .and_then(PayloadNumber::from_f64)?;
        if number.to_string() != text {
            return Err(Error::validation(format!(
                "decimal {text} is not exactly representable as a JSON number; send it as a string"
            )));
        }
        Ok(number)
    }
}

impl std::fmt::Display for PayloadNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadNumber::Int(n) => write!(f, "{n}"),
            PayloadNumber::UInt(n) => write!(f, "{n}"),
            // Same formatter serde_json uses on the wire.
            PayloadNumber::Float(x) => write!(f, "{}", serde_json::Value::from(*x)),
        }
    }
}

impl PayloadValue {
    /// Convert any serializable value into a payload tree.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Self::try_from(serde_json::to_value(value)?)
    }

    /// Convert a serializable struct into its top-level object.
    pub fn object_from<T: Serialize + ?Sized>(value: &T) -> Result<PayloadMap> {
        match Self::from_serialize(value)? {
            PayloadValue::Object(map) => Ok(map),
            other => Err(Error::validation(format!(
                "payload must be an object, got {}",
                other.type_name()
            ))),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            PayloadValue::Null => "null",
            PayloadValue::Bool(_) => "bool",
            PayloadValue::Number(_) => "number",
            PayloadValue::String(_) => "string",
            PayloadValue::Array(_) => "array",
            PayloadValue::Object(_) => "object",
        }
    }

    /// Compact canonical encoding of this value.
    pub fn to_canonical_string(&self) -> String {
        let mut out = String::new();
        write_canonical(self, &mut out);
        out
    }
}

impl TryFrom<serde_json::Value> for PayloadValue {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        Ok(match value {
            serde_json::Value::Null => PayloadValue::Null,
            serde_json::Value::Bool(b) => PayloadValue::Bool(b),
            serde_json::Value::Number(n) => PayloadValue::Number(number_from_json(&n)?),
            serde_json::Value::String(s) => PayloadValue::String(s),
            serde_json::Value::Array(items) => PayloadValue::Array(
                items
                    .into_iter()
                    .map(PayloadValue::try_from)
                    .collect::<Result<_>>()?,
            ),
            // Rebuilt as a BTreeMap whatever order the source map iterates in.
            serde_json::Value::Object(map) => PayloadValue::Object(
                map.into_iter()
                    .map(|(k, v)| Ok((k, PayloadValue::try_from(v)?)))
                    .collect::<Result<_>>()?,
            ),
        })
    }
}

fn number_from_json(n: &serde_json::Number) -> Result<PayloadNumber> {
    if let Some(i) = n.as_i64() {
        return Ok(PayloadNumber::Int(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(PayloadNumber::UInt(u));
    }
    match n.as_f64() {
        Some(f) => PayloadNumber::from_f64(f),
        None => Err(Error::validation(format!("number {n} is not representable"))),
    }
}

impl From<bool> for PayloadValue {
    fn from(b: bool) -> Self {
        PayloadValue::Bool(b)
    }
}

impl From<&str> for PayloadValue {
    fn from(s: &str) -> Self {
        PayloadValue::String(s.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(s: String) -> Self {
        PayloadValue::String(s)
    }
}

impl From<i64> for PayloadValue {
    fn from(n: i64) -> Self {
        PayloadValue::Number(PayloadNumber::Int(n))
    }
}

impl From<u64> for PayloadValue {
    fn from(n: u64) -> Self {
        PayloadValue::Number(PayloadNumber::UInt(n))
    }
}

impl TryFrom<Decimal> for PayloadValue {
    type Error = Error;

    fn try_from(d: Decimal) -> Result<Self> {
        PayloadNumber::from_decimal(d).map(PayloadValue::Number)
    }
}

impl<T: Into<PayloadValue>> From<Vec<T>> for PayloadValue {
    fn from(items: Vec<T>) -> Self {
        PayloadValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<PayloadMap> for PayloadValue {
    fn from(map: PayloadMap) -> Self {
        PayloadValue::Object(map)
    }
}

impl Serialize for PayloadValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PayloadValue::Null => serializer.serialize_unit(),
            PayloadValue::Bool(b) => serializer.serialize_bool(*b),
            PayloadValue::Number(PayloadNumber::Int(n)) => serializer.serialize_i64(*n),
            PayloadValue::Number(PayloadNumber::UInt(n)) => serializer.serialize_u64(*n),
            PayloadValue::Number(PayloadNumber::Float(f)) => serializer.serialize_f64(*f),
            PayloadValue::String(s) => serializer.serialize_str(s),
            PayloadValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            PayloadValue::Object(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    m.serialize_entry(k, v)?;
                }
                m.end()
            }
        }
    }
}

fn write_canonical(value: &PayloadValue, out: &mut String) {
    match value {
        PayloadValue::Null => out.push_str("null"),
        PayloadValue::Bool(true) => out.push_str("true"),
        PayloadValue::Bool(false) => out.push_str("false"),
        PayloadValue::Number(n) => {
            let _ = write!(out, "{n}");
        }
        PayloadValue::String(s) => write_json_string(s, out),
        PayloadValue::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        PayloadValue::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json_string(key, out);
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
    }
}

fn write_json_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Metadata bound into every signature alongside the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningHeader {
    pub kind: OperationKind,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Validity window in milliseconds.
    pub expiry_window: u64,
}

/// Build the canonical message
/// `{"data":<payload>,"expiry_window":..,"timestamp":..,"type":".."}`.
pub fn canonical_message(header: &SigningHeader, payload: &PayloadMap) -> String {
    let mut wrapper = PayloadMap::new();
    wrapper.insert("type".to_string(), header.kind.as_str().into());
    wrapper.insert("timestamp".to_string(), header.timestamp.into());
    wrapper.insert("expiry_window".to_string(), header.expiry_window.into());
    wrapper.insert("data".to_string(), PayloadValue::Object(payload.clone()));
    PayloadValue::Object(wrapper).to_canonical_string()
}
