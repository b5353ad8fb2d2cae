use std::fmt;

use crate::oid::Oid;

/// A scalar as returned by an SNMP agent.
#[derive(Debug, Clone, PartialEq)]
pub enum SnmpValue {
    Integer(i64),
    Counter32(u32),
    /// Gauge32 / Unsigned32 share one wire type.
    Unsigned32(u32),
    Counter64(u64),
    Timeticks(u32),
    OctetString(Vec<u8>),
    ObjectId(Oid),
    IpAddress([u8; 4]),
    Boolean(bool),
    Opaque(Vec<u8>),
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected} value, got {found}")]
pub struct ValueKindError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl SnmpValue {
    pub fn kind(&self) -> &'static str {
        match self {
            SnmpValue::Integer(_) => "integer",
            SnmpValue::Counter32(_) => "counter32",
            SnmpValue::Unsigned32(_) => "unsigned32",
            SnmpValue::Counter64(_) => "counter64",
            SnmpValue::Timeticks(_) => "timeticks",
            SnmpValue::OctetString(_) => "octet string",
            SnmpValue::ObjectId(_) => "object identifier",
            SnmpValue::IpAddress(_) => "ip address",
            SnmpValue::Boolean(_) => "boolean",
            SnmpValue::Opaque(_) => "opaque",
            SnmpValue::Null => "null",
        }
    }

    fn mismatch(&self, expected: &'static str) -> ValueKindError {
        ValueKindError {
            expected,
            found: self.kind(),
        }
    }

    /// Any integer-typed value. Counter64 values above `i64::MAX` are rejected.
    pub fn as_i64(&self) -> Result<i64, ValueKindError> {
        match *self {
            SnmpValue::Integer(n) => Ok(n),
            SnmpValue::Counter32(n) | SnmpValue::Unsigned32(n) | SnmpValue::Timeticks(n) => {
                Ok(i64::from(n))
            }
            SnmpValue::Counter64(n) => i64::try_from(n).map_err(|_| self.mismatch("integer")),
            _ => Err(self.mismatch("integer")),
        }
    }

    /// Any numeric value, widened to `f64`.
    pub fn as_f64(&self) -> Result<f64, ValueKindError> {
        match *self {
            SnmpValue::Integer(n) => Ok(n as f64),
            SnmpValue::Counter32(n) | SnmpValue::Unsigned32(n) | SnmpValue::Timeticks(n) => {
                Ok(f64::from(n))
            }
            SnmpValue::Counter64(n) => Ok(n as f64),
            _ => Err(self.mismatch("numeric")),
        }
    }
}

impl From<&str> for SnmpValue {
    fn from(text: &str) -> Self {
        SnmpValue::OctetString(text.as_bytes().to_vec())
    }
}

impl_value_from!(i64 => Integer, i32 => Integer, u64 => Counter64);
impl_value_from!(String => OctetString, Vec<u8> => OctetString, Oid => ObjectId);

impl fmt::Display for SnmpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnmpValue::Integer(n) => write!(f, "{}", n),
            SnmpValue::Counter32(n) | SnmpValue::Unsigned32(n) | SnmpValue::Timeticks(n) => {
                write!(f, "{}", n)
            }
            SnmpValue::Counter64(n) => write!(f, "{}", n),
            SnmpValue::OctetString(bytes) | SnmpValue::Opaque(bytes) => {
                write!(f, "{}", String::from_utf8_lossy(bytes))
            }
            SnmpValue::ObjectId(oid) => write!(f, "{}", oid),
            SnmpValue::IpAddress([a, b, c, d]) => write!(f, "{}.{}.{}.{}", a, b, c, d),
            SnmpValue::Boolean(b) => write!(f, "{}", b),
            SnmpValue::Null => f.write_str("null"),
        }
    }
}
