//! Typed object model produced by the wire decoder.
//!
//! Every value inside a relay message is one [`Object`]. Scalars map to plain
//! Rust values, aggregates nest further objects. The most important aggregate
//! is [`Hdata`]: a table whose rows describe server-side entities (buffers,
//! lines, nicks) and carry the pointer chain that ties each row to its owner.
//!
//! # Invariants
//!
//! - Closed Set: `Object` is the complete set of value kinds. Consumers match
//!   exhaustively, so a new kind is a compile error at every use site rather
//!   than a silent fall-through.
//!
//! - Tree Shape: Objects own their children by value. There are no back
//!   references and no cycles.
//!
//! - Opaque Pointers: A [`Pointer`] is only ever compared for equality. Its
//!   textual form is not parsed.

use std::{collections::BTreeMap, fmt, str::FromStr};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Three-letter type tags used by the relay protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    /// Signed char (`chr`)
    Char,
    /// 32-bit integer (`int`)
    Int,
    /// 64-bit integer (`lon`)
    Long,
    /// String, possibly null (`str`)
    Str,
    /// Byte buffer, possibly null (`buf`)
    Buffer,
    /// Server-side pointer (`ptr`)
    Pointer,
    /// Unix timestamp (`tim`)
    Time,
    /// Hashtable (`htb`)
    Hashtable,
    /// Hdata table (`hda`)
    Hdata,
    /// Array (`arr`)
    Array,
}

impl ObjectType {
    /// Wire tag for this type.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Char => "chr",
            Self::Int => "int",
            Self::Long => "lon",
            Self::Str => "str",
            Self::Buffer => "buf",
            Self::Pointer => "ptr",
            Self::Time => "tim",
            Self::Hashtable => "htb",
            Self::Hdata => "hda",
            Self::Array => "arr",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ObjectType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "chr" => Self::Char,
            "int" => Self::Int,
            "lon" => Self::Long,
            "str" => Self::Str,
            "buf" => Self::Buffer,
            "ptr" => Self::Pointer,
            "tim" => Self::Time,
            "htb" => Self::Hashtable,
            "hda" => Self::Hdata,
            "arr" => Self::Array,
            other => return Err(ProtocolError::UnknownType(other.to_string())),
        })
    }
}

/// Opaque server-assigned identifier.
///
/// Names a buffer, line or nick for the lifetime of that object on the
/// server. Only equality is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pointer(String);

impl Pointer {
    /// Wrap a pointer as transmitted by the server.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Pointer text as transmitted.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Server sends `0x0` (or an empty pointer) for NULL.
    pub fn is_null(&self) -> bool {
        matches!(self.0.as_str(), "" | "0" | "0x0")
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Pointer {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Pointer {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// A decoded protocol value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Object {
    /// Signed char. Boolean hdata fields arrive as chars.
    Char(i8),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// String. `None` is the protocol's NULL string.
    Str(Option<String>),
    /// Raw bytes. `None` is the protocol's NULL buffer.
    Buffer(Option<Bytes>),
    /// Server-side pointer.
    Pointer(Pointer),
    /// Unix timestamp in seconds.
    Time(i64),
    /// Ordered key/value mapping.
    Hashtable(Hashtable),
    /// Typed table of rows.
    Hdata(Hdata),
    /// Homogeneous sequence.
    Array(Array),
}

impl Object {
    /// Type tag of this value.
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Char(_) => ObjectType::Char,
            Self::Int(_) => ObjectType::Int,
            Self::Long(_) => ObjectType::Long,
            Self::Str(_) => ObjectType::Str,
            Self::Buffer(_) => ObjectType::Buffer,
            Self::Pointer(_) => ObjectType::Pointer,
            Self::Time(_) => ObjectType::Time,
            Self::Hashtable(_) => ObjectType::Hashtable,
            Self::Hdata(_) => ObjectType::Hdata,
            Self::Array(_) => ObjectType::Array,
        }
    }

    /// Convenience constructor for a non-null string.
    pub fn string(value: impl Into<String>) -> Self {
        Self::Str(Some(value.into()))
    }

    /// Text content. A NULL string reads as empty.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value.as_deref().unwrap_or("")),
            _ => None,
        }
    }

    /// Integral value of any numeric scalar.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Char(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) | Self::Time(v) => Some(*v),
            _ => None,
        }
    }

    /// Truth value of a char or integer flag (non-zero is true).
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Char(v) => Some(*v != 0),
            Self::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Pointer value.
    pub fn as_pointer(&self) -> Option<&Pointer> {
        match self {
            Self::Pointer(p) => Some(p),
            _ => None,
        }
    }

    /// Hdata table.
    pub fn as_hdata(&self) -> Option<&Hdata> {
        match self {
            Self::Hdata(h) => Some(h),
            _ => None,
        }
    }
}

/// Ordered mapping of objects to objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hashtable {
    /// Type of every key.
    pub key_type: ObjectType,
    /// Type of every value.
    pub value_type: ObjectType,
    /// Entries in wire order.
    pub entries: Vec<(Object, Object)>,
}

/// Sequence of objects sharing one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Array {
    /// Type of every element.
    pub item_type: ObjectType,
    /// Elements in wire order.
    pub values: Vec<Object>,
}

/// Typed table spanning a path of server-side types.
///
/// `path` names the hierarchy the request walked (for example
/// `buffer/lines/line/line_data`), `keys` is the row schema, and `items` are
/// the rows in server order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hdata {
    /// Type names from the root object down to the described object.
    pub path: Vec<String>,
    /// Row schema as (field name, field type) pairs.
    pub keys: Vec<(String, ObjectType)>,
    /// Rows in server order.
    pub items: Vec<HdataItem>,
}

impl Hdata {
    /// Create an empty table for the given path (e.g. `"buffer/lines"`).
    pub fn new(path: &str) -> Self {
        Self { path: path.split('/').map(str::to_string).collect(), ..Self::default() }
    }

    /// Last element of the path: the kind of entity each row describes.
    pub fn path_tail(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }
}

/// One hdata row.
///
/// # Invariants
///
/// - Ancestry: `ancestry` holds one pointer per element of the table path.
///   Element 0 is the pointer of the object the request started from, which
///   for line and nick rows is the owning buffer and for buffer rows is the
///   buffer itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HdataItem {
    /// Pointer chain for this row.
    pub ancestry: Vec<Pointer>,
    /// Field values keyed by name.
    pub fields: BTreeMap<String, Object>,
}

impl HdataItem {
    /// Create a row with the given ancestry chain and no fields.
    pub fn new(ancestry: impl IntoIterator<Item = Pointer>) -> Self {
        Self { ancestry: ancestry.into_iter().collect(), fields: BTreeMap::new() }
    }

    /// Builder-style field insertion.
    #[must_use]
    pub fn with(mut self, name: &str, value: Object) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// Routing pointer: element 0 of the ancestry chain.
    pub fn owner(&self) -> Result<&Pointer> {
        self.ancestry.first().ok_or(ProtocolError::MissingAncestry)
    }

    /// Raw field value.
    pub fn field(&self, name: &str) -> Result<&Object> {
        self.fields
            .get(name)
            .ok_or_else(|| ProtocolError::MissingField { field: name.to_string() })
    }

    /// String field. NULL reads as empty.
    pub fn text(&self, name: &str) -> Result<&str> {
        let value = self.field(name)?;
        value.as_text().ok_or_else(|| type_error(name, "str", value))
    }

    /// String field that may be absent from the schema.
    pub fn optional_text(&self, name: &str) -> Result<Option<&str>> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(value) => value.as_text().map(Some).ok_or_else(|| type_error(name, "str", value)),
        }
    }

    /// Numeric field (chr, int, lon or tim).
    pub fn integer(&self, name: &str) -> Result<i64> {
        let value = self.field(name)?;
        value.as_integer().ok_or_else(|| type_error(name, "chr|int|lon|tim", value))
    }

    /// Boolean flag field (chr or int).
    pub fn flag(&self, name: &str) -> Result<bool> {
        let value = self.field(name)?;
        value.as_bool().ok_or_else(|| type_error(name, "chr|int", value))
    }
}

fn type_error(field: &str, expected: &'static str, value: &Object) -> ProtocolError {
    ProtocolError::FieldType { field: field.to_string(), expected, actual: value.object_type() }
}
