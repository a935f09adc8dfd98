//! Encoding of [`Value`] trees into ISON documents.

use crate::element::{serialize_elem, Element};
use crate::intern::InterningTable;
use crate::value::Value;

/// Encode a value as a complete document.
///
/// # Panics
///
/// Panics if any string is longer than `u32::MAX` bytes, which its length prefix can't hold.
pub fn encode(value: &Value, table: &InterningTable) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_into(value, table, &mut buf);
    buf
}

/// Encode a value as a complete document, appending it to `buf`.
///
/// # Panics
///
/// Panics if any string is longer than `u32::MAX` bytes, which its length prefix can't hold.
pub fn encode_into(value: &Value, table: &InterningTable, buf: &mut Vec<u8>) {
    let start = buf.len();
    serialize_elem(buf, Element::DocumentStart);
    encode_value(value, table, buf);
    serialize_elem(buf, Element::DocumentEnd);
    tracing::trace!(len = buf.len() - start, "encoded ISON document");
}

fn encode_value(value: &Value, table: &InterningTable, buf: &mut Vec<u8>) {
    match value {
        Value::Null => serialize_elem(buf, Element::Null),
        Value::Byte(v) => serialize_elem(buf, Element::Byte(*v)),
        Value::Double(v) => serialize_elem(buf, Element::Double(*v)),
        Value::String(v) => encode_str(v, table, buf),
        Value::InternedStringRef(key) => match table.get(*key) {
            Some(s) => encode_str(s, table, buf),
            None => {
                tracing::warn!(
                    key = *key,
                    "interned key isn't in the active table, writing it as-is"
                );
                serialize_elem(buf, Element::Interned(*key));
            }
        },
        Value::Array(items) => {
            serialize_elem(buf, Element::ArrayStart);
            for item in items {
                encode_value(item, table, buf);
            }
            serialize_elem(buf, Element::ArrayEnd);
        }
        Value::Object(pairs) => {
            serialize_elem(buf, Element::ObjectStart);
            for (key, item) in pairs {
                serialize_elem(buf, Element::KeyValue);
                encode_str(key, table, buf);
                encode_value(item, table, buf);
            }
            serialize_elem(buf, Element::ObjectEnd);
        }
    }
}

// Strings known to the table go out as their key, everything else as a literal.
fn encode_str(s: &str, table: &InterningTable, buf: &mut Vec<u8>) {
    match table.lookup(s) {
        Some(key) => serialize_elem(buf, Element::Interned(key)),
        None => serialize_elem(buf, Element::Str(s)),
    }
}
