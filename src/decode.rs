//! Decoding of ISON documents into [`Value`] trees.
//!
//! A document is a header tag, exactly one value, and a terminator tag. Parsing is a recursive
//! descent over a [`Parser`] local to each call, so independent buffers can be decoded
//! concurrently with a shared [`InterningTable`].

use crate::diagnostics::{Diagnostics, Warning};
use crate::element::{Element, Parser};
use crate::error::{Error, Result};
use crate::intern::InterningTable;
use crate::value::Value;
use crate::MAX_DEPTH;

/// A decoded document, along with any non-fatal problems hit while decoding it.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub value: Value,
    pub diagnostics: Diagnostics,
}

/// Decode a document, logging but otherwise discarding warnings. Use [`Decoder`] to inspect them
/// or to decode strictly.
pub fn decode(bytes: &[u8], table: &InterningTable) -> Result<Value> {
    Decoder::new(table).decode(bytes).map(|d| d.value)
}

/// Configurable document decoder.
#[derive(Clone, Copy, Debug)]
pub struct Decoder<'t> {
    table: &'t InterningTable,
    strict: bool,
    max_depth: usize,
}

impl<'t> Decoder<'t> {
    pub fn new(table: &'t InterningTable) -> Self {
        Self {
            table,
            strict: false,
            max_depth: MAX_DEPTH,
        }
    }

    /// In strict mode, a missing terminator fails with [`Error::TruncatedDocument`] and trailing
    /// bytes fail with [`Error::MalformedDocument`].
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Maximum number of nested objects and arrays.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Decoded> {
        tracing::trace!(len = bytes.len(), "decoding ISON document");
        let mut parser = Parser::new(bytes, self.max_depth);
        match parser.next() {
            Some(Ok(Element::DocumentStart)) => (),
            _ => {
                return Err(Error::NotAnIsonDocument {
                    found: bytes.first().copied(),
                })
            }
        }

        let mut reader = DocReader {
            parser,
            table: self.table,
            diagnostics: Diagnostics::new(),
        };
        let value = reader.read_value()?;
        let DocReader {
            mut parser,
            mut diagnostics,
            ..
        } = reader;

        // A value that parsed whole leaves every container closed
        debug_assert_eq!(parser.depth(), 0);
        let offset = parser.offset();
        match parser.next() {
            Some(Ok(Element::DocumentEnd)) => {
                let len = parser.remaining();
                if len > 0 {
                    if self.strict {
                        return Err(Error::MalformedDocument(format!(
                            "{} bytes after the terminator at offset {}",
                            len, offset
                        )));
                    }
                    diagnostics.push(Warning::TrailingBytes {
                        offset: offset + 1,
                        len,
                    });
                }
            }
            _ => {
                if self.strict {
                    return Err(Error::TruncatedDocument { offset });
                }
                diagnostics.push(Warning::MissingTerminator { offset });
            }
        }

        Ok(Decoded { value, diagnostics })
    }
}

struct DocReader<'a, 't> {
    parser: Parser<'a>,
    table: &'t InterningTable,
    diagnostics: Diagnostics,
}

impl<'a, 't> DocReader<'a, 't> {
    fn next_elem(&mut self, step: &'static str) -> Result<(usize, Element<'a>)> {
        let offset = self.parser.offset();
        let elem = self
            .parser
            .next()
            .ok_or(Error::BufferUnderrun { offset, step })??;
        Ok((offset, elem))
    }

    fn resolve(&mut self, offset: usize, key: u16) -> String {
        if !self.table.contains_key(key) {
            self.diagnostics
                .push(Warning::UnknownInternedKey { offset, key });
        }
        self.table.resolve(key).to_owned()
    }

    fn read_value(&mut self) -> Result<Value> {
        let (offset, elem) = self.next_elem("read value")?;
        self.value_from(offset, elem)
    }

    fn value_from(&mut self, offset: usize, elem: Element<'a>) -> Result<Value> {
        Ok(match elem {
            Element::Null => Value::Null,
            Element::Byte(v) => Value::Byte(v),
            Element::Double(v) => Value::Double(v),
            Element::Str(v) => Value::String(v.to_owned()),
            Element::Interned(key) => Value::String(self.resolve(offset, key)),
            Element::ArrayStart => self.read_array()?,
            Element::ObjectStart => self.read_object()?,
            Element::Unknown(tag) => {
                self.diagnostics.push(Warning::UnknownTag { offset, tag });
                Value::Null
            }
            Element::ArrayEnd
            | Element::ObjectEnd
            | Element::KeyValue
            | Element::DocumentStart
            | Element::DocumentEnd => {
                return Err(Error::MalformedDocument(format!(
                    "Expected a value at offset {}, found {} marker",
                    offset,
                    elem.name()
                )))
            }
        })
    }

    fn read_array(&mut self) -> Result<Value> {
        let mut items = Vec::new();
        loop {
            let (offset, elem) = self.next_elem("read array item")?;
            if let Element::ArrayEnd = elem {
                return Ok(Value::Array(items));
            }
            items.push(self.value_from(offset, elem)?);
        }
    }

    fn read_object(&mut self) -> Result<Value> {
        let mut pairs = Vec::new();
        loop {
            let (offset, elem) = self.next_elem("read object member")?;
            match elem {
                Element::ObjectEnd => return Ok(Value::Object(pairs)),
                Element::KeyValue => {
                    let (offset, elem) = self.next_elem("read object key")?;
                    let key = match elem {
                        Element::Str(v) => v.to_owned(),
                        Element::Interned(key) => self.resolve(offset, key),
                        elem => {
                            return Err(Error::MalformedDocument(format!(
                                "Object key at offset {} is {}, not a string",
                                offset,
                                elem.name()
                            )))
                        }
                    };
                    let value = self.read_value()?;
                    pairs.push((key, value));
                }
                // Unknown tags have no payload, so the next member is still in reach
                Element::Unknown(tag) => {
                    self.diagnostics.push(Warning::UnknownTag { offset, tag });
                }
                elem => {
                    return Err(Error::MalformedDocument(format!(
                        "Expected key-value or object end marker at offset {}, found {}",
                        offset,
                        elem.name()
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::element::serialize_elem;

    fn table() -> InterningTable {
        [(1u16, "loadouts"), (2, "slotType"), (3, "Hat")]
            .into_iter()
            .collect()
    }

    fn doc(elems: &[Element]) -> Vec<u8> {
        let mut buf = Vec::new();
        serialize_elem(&mut buf, Element::DocumentStart);
        for elem in elems {
            serialize_elem(&mut buf, elem.clone());
        }
        serialize_elem(&mut buf, Element::DocumentEnd);
        buf
    }

    #[test]
    fn object_with_interned_keys() {
        use crate::element::Element::*;
        let bytes = doc(&[
            ObjectStart,
            KeyValue,
            Interned(2),
            Interned(3),
            KeyValue,
            Str("count"),
            Byte(4),
            ObjectEnd,
        ]);
        let decoded = Decoder::new(&table()).decode(&bytes).unwrap();
        assert!(decoded.diagnostics.is_clean());
        assert_eq!(
            decoded.value,
            Value::Object(vec![
                ("slotType".into(), "Hat".into()),
                ("count".into(), Value::Byte(4)),
            ])
        );
    }

    #[test]
    fn empty_containers() {
        use crate::element::Element::*;
        let bytes = doc(&[ArrayStart, ObjectStart, ObjectEnd, ArrayStart, ArrayEnd, ArrayEnd]);
        let value = decode(&bytes, &table()).unwrap();
        assert_eq!(
            value,
            Value::Array(vec![Value::Object(vec![]), Value::Array(vec![])])
        );
    }

    #[test]
    fn bad_header() {
        let table = table();
        match decode(&[], &table) {
            Err(Error::NotAnIsonDocument { found: None }) => (),
            other => panic!("Expected header failure, got {:?}", other),
        }
        match decode(&[0x05, 0x06, 0x0e], &table) {
            Err(Error::NotAnIsonDocument { found: Some(0x05) }) => (),
            other => panic!("Expected header failure, got {:?}", other),
        }
    }

    #[test]
    fn unknown_tag_is_null() {
        use crate::element::Element::*;
        let bytes = doc(&[ArrayStart, Byte(1), Unknown(0x7f), Byte(2), ArrayEnd]);
        let decoded = Decoder::new(&table()).decode(&bytes).unwrap();
        assert_eq!(
            decoded.value,
            Value::Array(vec![Value::Byte(1), Value::Null, Value::Byte(2)])
        );
        assert_eq!(decoded.diagnostics.unknown_tags(), 1);
        assert_eq!(
            decoded.diagnostics.iter().next(),
            Some(&Warning::UnknownTag {
                offset: 4,
                tag: 0x7f
            })
        );
    }

    #[test]
    fn unknown_tag_between_members_is_skipped() {
        use crate::element::Element::*;
        let bytes = doc(&[
            ObjectStart,
            Unknown(0x7f),
            KeyValue,
            Str("a"),
            Byte(1),
            Unknown(0x80),
            ObjectEnd,
        ]);
        let decoded = Decoder::new(&table()).decode(&bytes).unwrap();
        assert_eq!(
            decoded.value,
            Value::Object(vec![("a".into(), Value::Byte(1))])
        );
        assert_eq!(decoded.diagnostics.unknown_tags(), 2);
        assert_eq!(
            decoded.diagnostics.iter().next(),
            Some(&Warning::UnknownTag {
                offset: 2,
                tag: 0x7f
            })
        );

        // A key must still be a string
        let bytes = doc(&[ObjectStart, KeyValue, Unknown(0x7f), Byte(1), ObjectEnd]);
        match decode(&bytes, &table()) {
            Err(Error::MalformedDocument(_)) => (),
            other => panic!("Expected malformed document, got {:?}", other),
        }
    }

    #[test]
    fn unknown_interned_key() {
        use crate::element::Element::*;
        let bytes = doc(&[ObjectStart, KeyValue, Interned(99), Interned(1), ObjectEnd]);
        let decoded = Decoder::new(&table()).decode(&bytes).unwrap();
        assert_eq!(
            decoded.value,
            Value::Object(vec![(crate::UNKNOWN_STRING.into(), "loadouts".into())])
        );
        assert_eq!(decoded.diagnostics.unknown_keys(), 1);
    }

    #[test]
    fn missing_terminator() {
        let mut bytes = doc(&[Element::Byte(7)]);
        bytes.pop();
        let table = table();

        let decoded = Decoder::new(&table).decode(&bytes).unwrap();
        assert_eq!(decoded.value, Value::Byte(7));
        assert!(decoded.diagnostics.missing_terminator());

        match Decoder::new(&table).strict(true).decode(&bytes) {
            Err(Error::TruncatedDocument { offset: 3 }) => (),
            other => panic!("Expected truncation, got {:?}", other),
        }

        // Some other tag where the terminator belongs
        bytes.push(0x00);
        let decoded = Decoder::new(&table).decode(&bytes).unwrap();
        assert!(decoded.diagnostics.missing_terminator());
    }

    #[test]
    fn trailing_bytes() {
        let mut bytes = doc(&[Element::Null]);
        bytes.extend_from_slice(&[0, 0]);
        let table = table();
        let decoded = Decoder::new(&table).decode(&bytes).unwrap();
        assert_eq!(
            decoded.diagnostics.into_vec(),
            vec![Warning::TrailingBytes { offset: 3, len: 2 }]
        );
        Decoder::new(&table).strict(true).decode(&bytes).unwrap_err();
    }

    #[test]
    fn underrun() {
        use crate::element::Element::*;
        let bytes = doc(&[ArrayStart, Str("abcdef"), ArrayEnd]);
        let table = table();
        for cut in 1..bytes.len() - 2 {
            match decode(&bytes[..cut], &table) {
                Err(Error::BufferUnderrun { .. }) => (),
                other => panic!("Cut at {} should underrun, got {:?}", cut, other),
            }
        }
    }

    #[test]
    fn malformed() {
        use crate::element::Element::*;
        let table = table();
        let cases: Vec<Vec<Element>> = vec![
            vec![ArrayEnd],
            vec![ObjectStart, Byte(1), ObjectEnd],
            vec![ObjectStart, KeyValue, Byte(1), Byte(2), ObjectEnd],
            vec![ObjectStart, KeyValue, Str("a"), ObjectEnd],
            vec![ArrayStart, ObjectEnd],
            vec![ArrayStart, DocumentEnd, ArrayEnd],
            vec![KeyValue, Byte(1), Byte(2)],
        ];
        for elems in cases {
            match decode(&doc(&elems), &table) {
                Err(Error::MalformedDocument(_)) => (),
                other => panic!("{:?} should be malformed, got {:?}", elems, other),
            }
        }
    }

    #[test]
    fn depth_limit() {
        let depth = 20;
        let mut elems = vec![Element::ArrayStart; depth];
        elems.extend(vec![Element::ArrayEnd; depth]);
        let bytes = doc(&elems);
        let table = table();
        Decoder::new(&table).max_depth(depth).decode(&bytes).unwrap();
        match Decoder::new(&table).max_depth(depth - 1).decode(&bytes) {
            Err(Error::MalformedDocument(_)) => (),
            other => panic!("Expected depth failure, got {:?}", other),
        }
    }

    #[test]
    fn hostile_nesting_fails_cleanly() {
        let mut bytes = vec![0x0f];
        bytes.extend(std::iter::repeat(0x07).take(1 << 20));
        match decode(&bytes, &table()) {
            Err(Error::MalformedDocument(_)) => (),
            other => panic!("Expected depth failure, got {:?}", other),
        }
    }
}
