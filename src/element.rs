use crate::depth_tracking::{DepthTracker, Nest};
use crate::error::{Error, Result};
use crate::marker::Marker;

use byteorder::{LittleEndian, ReadBytesExt};

/// A single wire element. Containers are flattened into start/end elements, so a document is a
/// flat sequence of these.
#[derive(Clone, Debug, PartialEq)]
pub enum Element<'a> {
    Null,
    Byte(u8),
    Double(f64),
    Str(&'a str),
    Interned(u16),
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    KeyValue,
    DocumentStart,
    DocumentEnd,
    /// A tag byte this codec doesn't recognize. It carries no payload.
    Unknown(u8),
}

impl<'a> Element<'a> {
    pub fn name(&self) -> &'static str {
        use self::Element::*;
        match self {
            Null => "Null",
            Byte(_) => "Byte",
            Double(_) => "Double",
            Str(_) => "Str",
            Interned(_) => "Interned",
            ObjectStart => "ObjectStart",
            ObjectEnd => "ObjectEnd",
            ArrayStart => "ArrayStart",
            ArrayEnd => "ArrayEnd",
            KeyValue => "KeyValue",
            DocumentStart => "DocumentStart",
            DocumentEnd => "DocumentEnd",
            Unknown(_) => "Unknown",
        }
    }
}

/// Serialize an element onto a byte vector. Doesn't check if Object & Array structures make
/// sense, just writes elements out.
///
/// # Panics
///
/// Panics if a string is longer than `u32::MAX` bytes.
pub fn serialize_elem(buf: &mut Vec<u8>, elem: Element) {
    use self::Element::*;
    match elem {
        Null => buf.push(Marker::Null.into()),
        Byte(v) => {
            buf.push(Marker::Byte.into());
            buf.push(v);
        }
        Double(v) => {
            buf.push(Marker::Double.into());
            buf.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        Str(v) => {
            let len = v.len();
            assert!(len <= (u32::MAX as usize));
            buf.push(Marker::Str.into());
            buf.extend_from_slice(&(len as u32).to_le_bytes());
            buf.extend_from_slice(v.as_bytes());
        }
        Interned(v) => {
            buf.push(Marker::InternedStr.into());
            buf.extend_from_slice(&v.to_le_bytes());
        }
        ObjectStart => buf.push(Marker::ObjectStart.into()),
        ObjectEnd => buf.push(Marker::ObjectEnd.into()),
        ArrayStart => buf.push(Marker::ArrayStart.into()),
        ArrayEnd => buf.push(Marker::ArrayEnd.into()),
        KeyValue => buf.push(Marker::KeyValue.into()),
        DocumentStart => buf.push(Marker::DocumentStart.into()),
        DocumentEnd => buf.push(Marker::DocumentEnd.into()),
        Unknown(v) => buf.push(v),
    }
}

/// Pulls elements off a byte slice, tracking the offset into the original buffer and the
/// nesting of objects and arrays.
#[derive(Clone, Debug)]
pub struct Parser<'a> {
    data: &'a [u8],
    total: usize,
    depth_tracking: DepthTracker,
    errored: bool,
}

impl<'a> Parser<'a> {
    pub fn new(data: &'a [u8], max_depth: usize) -> Parser<'a> {
        Self {
            data,
            total: data.len(),
            depth_tracking: DepthTracker::new(max_depth),
            errored: false,
        }
    }

    /// Offset of the next unread byte within the original buffer.
    pub fn offset(&self) -> usize {
        self.total - self.data.len()
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    pub fn depth(&self) -> usize {
        self.depth_tracking.depth()
    }

    fn underrun(&self, offset: usize, step: &'static str) -> Error {
        Error::BufferUnderrun { offset, step }
    }

    // Given a retrieved marker, try to turn it into the next element, which may move through the
    // data. This function *does not* set the errored flag. That's up to the caller.
    fn parse_element(&mut self, marker: Marker) -> Result<Element<'a>> {
        use self::Marker::*;
        let offset = self.offset();
        let elem = match marker {
            Null => Element::Null,
            Byte => {
                let v = self
                    .data
                    .read_u8()
                    .map_err(|_| self.underrun(offset, "decode Byte"))?;
                Element::Byte(v)
            }
            Double => {
                let v = self
                    .data
                    .read_f64::<LittleEndian>()
                    .map_err(|_| self.underrun(offset, "decode Double"))?;
                Element::Double(v)
            }
            Str => {
                let len = self
                    .data
                    .read_u32::<LittleEndian>()
                    .map_err(|_| self.underrun(offset, "decode Str length"))?
                    as usize;
                if len > self.data.len() {
                    return Err(self.underrun(offset + 4, "get Str content"));
                }
                let (string, data) = self.data.split_at(len);
                self.data = data;
                let string = std::str::from_utf8(string).map_err(|e| {
                    Error::MalformedDocument(format!("String at offset {}: {}", offset + 4, e))
                })?;
                Element::Str(string)
            }
            InternedStr => {
                let v = self
                    .data
                    .read_u16::<LittleEndian>()
                    .map_err(|_| self.underrun(offset, "decode Interned index"))?;
                Element::Interned(v)
            }
            ObjectStart => {
                self.depth_tracking.enter(Nest::Object)?;
                Element::ObjectStart
            }
            ObjectEnd => {
                self.depth_tracking.exit(Nest::Object)?;
                Element::ObjectEnd
            }
            ArrayStart => {
                self.depth_tracking.enter(Nest::Array)?;
                Element::ArrayStart
            }
            ArrayEnd => {
                self.depth_tracking.exit(Nest::Array)?;
                Element::ArrayEnd
            }
            KeyValue => {
                if self.depth_tracking.current() != Some(Nest::Object) {
                    return Err(Error::MalformedDocument(format!(
                        "Key-value marker outside of an object at offset {}",
                        offset - 1
                    )));
                }
                Element::KeyValue
            }
            DocumentStart => Element::DocumentStart,
            DocumentEnd => Element::DocumentEnd,
            Unknown(v) => Element::Unknown(v),
        };
        Ok(elem)
    }
}

impl<'a> std::iter::Iterator for Parser<'a> {
    type Item = Result<Element<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.errored {
            return None;
        }
        let (&marker, data) = self.data.split_first()?;
        self.data = data;
        let result = self.parse_element(Marker::from_u8(marker));
        if result.is_err() {
            self.errored = true;
        }
        Some(result)
    }
}
