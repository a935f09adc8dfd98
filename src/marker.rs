/// ISON tag bytes. Every element on the wire starts with exactly one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    Null,
    Byte,
    Double,
    Str,
    InternedStr,
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    KeyValue,
    DocumentStart,
    DocumentEnd,
    Unknown(u8),
}

impl Marker {
    /// Construct a marker from a single byte.
    pub fn from_u8(n: u8) -> Marker {
        match n {
            0x00 => Marker::Null,
            0x01 => Marker::Byte,
            0x02 => Marker::Double,
            0x03 => Marker::Str,
            0x04 => Marker::InternedStr,
            0x05 => Marker::ObjectStart,
            0x06 => Marker::ObjectEnd,
            0x07 => Marker::ArrayStart,
            0x08 => Marker::ArrayEnd,
            0x09 => Marker::KeyValue,
            0x0e => Marker::DocumentEnd,
            0x0f => Marker::DocumentStart,
            _ => Marker::Unknown(n),
        }
    }

    /// Converts a marker into its single-byte representation.
    pub fn into_u8(self) -> u8 {
        match self {
            Marker::Null => 0x00,
            Marker::Byte => 0x01,
            Marker::Double => 0x02,
            Marker::Str => 0x03,
            Marker::InternedStr => 0x04,
            Marker::ObjectStart => 0x05,
            Marker::ObjectEnd => 0x06,
            Marker::ArrayStart => 0x07,
            Marker::ArrayEnd => 0x08,
            Marker::KeyValue => 0x09,
            Marker::DocumentEnd => 0x0e,
            Marker::DocumentStart => 0x0f,
            Marker::Unknown(n) => n,
        }
    }
}

impl From<u8> for Marker {
    fn from(val: u8) -> Marker {
        Marker::from_u8(val)
    }
}

impl From<Marker> for u8 {
    fn from(val: Marker) -> u8 {
        val.into_u8()
    }
}
