use std::io::Cursor;

use crate::error::FigError;

use super::varint::{read_bool, read_string, read_svarint, read_uvarint};

/// A primitive wire type, or a reference to another definition by index.
///
/// Negative type codes name a primitive family; this mapping is this
/// implementation's own fixed assignment (the distilled wire format leaves
/// the exact codes unspecified beyond "varint/zigzag, float32,
/// length-prefixed string, length-prefixed bytes").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodedType {
    Bool,
    Int,
    UInt,
    Float32,
    Str,
    Bytes,
    Ref(usize),
}

impl EncodedType {
    fn from_code(code: i64) -> Result<Self, FigError> {
        Ok(match code {
            -1 => EncodedType::Bool,
            -2 => EncodedType::Int,
            -3 => EncodedType::UInt,
            -4 => EncodedType::Float32,
            -5 => EncodedType::Str,
            -6 => EncodedType::Bytes,
            n if n >= 0 => EncodedType::Ref(n as usize),
            other => {
                return Err(FigError::SchemaMismatch {
                    reason: format!("unknown primitive type code {other}"),
                })
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub tag: u32,
    pub ty: EncodedType,
    pub array: bool,
}

#[derive(Debug, Clone)]
pub enum DefKind {
    Enum(Vec<String>),
    Struct(Vec<Field>),
    Message(Vec<Field>),
}

#[derive(Debug, Clone)]
pub struct RawTypeDef {
    pub name: String,
    pub kind: DefKind,
}

/// Parses the binary schema format: a varint count followed by that many
/// definition records (name, kind byte, field count, then per-field name,
/// tag, signed type code, array flag).
pub fn parse(bytes: &[u8]) -> Result<Vec<RawTypeDef>, FigError> {
    let mut cursor = Cursor::new(bytes);
    let count = read_uvarint(&mut cursor)?;

    let mut defs = Vec::with_capacity(count as usize);
    for _ in 0..count {
        defs.push(read_definition(&mut cursor)?);
    }
    Ok(defs)
}

fn read_definition(cursor: &mut Cursor<&[u8]>) -> Result<RawTypeDef, FigError> {
    let name = read_string(cursor)?;
    let kind_byte = read_u8(cursor)?;

    let field_count = read_uvarint(cursor)?;
    match kind_byte {
        0 => {
            let mut values = Vec::with_capacity(field_count as usize);
            for _ in 0..field_count {
                values.push(read_string(cursor)?);
            }
            Ok(RawTypeDef { name, kind: DefKind::Enum(values) })
        }
        1 | 2 => {
            let mut fields = Vec::with_capacity(field_count as usize);
            for _ in 0..field_count {
                fields.push(read_field(cursor)?);
            }
            let kind = if kind_byte == 1 { DefKind::Struct(fields) } else { DefKind::Message(fields) };
            Ok(RawTypeDef { name, kind })
        }
        other => Err(FigError::SchemaMismatch { reason: format!("unknown definition kind {other}") }),
    }
}

fn read_field(cursor: &mut Cursor<&[u8]>) -> Result<Field, FigError> {
    let name = read_string(cursor)?;
    let tag = read_uvarint(cursor)? as u32;
    let type_code = read_svarint(cursor)?;
    let array = read_bool(cursor)?;
    Ok(Field { name, tag, ty: EncodedType::from_code(type_code)?, array })
}

fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8, FigError> {
    let bytes = cursor.get_ref();
    let pos = cursor.position() as usize;
    let b = *bytes.get(pos).ok_or_else(|| FigError::Corrupt { offset: pos, reason: "truncated definition kind".into() })?;
    cursor.set_position(pos as u64 + 1);
    Ok(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uvarint(v: u64) -> Vec<u8> {
        let mut out = Vec::new();
        let mut v = v;
        loop {
            let mut byte = (v & 0x7f) as u8;
            v >>= 7;
            if v != 0 {
                byte |= 0x80;
            }
            out.push(byte);
            if v == 0 {
                break;
            }
        }
        out
    }

    fn zigzag(v: i64) -> u64 {
        ((v << 1) ^ (v >> 63)) as u64
    }

    fn string_bytes(s: &str) -> Vec<u8> {
        let mut out = uvarint(s.len() as u64);
        out.extend_from_slice(s.as_bytes());
        out
    }

    #[test]
    fn parses_a_single_message_definition() {
        let mut bytes = uvarint(1); // one definition
        bytes.extend(string_bytes("Message"));
        bytes.push(2); // message kind
        bytes.extend(uvarint(1)); // one field
        bytes.extend(string_bytes("name"));
        bytes.extend(uvarint(1)); // tag 1
        bytes.extend(uvarint(zigzag(-5))); // string type
        bytes.push(0); // not array

        let defs = parse(&bytes).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "Message");
        match &defs[0].kind {
            DefKind::Message(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].name, "name");
                assert_eq!(fields[0].tag, 1);
                assert!(matches!(fields[0].ty, EncodedType::Str));
            }
            _ => panic!("expected message"),
        }
    }
}
