use std::collections::HashMap;
use std::io::Cursor;

use crate::error::FigError;

use super::binary_schema::{DefKind, EncodedType, Field, RawTypeDef};
use super::value::Value;
use super::varint::{read_bool, read_bytes, read_float32, read_string, read_svarint, read_uvarint};

const ROOT_NAME_PRIORITY: &[&str] = &["Message", "Document", "Fig", "Root"];

/// An in-memory decoder table compiled from a [`RawTypeDef`] list: decoding
/// a definition is a pure function of the byte cursor and the table, no
/// mutable state beyond the cursor position.
pub struct CompiledSchema {
    pub defs: Vec<RawTypeDef>,
    by_name: HashMap<String, usize>,
    root_index: usize,
}

impl CompiledSchema {
    pub fn compile(defs: Vec<RawTypeDef>) -> Result<Self, FigError> {
        let by_name: HashMap<String, usize> =
            defs.iter().enumerate().map(|(i, d)| (d.name.clone(), i)).collect();

        let root_index = ROOT_NAME_PRIORITY
            .iter()
            .find_map(|candidate| by_name.get(*candidate).copied())
            .or_else(|| {
                defs.iter()
                    .position(|d| matches!(d.kind, DefKind::Message(_)))
            })
            .ok_or_else(|| FigError::SchemaMismatch {
                reason: "schema has no message definition to use as root".into(),
            })?;

        Ok(Self { defs, by_name, root_index })
    }

    pub fn decode_root(&self, data: &[u8]) -> Result<Value, FigError> {
        let mut cursor = Cursor::new(data);
        self.decode_definition(self.root_index, &mut cursor)
    }

    fn def(&self, index: usize) -> Result<&RawTypeDef, FigError> {
        self.defs.get(index).ok_or_else(|| FigError::SchemaMismatch {
            reason: format!("definition index {index} out of range"),
        })
    }

    fn decode_definition(&self, index: usize, cursor: &mut Cursor<&[u8]>) -> Result<Value, FigError> {
        let def = self.def(index)?;
        match &def.kind {
            DefKind::Enum(values) => {
                let tag = read_uvarint(cursor)? as usize;
                let name = values.get(tag).cloned().unwrap_or_default();
                Ok(Value::Str(name))
            }
            DefKind::Struct(fields) => {
                let mut out = Vec::with_capacity(fields.len());
                for field in fields {
                    let value = self.decode_value(field, cursor)?;
                    out.push((field.name.clone(), value));
                }
                Ok(Value::Record(out))
            }
            DefKind::Message(fields) => self.decode_message(fields, cursor),
        }
    }

    fn decode_message(&self, fields: &[Field], cursor: &mut Cursor<&[u8]>) -> Result<Value, FigError> {
        let mut out = Vec::new();
        loop {
            let tag = read_uvarint(cursor)? as u32;
            if tag == 0 {
                break;
            }
            match fields.iter().find(|f| f.tag == tag) {
                Some(field) => {
                    let value = self.decode_value(field, cursor)?;
                    out.push((field.name.clone(), value));
                }
                None => {
                    tracing::warn!(tag, "skipping unknown field tag");
                    self.skip_value(cursor, None)?;
                }
            }
        }
        Ok(Value::Record(out))
    }

    fn decode_value(&self, field: &Field, cursor: &mut Cursor<&[u8]>) -> Result<Value, FigError> {
        if field.array {
            let count = read_uvarint(cursor)?;
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                items.push(self.decode_scalar(field.ty, cursor)?);
            }
            Ok(Value::Seq(items))
        } else {
            self.decode_scalar(field.ty, cursor)
        }
    }

    fn decode_scalar(&self, ty: EncodedType, cursor: &mut Cursor<&[u8]>) -> Result<Value, FigError> {
        Ok(match ty {
            EncodedType::Bool => Value::Bool(read_bool(cursor)?),
            EncodedType::Int => Value::Int(read_svarint(cursor)?),
            EncodedType::UInt => Value::UInt(read_uvarint(cursor)?),
            EncodedType::Float32 => Value::Float(read_float32(cursor)?),
            EncodedType::Str => Value::Str(read_string(cursor)?),
            EncodedType::Bytes => Value::Bytes(read_bytes(cursor)?),
            EncodedType::Ref(idx) => self.decode_definition(idx, cursor)?,
        })
    }

    /// Skips a field whose tag has no declared field in the schema. Without
    /// a declared type there is nothing to dispatch on; in practice unknown
    /// tags only arise for a field removed after the document was produced,
    /// so this treats the remaining message as unreadable.
    fn skip_value(&self, _cursor: &mut Cursor<&[u8]>, _hint: Option<EncodedType>) -> Result<(), FigError> {
        Err(FigError::SchemaMismatch {
            reason: "cannot skip a field with unknown wire type".into(),
        })
    }
}
