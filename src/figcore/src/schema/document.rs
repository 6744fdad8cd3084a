use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;

use crate::error::FigError;

use super::binary_schema;
use super::compiled::CompiledSchema;
use super::value::Value;

const MAGIC: &[u8; 8] = b"fig-kiwi";
const ZSTD_MAGIC: u32 = 0xFD2F_B528;

/// The decoded inner document: a compiled schema, the decoded root value,
/// and the geometry blob array referenced by index from node records.
pub struct KiwiDocument {
    pub version: u32,
    pub schema: CompiledSchema,
    pub root_value: Value,
    pub blobs: Vec<Vec<u8>>,
}

impl KiwiDocument {
    pub fn parse(bytes: &[u8]) -> Result<Self, FigError> {
        let mut cursor = Cursor::new(bytes);

        let mut magic = [0u8; 8];
        cursor.read_exact(&mut magic).map_err(|_| FigError::BadMagic { found: bytes.get(..8.min(bytes.len())).unwrap_or(&[]).to_vec() })?;
        if &magic != MAGIC {
            return Err(FigError::BadMagic { found: magic.to_vec() });
        }

        let version = cursor.read_u32::<LittleEndian>()?;

        let schema_len = cursor.read_u32::<LittleEndian>()? as usize;
        let schema_chunk = read_chunk(&mut cursor, schema_len)?;
        let schema_bytes = decompress_chunk(schema_chunk)?;

        let data_len = cursor.read_u32::<LittleEndian>()? as usize;
        let data_chunk = read_chunk(&mut cursor, data_len)?;
        let data_bytes = decompress_chunk(data_chunk)?;

        let raw_defs = binary_schema::parse(&schema_bytes)?;
        let schema = CompiledSchema::compile(raw_defs)?;
        let root_value = schema.decode_root(&data_bytes)?;

        let blobs = root_value
            .field_seq("blobs")
            .iter()
            .filter_map(|v| v.as_bytes().map(|b| b.to_vec()))
            .collect();

        Ok(Self { version, schema, root_value, blobs })
    }
}

fn read_chunk<'a>(cursor: &mut Cursor<&'a [u8]>, len: usize) -> Result<&'a [u8], FigError> {
    let pos = cursor.position() as usize;
    let bytes = cursor.get_ref();
    let chunk = bytes
        .get(pos..pos + len)
        .ok_or_else(|| FigError::Corrupt { offset: pos, reason: "truncated kiwi chunk".into() })?;
    cursor.set_position(pos as u64 + len as u64);
    Ok(chunk)
}

/// Either raw deflate or framed zstd, discriminated by the chunk's first
/// four bytes.
fn decompress_chunk(chunk: &[u8]) -> Result<Vec<u8>, FigError> {
    if chunk.len() >= 4 {
        let marker = u32::from_le_bytes(chunk[0..4].try_into().unwrap());
        if marker == ZSTD_MAGIC {
            return zstd::stream::decode_all(chunk)
                .map_err(|e| FigError::Corrupt { offset: 0, reason: format!("zstd: {e}") });
        }
    }
    let mut decoder = DeflateDecoder::new(chunk);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| FigError::Corrupt { offset: 0, reason: format!("deflate: {e}") })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::binary_schema::{parse, DefKind};

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

    fn deflate(bytes: &[u8]) -> Vec<u8> {
        use std::io::Write;
        let mut enc =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(bytes).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn parses_end_to_end_document_with_one_string_field() {
        let mut schema_bytes = uvarint(1);
        schema_bytes.extend(string_bytes("Message"));
        schema_bytes.push(2); // message
        schema_bytes.extend(uvarint(1));
        schema_bytes.extend(string_bytes("name"));
        schema_bytes.extend(uvarint(1));
        schema_bytes.extend(uvarint(zigzag(-5)));
        schema_bytes.push(0);

        // sanity: the raw schema bytes parse on their own
        assert_eq!(parse(&schema_bytes).unwrap().len(), 1);
        assert!(matches!(parse(&schema_bytes).unwrap()[0].kind, DefKind::Message(_)));

        let mut data_bytes = uvarint(1);
        data_bytes.extend(uvarint(5));
        data_bytes.extend_from_slice(b"hello");
        data_bytes.extend(uvarint(0));

        let schema_compressed = deflate(&schema_bytes);
        let data_compressed = deflate(&data_bytes);

        let mut doc = Vec::new();
        doc.extend_from_slice(MAGIC);
        doc.extend_from_slice(&101u32.to_le_bytes());
        doc.extend_from_slice(&(schema_compressed.len() as u32).to_le_bytes());
        doc.extend_from_slice(&schema_compressed);
        doc.extend_from_slice(&(data_compressed.len() as u32).to_le_bytes());
        doc.extend_from_slice(&data_compressed);

        let parsed = KiwiDocument::parse(&doc).unwrap();
        assert_eq!(parsed.version, 101);
        assert_eq!(parsed.root_value.field_str("name"), Some("hello"));
    }

    #[test]
    fn rejects_wrong_magic() {
        let err = KiwiDocument::parse(b"not-kiwi-at-all-000000").unwrap_err();
        assert!(matches!(err, FigError::BadMagic { .. }));
    }
}
