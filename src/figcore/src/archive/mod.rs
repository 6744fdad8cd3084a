mod decompress;
mod eocd;
mod entry;

use std::collections::HashMap;
use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{FigError, Warning};
use eocd::EndOfCentralDirectory;
use entry::CentralDirectoryEntry;

/// The end-of-central-directory signature, `PK\x05\x06`.
const EOCD_SIGNATURE: u32 = 0x0605_4b50;
/// The central-directory file-header signature, `PK\x01\x02`.
const CENTRAL_DIR_SIGNATURE: u32 = 0x0201_4b50;
/// The local file-header signature, `PK\x03\x04`.
const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATE: u16 = 8;

/// A parsed container archive: every non-directory entry, decompressed,
/// keyed by its filename, plus the `images/` entries indexed separately by
/// their (lower-cased) basename hash.
pub struct Archive {
    entries: HashMap<String, Vec<u8>>,
    pub images: HashMap<String, Vec<u8>>,
    pub metadata: Option<serde_json::Value>,
    pub warnings: Vec<Warning>,
}

impl Archive {
    /// Parses an archive whose directory uses trailing size descriptors:
    /// per-entry sizes and compression method are read from the central
    /// directory at the end of the file, not from local file headers.
    pub fn parse(bytes: &[u8]) -> Result<Self, FigError> {
        let eocd = EndOfCentralDirectory::find(bytes)?;
        tracing::trace!(
            entry_count = eocd.entry_count,
            cd_offset = eocd.central_directory_offset,
            "located end-of-central-directory record"
        );

        let mut cursor = Cursor::new(bytes);
        cursor.set_position(eocd.central_directory_offset as u64);

        let mut entries = HashMap::new();
        let mut images = HashMap::new();
        let mut warnings = Vec::new();

        for _ in 0..eocd.entry_count {
            let entry = CentralDirectoryEntry::read(&mut cursor, CENTRAL_DIR_SIGNATURE)?;
            if entry.name.ends_with('/') {
                continue;
            }

            let raw = extract_entry_bytes(bytes, &entry)?;
            let data = match entry.compression_method {
                METHOD_STORED => raw.to_vec(),
                METHOD_DEFLATE => decompress::inflate(raw)?,
                other => {
                    return Err(FigError::UnsupportedCompression { method: other as u32 })
                }
            };

            if data.len() as u32 != entry.uncompressed_size {
                warnings.push(Warning::new(
                    None,
                    format!(
                        "entry `{}` decompressed to {} bytes, central directory declared {}",
                        entry.name,
                        data.len(),
                        entry.uncompressed_size
                    ),
                ));
            }

            if let Some(basename) = entry.name.strip_prefix("images/") {
                images.insert(basename.to_lowercase(), data.clone());
            }
            entries.insert(entry.name, data);
        }

        let metadata = match entries.get("meta.json") {
            Some(bytes) => match serde_json::from_slice(bytes) {
                Ok(value) => Some(value),
                Err(e) => {
                    warnings.push(Warning::new(None, format!("malformed meta.json: {e}")));
                    None
                }
            },
            None => None,
        };

        Ok(Self { entries, images, metadata, warnings })
    }

    pub fn entry(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(|v| v.as_slice())
    }

    pub fn list_contents(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }
}

fn extract_entry_bytes<'a>(
    bytes: &'a [u8],
    entry: &CentralDirectoryEntry,
) -> Result<&'a [u8], FigError> {
    let mut cursor = Cursor::new(bytes);
    cursor.set_position(entry.local_header_offset as u64);

    let signature = cursor.read_u32::<LittleEndian>()?;
    if signature != LOCAL_HEADER_SIGNATURE {
        return Err(FigError::NotArchive {
            reason: format!(
                "local header for `{}` has bad signature 0x{signature:08x}",
                entry.name
            ),
        });
    }

    // version needed, flags, method, mod time, mod date, crc32, comp size,
    // uncomp size: skip the fixed fields already known from the central
    // directory, only the variable-length name/extra lengths matter here.
    cursor.set_position(cursor.position() + 2 + 2 + 2 + 2 + 2 + 4 + 4 + 4);
    let name_len = cursor.read_u16::<LittleEndian>()?;
    let extra_len = cursor.read_u16::<LittleEndian>()?;
    let data_offset = cursor.position() as usize + name_len as usize + extra_len as usize;

    let end = data_offset
        .checked_add(entry.compressed_size as usize)
        .ok_or_else(|| FigError::Corrupt {
            offset: data_offset,
            reason: "entry size overflows archive bounds".into(),
        })?;
    bytes.get(data_offset..end).ok_or_else(|| FigError::Corrupt {
        offset: data_offset,
        reason: format!("entry `{}` extends past end of archive", entry.name),
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_the_one_stored_entry() {
        let bytes = test_support::archive_with_stored_entry("hi", b"hi");
        let archive = Archive::parse(&bytes).unwrap();
        assert_eq!(archive.list_contents(), vec!["hi"]);
        assert_eq!(archive.entry("hi"), Some(b"hi".as_slice()));
    }

    #[test]
    fn missing_eocd_is_not_archive() {
        let err = Archive::parse(b"not a zip file").unwrap_err();
        assert!(matches!(err, FigError::NotArchive { .. }));
    }
}
