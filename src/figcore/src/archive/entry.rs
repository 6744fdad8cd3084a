use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::FigError;

pub struct CentralDirectoryEntry {
    pub name: String,
    pub compression_method: u16,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub local_header_offset: u32,
}

impl CentralDirectoryEntry {
    pub fn read(cursor: &mut Cursor<&[u8]>, expected_signature: u32) -> Result<Self, FigError> {
        let offset = cursor.position() as usize;
        let signature = cursor.read_u32::<LittleEndian>()?;
        if signature != expected_signature {
            return Err(FigError::Corrupt {
                offset,
                reason: format!("bad central directory signature 0x{signature:08x}"),
            });
        }

        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let _flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let _mod_time = cursor.read_u16::<LittleEndian>()?;
        let _mod_date = cursor.read_u16::<LittleEndian>()?;
        let _crc32 = cursor.read_u32::<LittleEndian>()?;
        let compressed_size = cursor.read_u32::<LittleEndian>()?;
        let uncompressed_size = cursor.read_u32::<LittleEndian>()?;
        let name_len = cursor.read_u16::<LittleEndian>()?;
        let extra_len = cursor.read_u16::<LittleEndian>()?;
        let comment_len = cursor.read_u16::<LittleEndian>()?;
        let _disk_number = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let local_header_offset = cursor.read_u32::<LittleEndian>()?;

        let name_start = cursor.position() as usize;
        let name_bytes = cursor
            .get_ref()
            .get(name_start..name_start + name_len as usize)
            .ok_or_else(|| FigError::Corrupt { offset: name_start, reason: "truncated entry name".into() })?;
        let name = String::from_utf8_lossy(name_bytes).into_owned();

        cursor.set_position(name_start as u64 + name_len as u64 + extra_len as u64 + comment_len as u64);

        Ok(Self {
            name,
            compression_method,
            compressed_size,
            uncompressed_size,
            local_header_offset,
        })
    }
}
