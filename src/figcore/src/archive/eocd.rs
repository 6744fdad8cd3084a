use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::FigError;

use super::EOCD_SIGNATURE;

const MIN_EOCD_SIZE: usize = 22;
const MAX_COMMENT_LEN: usize = 65535;

pub struct EndOfCentralDirectory {
    pub entry_count: u16,
    pub central_directory_offset: u32,
}

impl EndOfCentralDirectory {
    /// Scans backwards from end-of-file for the EoCD signature, bounded by
    /// the minimum record size and the maximum comment length.
    pub fn find(bytes: &[u8]) -> Result<Self, FigError> {
        if bytes.len() < MIN_EOCD_SIZE {
            return Err(FigError::NotArchive { reason: "file too small for EoCD".into() });
        }

        let search_start = bytes.len().saturating_sub(MIN_EOCD_SIZE + MAX_COMMENT_LEN);
        let window = &bytes[search_start..];

        let mut found = None;
        // Scan backwards so a signature-like byte sequence inside a trailing
        // comment doesn't win over the real record.
        for i in (0..=window.len().saturating_sub(4)).rev() {
            let candidate = u32::from_le_bytes(window[i..i + 4].try_into().unwrap());
            if candidate == EOCD_SIGNATURE {
                found = Some(search_start + i);
                break;
            }
        }

        let offset = found.ok_or_else(|| FigError::NotArchive {
            reason: "no end-of-central-directory signature found".into(),
        })?;

        let mut cursor = Cursor::new(bytes);
        cursor.set_position(offset as u64 + 4);
        let _disk_number = cursor.read_u16::<LittleEndian>()?;
        let _disk_with_cd = cursor.read_u16::<LittleEndian>()?;
        let _entries_on_disk = cursor.read_u16::<LittleEndian>()?;
        let entry_count = cursor.read_u16::<LittleEndian>()?;
        let _central_directory_size = cursor.read_u32::<LittleEndian>()?;
        let central_directory_offset = cursor.read_u32::<LittleEndian>()?;

        Ok(Self { entry_count, central_directory_offset })
    }
}
