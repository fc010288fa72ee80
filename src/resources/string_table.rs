//! `STRG` string tables.
//!
//! Layout (big-endian):
//!
//! ```text
//! u32 magic (0x87654321), u32 version (0), u32 language count, u32 string count
//! language count x (FourCC language, u32 block offset)
//! per language, at its offset from the end of the language table:
//!     u32 block size
//!     string count x u32 string offset, relative to this offset array
//!     UTF-16BE strings, each NUL terminated
//! ```

use crate::resources::{
    ResourceData,
    error::DecodeError,
    ids::FourCC,
    reader::BigEndianReader,
};

pub const STRG: FourCC = FourCC::new(b"STRG");
pub const STRG_MAGIC: u32 = 0x8765_4321;
pub const ENGLISH: FourCC = FourCC::new(b"ENGL");

/// Localized strings, one list per language. Every language holds the same
/// number of strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringTable {
    languages: Vec<(FourCC, Vec<String>)>,
}

impl StringTable {
    pub fn new(languages: Vec<(FourCC, Vec<String>)>) -> Self {
        Self { languages }
    }

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = BigEndianReader::new(data);
        reader.expect_magic(STRG_MAGIC)?;
        let version = reader.u32()?;
        if version != 0 {
            return Err(DecodeError::UnsupportedVersion {
                format: STRG,
                version,
            });
        }
        let language_count = reader.count(8)?;
        let string_count = reader.count(4)?;

        let mut table = Vec::with_capacity(language_count);
        for _ in 0..language_count {
            table.push((reader.fourcc()?, reader.u32()?));
        }
        let blocks_start = reader.position();

        let mut languages = Vec::with_capacity(language_count);
        for (language, offset) in table {
            reader.seek(blocks_start + u64::from(offset))?;
            let strings = read_block(&mut reader, string_count)
                .map_err(|e| DecodeError::Malformed(format!("language {language}: {e}")))?;
            languages.push((language, strings));
        }
        Ok(Self { languages })
    }

    pub fn languages(&self) -> impl Iterator<Item = FourCC> + '_ {
        self.languages.iter().map(|(language, _)| *language)
    }

    /// Number of strings per language.
    pub fn len(&self) -> usize {
        self.languages
            .first()
            .map_or(0, |(_, strings)| strings.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// String `index` in English, or in the first language when there is no
    /// English block.
    pub fn string(&self, index: usize) -> Option<&str> {
        let strings = self
            .languages
            .iter()
            .find(|(language, _)| *language == ENGLISH)
            .or_else(|| self.languages.first())
            .map(|(_, strings)| strings)?;
        strings.get(index).map(String::as_str)
    }

    pub fn language_string(&self, language: FourCC, index: usize) -> Option<&str> {
        self.languages
            .iter()
            .find(|(l, _)| *l == language)
            .and_then(|(_, strings)| strings.get(index))
            .map(String::as_str)
    }
}

fn read_block(
    reader: &mut BigEndianReader,
    string_count: usize,
) -> Result<Vec<String>, DecodeError> {
    let size = u64::from(reader.u32()?);
    let offsets_start = reader.position();
    if offsets_start + size > reader.len() {
        return Err(DecodeError::Malformed(format!(
            "block of {size} bytes overruns the table"
        )));
    }
    let mut offsets = Vec::with_capacity(string_count);
    for _ in 0..string_count {
        offsets.push(u64::from(reader.u32()?));
    }

    let mut strings = Vec::with_capacity(string_count);
    for offset in offsets {
        if offset >= size {
            return Err(DecodeError::Malformed(format!(
                "string offset {offset:#X} outside its {size:#X} byte block"
            )));
        }
        reader.seek(offsets_start + offset)?;
        let mut units = Vec::new();
        loop {
            match reader.u16()? {
                0 => break,
                unit => units.push(unit),
            }
        }
        let string = String::from_utf16(&units)
            .map_err(|_| DecodeError::Malformed("invalid UTF-16 string".to_owned()))?;
        strings.push(string);
    }
    Ok(strings)
}

pub fn decode(data: &[u8]) -> Result<ResourceData, DecodeError> {
    Ok(ResourceData::StringTable(StringTable::decode(data)?))
}
