//! Identifiers used to address archived resources.

use std::{fmt, str::FromStr};

/// Opaque identifier of an archived asset.
///
/// Assets are addressed by this id across every loaded archive. The on-disk
/// representation is 32 bits wide; `0xFFFFFFFF` there means "no asset" and maps
/// to [`AssetId::INVALID`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId(u64);

impl AssetId {
    /// The designated "no asset" sentinel.
    pub const INVALID: AssetId = AssetId(u64::MAX);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl From<u32> for AssetId {
    fn from(raw: u32) -> Self {
        if raw == u32::MAX {
            Self::INVALID
        } else {
            Self(u64::from(raw))
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return f.write_str("INVALID");
        }
        if self.0 <= u64::from(u32::MAX) {
            write!(f, "{:08X}", self.0)
        } else {
            write!(f, "{:016X}", self.0)
        }
    }
}

/// Four character type tag of an archived resource, e.g. `CMDL` or `STRG`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FourCC([u8; 4]);

impl FourCC {
    pub const fn new(tag: &[u8; 4]) -> Self {
        Self(*tag)
    }

    pub const fn from_u32(raw: u32) -> Self {
        Self(raw.to_be_bytes())
    }

    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({self})")
    }
}

impl FromStr for FourCC {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| anyhow::anyhow!("a type tag needs exactly 4 bytes, got {s:?}"))?;
        Ok(Self(bytes))
    }
}
