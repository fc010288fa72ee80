//! Materials and material sets.
//!
//! Shading itself is out of scope; a [`Material`] here only carries what the
//! geometry pipeline needs: which vertex attributes are present and a few
//! flags (lightmap UV substitution, transparency).

use crate::{
    data_structures::geometry::{COLOR_CHANNELS, TEX_COORD_CHANNELS},
    resources::ids::AssetId,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Material {
    pub flags: u32,
    /// Indices into the owning set's texture table.
    pub texture_indices: Vec<u32>,
    /// GX vertex attribute flags, two bits per attribute.
    pub vertex_attributes: u32,
}

static INVALID_MATERIAL: Material = Material {
    flags: 0,
    texture_indices: Vec::new(),
    vertex_attributes: 0,
};

impl Material {
    /// Material flag bits that mark texture channel 0 as lightmap coordinates.
    pub const LIGHTMAP_UV_MASK: u32 = 0x6000;
    pub const TRANSPARENT: u32 = 0x10;

    pub const POSITION: u32 = 0x3;
    pub const NORMAL: u32 = 0xC;

    /// Attribute mask of color channel `channel`.
    pub const fn color(channel: usize) -> u32 {
        0x30 << (channel * 2)
    }

    /// Attribute mask of texture coordinate channel `channel`.
    pub const fn uv(channel: usize) -> u32 {
        0x300 << (channel * 2)
    }

    /// The sentinel handed out for out-of-range lookups. It exposes no
    /// attribute channels and no flags.
    pub fn invalid() -> &'static Material {
        &INVALID_MATERIAL
    }

    pub fn is_invalid(&self) -> bool {
        std::ptr::eq(self, Self::invalid())
    }

    pub fn has_position(&self) -> bool {
        self.vertex_attributes & Self::POSITION != 0
    }

    pub fn has_normal(&self) -> bool {
        self.vertex_attributes & Self::NORMAL != 0
    }

    pub fn has_color(&self, channel: usize) -> bool {
        channel < COLOR_CHANNELS && self.vertex_attributes & Self::color(channel) != 0
    }

    pub fn has_uv(&self, channel: usize) -> bool {
        channel < TEX_COORD_CHANNELS && self.vertex_attributes & Self::uv(channel) != 0
    }

    pub fn is_lightmapped(&self) -> bool {
        self.flags & Self::LIGHTMAP_UV_MASK != 0
    }

    pub fn is_transparent(&self) -> bool {
        self.flags & Self::TRANSPARENT != 0
    }
}

/// Ordered materials plus the texture table they index into.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialSet {
    pub materials: Vec<Material>,
    pub texture_ids: Vec<AssetId>,
}

static EMPTY_SET: MaterialSet = MaterialSet {
    materials: Vec::new(),
    texture_ids: Vec::new(),
};

impl MaterialSet {
    pub fn new(materials: Vec<Material>, texture_ids: Vec<AssetId>) -> Self {
        Self {
            materials,
            texture_ids,
        }
    }

    pub fn empty() -> &'static MaterialSet {
        &EMPTY_SET
    }

    /// Never fails: indices past the end resolve to [`Material::invalid`].
    pub fn material(&self, index: u32) -> &Material {
        self.materials
            .get(index as usize)
            .unwrap_or(Material::invalid())
    }

    /// Texture asset id at `index`, [`AssetId::INVALID`] past the end.
    pub fn texture_id(&self, index: u32) -> AssetId {
        self.texture_ids
            .get(index as usize)
            .copied()
            .unwrap_or(AssetId::INVALID)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
