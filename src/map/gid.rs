//! Global tile ids as stored in TMX documents.
//! This is the only module that knows where the flag bits live.
use bitflags::bitflags;

bitflags! {
    /// Flip and rotation flags packed into the high bits of a stored tile value.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug)]
    pub struct TileFlags: u32 {
        const FLIP_HORIZONTAL   = 0x8000_0000;
        const FLIP_VERTICAL     = 0x4000_0000;
        /// Anti-diagonal flip. Combined with the other two, expresses 90 degree rotations.
        const FLIP_DIAGONAL     = 0x2000_0000;
    }
}

impl TileFlags {

    pub fn flip_h(self) -> bool { self.contains(Self::FLIP_HORIZONTAL) }
    pub fn flip_v(self) -> bool { self.contains(Self::FLIP_VERTICAL) }
    pub fn flip_d(self) -> bool { self.contains(Self::FLIP_DIAGONAL) }

    /// Clockwise rotation in degrees expressed by the flag combination.
    /// Zero unless the diagonal flag is set.
    pub fn rotation(self) -> u32 {
        if !self.flip_d() { return 0 }
        match (self.flip_h(), self.flip_v()) {
            (true, false) => 90,
            (true, true) => 180,
            (false, true) => 270,
            (false, false) => 0,
        }
    }
}

/// Mask of the bits that hold the tile id.
const TILE_ID_MASK: u32 = !TileFlags::all().bits();

/// Raw 32-bit value stored for a tile cell or tile object.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash, Ord, PartialOrd)]
pub struct Gid(pub u32);

impl Gid {

    pub const EMPTY: Gid = Gid(0);

    /// Largest tile id that fits beside the flag bits.
    pub const MAX_TILE_ID: u32 = TILE_ID_MASK;

    /// Splits the stored value into flags and tile id.
    /// Flags of empty cells are discarded.
    pub fn decode(self) -> DecodedGid {
        let tile_id = self.0 & TILE_ID_MASK;
        if tile_id == 0 {
            return DecodedGid::default();
        }
        DecodedGid {
            flags: TileFlags::from_bits_truncate(self.0),
            tile_id,
        }
    }

    /// Packs flags and tile id back into a stored value.
    /// Bits of the tile id that overlap the flags are dropped.
    pub fn encode(flags: TileFlags, tile_id: u32) -> Gid {
        Gid(flags.bits() | (tile_id & TILE_ID_MASK))
    }

    pub fn tile_id(self) -> u32 {
        self.0 & TILE_ID_MASK
    }

    pub fn flags(self) -> TileFlags {
        self.decode().flags
    }

    pub fn is_empty(self) -> bool {
        self.tile_id() == 0
    }

    /// Same flags, different tile id.
    pub fn with_tile_id(self, tile_id: u32) -> Gid {
        Gid::encode(TileFlags::from_bits_truncate(self.0), tile_id)
    }
}

impl From<u32> for Gid {
    fn from(raw: u32) -> Self {
        Gid(raw)
    }
}

/// Result of [`Gid::decode`].
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
pub struct DecodedGid {
    pub flags: TileFlags,
    /// Map-wide tile id. 0 means empty.
    pub tile_id: u32,
}
