use std::ops::Range;
use crate::{AssetPath, IntMap, URect};
use crate::map::TmxError;
use super::{Color, Orientation, Properties, Tile};

/// A tileset, resolved from either an inline definition or an external document.
/// Owns the global ids `first_gid..first_gid + tile_count`.
#[derive(Clone, Default, Debug)]
pub struct Tileset {
    pub first_gid: u32,
    pub name: String,
    pub class: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub spacing: u32,
    pub margin: u32,
    pub tile_count: u32,
    pub columns: u32,
    pub object_alignment: ObjectAlignment,
    pub tile_render_size: TileRenderSize,
    pub fill_mode: FillMode,
    pub tile_offset: TileOffset,
    pub grid: Option<Grid>,
    /// Image shared by all tiles. None for image collections.
    pub image: Option<Image>,
    pub tiles: IntMap<u32, Tile>,
    pub properties: Properties,
    /// Document the tileset was loaded from, if external.
    pub source: Option<AssetPath>,
}

impl Tileset {

    /// Global ids owned by this tileset.
    /// Ends at `u32::MAX` at most.
    pub fn gid_range(&self) -> Range<u32> {
        self.first_gid..self.first_gid.saturating_add(self.tile_count)
    }

    pub fn contains(&self, tile_id: u32) -> bool {
        self.gid_range().contains(&tile_id)
    }

    /// True if each tile brings its own image.
    pub fn is_collection(&self) -> bool {
        self.image.is_none()
    }

    /// Tile definition for a local id, if one was declared.
    pub fn tile(&self, local_id: u32) -> Option<&Tile> {
        self.tiles.get(&local_id)
    }

    /// Pixel region of a tile within the tileset image.
    /// None for image collections and ids past the end of the tileset.
    pub fn tile_rect(&self, local_id: u32) -> Option<URect> {
        if self.image.is_none() || local_id >= self.tile_count || self.columns == 0 {
            return None;
        }
        let column = local_id % self.columns;
        let row = local_id / self.columns;
        let x = self.tile_width.checked_add(self.spacing)?.checked_mul(column)?.checked_add(self.margin)?;
        let y = self.tile_height.checked_add(self.spacing)?.checked_mul(row)?.checked_add(self.margin)?;
        Some(URect { x, y, width: self.tile_width, height: self.tile_height })
    }

    /// Image a tile is drawn from, along with the region of that image to use.
    /// A region of None means the whole image.
    pub fn tile_image(&self, local_id: u32) -> Option<(&Image, Option<URect>)> {
        match &self.image {
            Some(image) => Some((image, self.tile_rect(local_id))),
            None => {
                let tile = self.tile(local_id)?;
                let image = tile.image.as_ref()?;
                Some((image, tile.image_rect))
            },
        }
    }

    /// Pixel size of a tile. Collection tiles use their own image size when known.
    pub fn tile_size(&self, local_id: u32) -> (u32, u32) {
        match self.tile_image(local_id) {
            Some((_, Some(rect))) => (rect.width, rect.height),
            Some((image, None)) => (
                image.width.unwrap_or(self.tile_width),
                image.height.unwrap_or(self.tile_height),
            ),
            None => (self.tile_width, self.tile_height),
        }
    }

    /// Number of columns that fit in an image of the width given.
    pub fn columns_for_width(&self, image_width: u32) -> Option<u32> {
        let step = self.tile_width.checked_add(self.spacing)?;
        if step == 0 { return None }
        let usable = image_width.checked_add(self.spacing)?.checked_sub(self.margin.checked_mul(2)?)?;
        Some(usable / step)
    }

    /// Number of rows that fit in an image of the height given.
    pub fn rows_for_height(&self, image_height: u32) -> Option<u32> {
        let step = self.tile_height.checked_add(self.spacing)?;
        if step == 0 { return None }
        let usable = image_height.checked_add(self.spacing)?.checked_sub(self.margin.checked_mul(2)?)?;
        Some(usable / step)
    }
}

/// Reference to an image document. Never decoded here.
#[derive(Clone, PartialEq, Default, Debug)]
pub struct Image {
    pub format: Option<String>,
    pub source: AssetPath,
    /// Color to treat as transparent.
    pub trans: Option<Color>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub enum ObjectAlignment {
    #[default]
    Unspecified,
    TopLeft,
    Top,
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl ObjectAlignment {
    pub fn parse(str: &str) -> Result<Self, TmxError> {
        match str {
            "unspecified" => Ok(Self::Unspecified),
            "topleft" => Ok(Self::TopLeft),
            "top" => Ok(Self::Top),
            "topright" => Ok(Self::TopRight),
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            "bottomleft" => Ok(Self::BottomLeft),
            "bottom" => Ok(Self::Bottom),
            "bottomright" => Ok(Self::BottomRight),
            _ => Err(TmxError::invalid("objectalignment", str)),
        }
    }

    /// Alignment actually in effect for tile objects.
    /// Unspecified means bottom-left, except on isometric maps where it means bottom.
    pub fn effective(self, orientation: Orientation) -> Self {
        match (self, orientation) {
            (Self::Unspecified, Orientation::Isometric) => Self::Bottom,
            (Self::Unspecified, _) => Self::BottomLeft,
            (alignment, _) => alignment,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub enum FillMode {
    #[default]
    Stretch,
    PreserveAspectFit,
}

impl FillMode {
    pub fn parse(str: &str) -> Result<Self, TmxError> {
        match str {
            "stretch" => Ok(Self::Stretch),
            "preserve-aspect-fit" => Ok(Self::PreserveAspectFit),
            _ => Err(TmxError::invalid("fillmode", str)),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub enum TileRenderSize {
    #[default]
    Tile,
    Grid,
}

impl TileRenderSize {
    pub fn parse(str: &str) -> Result<Self, TmxError> {
        match str {
            "tile" => Ok(Self::Tile),
            "grid" => Ok(Self::Grid),
            _ => Err(TmxError::invalid("tilerendersize", str)),
        }
    }
}

/// Pixel offset applied when drawing tiles of a tileset.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub struct TileOffset { pub x: i32, pub y: i32 }

/// Grid used for tile alignment of a tileset's tiles, as opposed to the map's.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub struct Grid {
    pub orientation: Orientation,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod test {
    use crate::{AssetPath, URect};
    use crate::map::{Image, Orientation, Tileset, ObjectAlignment};

    fn tileset() -> Tileset {
        Tileset {
            first_gid: 10,
            tile_width: 16,
            tile_height: 16,
            spacing: 2,
            margin: 1,
            tile_count: 12,
            columns: 4,
            image: Some(Image {
                source: AssetPath::parse("tiles.png", Some("mem")).unwrap(),
                width: Some(72),
                height: Some(55),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn tile_rect_layout() {
        let tileset = tileset();
        assert_eq!(Some(URect::new(1, 1, 16, 16)), tileset.tile_rect(0));
        assert_eq!(Some(URect::new(19, 1, 16, 16)), tileset.tile_rect(1));
        assert_eq!(Some(URect::new(19, 19, 16, 16)), tileset.tile_rect(5));
        assert_eq!(None, tileset.tile_rect(12));
    }

    #[test]
    fn derived_layout() {
        let tileset = tileset();
        assert_eq!(Some(4), tileset.columns_for_width(72));
        assert_eq!(Some(3), tileset.rows_for_height(55));
        assert_eq!(Some(0), tileset.columns_for_width(0));
    }

    #[test]
    fn gid_range() {
        let tileset = tileset();
        assert_eq!(10..22, tileset.gid_range());
        assert!(tileset.contains(21));
        assert!(!tileset.contains(22));
        assert!(!tileset.contains(9));
    }

    #[test]
    fn huge_values_do_not_overflow() {
        let last = Tileset { first_gid: u32::MAX, ..tileset() };
        assert_eq!(u32::MAX..u32::MAX, last.gid_range());
        let wide = Tileset { tile_width: u32::MAX - 1, spacing: 2, ..tileset() };
        assert_eq!(None, wide.tile_rect(1));
        assert_eq!(None, wide.columns_for_width(72));
        let padded = Tileset { margin: u32::MAX, ..tileset() };
        assert_eq!(None, padded.rows_for_height(55));
        assert_eq!(None, padded.tile_rect(0));
    }

    #[test]
    fn effective_alignment() {
        assert_eq!(ObjectAlignment::Bottom, ObjectAlignment::Unspecified.effective(Orientation::Isometric));
        assert_eq!(ObjectAlignment::BottomLeft, ObjectAlignment::Unspecified.effective(Orientation::Orthogonal));
        assert_eq!(ObjectAlignment::Center, ObjectAlignment::Center.effective(Orientation::Isometric));
    }
}
