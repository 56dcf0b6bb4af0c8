use std::ops::Range;
use glam::{IVec2, Vec2};
use crate::{AssetPath, URect};
use super::{
    AnimationFrame, Color, Gid, GridGeometry, Image, Layer, LayerKind, LayerWalk, MapObject,
    Orientation, Properties, RenderOrder, StaggerAxis, StaggerIndex, Tile, TileFlags,
    Tileset, TmxError, TmxResult,
};

/// A loaded TMX map, with every referenced tileset resolved.
/// Immutable once loaded. Tilesets are sorted by `first_gid` and own disjoint gid ranges.
#[derive(Clone, Default, Debug)]
pub struct TiledMap {
    pub version: String,
    pub tiled_version: String,
    pub class: String,
    pub orientation: Orientation,
    pub render_order: RenderOrder,
    /// Width in tiles
    pub width: u32,
    /// Height in tiles
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub hex_side_length: u32,
    pub stagger_axis: StaggerAxis,
    pub stagger_index: StaggerIndex,
    pub infinite: bool,
    pub background_color: Option<Color>,
    pub next_layer_id: u32,
    pub next_object_id: u32,
    pub tilesets: Vec<Tileset>,
    pub layers: Vec<Layer>,
    pub properties: Properties,
    /// Document the map was loaded from.
    pub source: Option<AssetPath>,
}

/// Where to find the image of a tile.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TileImageRef<'a> {
    /// Index of the tileset in [`TiledMap::tilesets`].
    pub tileset_index: usize,
    pub local_id: u32,
    pub image: &'a Image,
    /// Region of the image to draw. None means the whole image.
    pub rect: Option<URect>,
    pub flags: TileFlags,
}

impl TiledMap {

    /// Tileset owning a gid, along with its index and the tile id local to it.
    /// None for empty cells.
    pub fn tileset_for_gid(&self, gid: Gid) -> TmxResult<Option<(usize, &Tileset, u32)>> {
        if gid.is_empty() { return Ok(None) }
        let tile_id = gid.tile_id();
        let index = tileset_index(&self.tilesets, tile_id).ok_or(TmxError::GidOutOfRange { tile_id })?;
        let tileset = &self.tilesets[index];
        Ok(Some((index, tileset, tile_id - tileset.first_gid)))
    }

    /// Image and region a tile is drawn with.
    /// None for empty cells and for collection tiles that declare no image.
    pub fn tile_image_ref(&self, gid: Gid) -> TmxResult<Option<TileImageRef>> {
        let Some((tileset_index, tileset, local_id)) = self.tileset_for_gid(gid)? else {
            return Ok(None);
        };
        let image_ref = tileset.tile_image(local_id).map(|(image, rect)| TileImageRef {
            tileset_index,
            local_id,
            image,
            rect,
            flags: gid.flags(),
        });
        Ok(image_ref)
    }

    /// Tile definition for a gid, if its tileset declares one.
    pub fn tile(&self, gid: Gid) -> TmxResult<Option<&Tile>> {
        let tile = self.tileset_for_gid(gid)?.and_then(|(_, tileset, local_id)| tileset.tile(local_id));
        Ok(tile)
    }

    /// Properties of a tile: those of its tileset overridden by the tile's own.
    pub fn tile_properties(&self, gid: Gid) -> TmxResult<Properties> {
        let Some((_, tileset, local_id)) = self.tileset_for_gid(gid)? else {
            return Ok(Properties::default());
        };
        let properties = match tileset.tile(local_id) {
            Some(tile) => tileset.properties.merged(&tile.properties),
            None => tileset.properties.clone(),
        };
        Ok(properties)
    }

    /// Frames to show for a cell, as gids carrying the cell's flags.
    /// A tile that is not animated yields itself with no duration. Empty cells yield nothing.
    pub fn animated_tile_frames(&self, gid: Gid) -> TmxResult<Vec<AnimationFrame>> {
        let Some((_, tileset, local_id)) = self.tileset_for_gid(gid)? else {
            return Ok(Vec::new());
        };
        let animation = tileset.tile(local_id).and_then(|tile| tile.animation.as_ref());
        let frames = match animation {
            Some(animation) => animation.frames().iter()
                .map(|frame| AnimationFrame {
                    gid: gid.with_tile_id(tileset.first_gid + frame.tile_id),
                    duration: Some(frame.duration),
                })
                .collect(),
            None => vec![AnimationFrame { gid, duration: None }],
        };
        Ok(frames)
    }

    pub fn grid(&self) -> GridGeometry {
        GridGeometry {
            orientation: self.orientation,
            tile_width: self.tile_width,
            tile_height: self.tile_height,
            map_height: self.height,
            hex_side_length: self.hex_side_length,
            stagger_axis: self.stagger_axis,
            stagger_index: self.stagger_index,
        }
    }

    /// Tile containing a pixel position.
    pub fn pixel_to_tile_pos(&self, pixel: Vec2) -> IVec2 {
        self.grid().pixel_to_tile(pixel)
    }

    /// Pixel position of a tile's top-left corner.
    pub fn tile_to_pixel_pos(&self, tile: IVec2) -> Vec2 {
        self.grid().tile_to_pixel(tile)
    }

    /// Every layer depth-first in declaration order.
    pub fn iter_layers(&self) -> impl Iterator<Item = &Layer> {
        LayerWalk::new(&self.layers).map(|walked| walked.layer)
    }

    /// Every layer depth-first, with offsets, opacity and visibility of enclosing groups accumulated.
    pub fn layers_with_offsets(&self) -> LayerWalk {
        LayerWalk::new(&self.layers)
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.iter_layers().find(|layer| layer.name == name)
    }

    /// Objects of every object group, depth-first.
    pub fn objects(&self) -> impl Iterator<Item = &MapObject> {
        self.iter_layers().flat_map(|layer| match &layer.kind {
            LayerKind::ObjectGroup(group) => group.objects.as_slice(),
            _ => [].as_slice(),
        })
    }

    pub fn objects_by_name(&self, name: &str) -> Vec<&MapObject> {
        self.objects().filter(|object| object.name == name).collect()
    }

    /// Objects whose type, or class, matches.
    pub fn objects_by_type(&self, class: &str) -> Vec<&MapObject> {
        self.objects().filter(|object| object.class == class).collect()
    }

    pub fn object_by_id(&self, id: u32) -> Option<&MapObject> {
        self.objects().find(|object| object.id == id)
    }

    /// Fails on the first tile cell or tile object that no tileset covers.
    pub(crate) fn validate_gids(&self) -> TmxResult<()> {
        for layer in self.iter_layers() {
            match &layer.kind {
                LayerKind::TileLayer(tile_layer) => {
                    for (_, gid) in tile_layer.tiles() {
                        self.tileset_for_gid(gid)?;
                    }
                },
                LayerKind::ObjectGroup(group) => {
                    for gid in group.objects.iter().filter_map(|object| object.gid) {
                        self.tileset_for_gid(gid)?;
                    }
                },
                _ => {},
            }
        }
        Ok(())
    }
}

/// Index of the tileset covering a tile id, in tilesets sorted by first gid.
/// Empty tilesets own no ids and are passed over.
pub(crate) fn tileset_index(tilesets: &[Tileset], tile_id: u32) -> Option<usize> {
    let end = tilesets.partition_point(|tileset| tileset.first_gid <= tile_id);
    let index = tilesets[..end].iter().rposition(|tileset| tileset.tile_count > 0)?;
    tilesets[index].contains(tile_id).then_some(index)
}

/// Sorts tilesets by first gid, failing if any two claim the same gid.
pub(crate) fn sort_tilesets(tilesets: &mut [Tileset]) -> TmxResult<()> {
    tilesets.sort_by_key(|tileset| tileset.first_gid);
    for pair in tilesets.windows(2) {
        if pair[0].first_gid == pair[1].first_gid {
            return Err(TmxError::OverlappingTilesetRanges { first: pair[0].gid_range(), second: pair[1].gid_range() });
        }
    }

    // Empty ranges claim nothing
    let mut claimed: Option<Range<u32>> = None;
    for range in tilesets.iter().map(Tileset::gid_range).filter(|range| !range.is_empty()) {
        if let Some(previous) = claimed.take() {
            if previous.end > range.start {
                return Err(TmxError::OverlappingTilesetRanges { first: previous, second: range });
            }
        }
        claimed = Some(range);
    }
    Ok(())
}
