use derive_more::*;
use glam::{IVec2, Vec2};
use crate::HashMap;
use super::{Color, Gid, Image, MapObject, Properties};

/// A node of the layer tree.
/// Offsets and opacity are stored as declared. Those of enclosing groups are not
/// folded in; use [`LayerWalk`] to accumulate them.
#[derive(Clone, Debug)]
pub struct Layer {
    pub id: u32,
    pub name: String,
    pub class: String,
    pub visible: bool,
    pub opacity: f32,
    /// Pixel offset
    pub offset: Vec2,
    pub parallax: Vec2,
    pub tint_color: Option<Color>,
    pub properties: Properties,
    pub kind: LayerKind,
}

impl Default for Layer {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            class: String::new(),
            visible: true,
            opacity: 1.0,
            offset: Vec2::ZERO,
            parallax: Vec2::ONE,
            tint_color: None,
            properties: Properties::default(),
            kind: LayerKind::GroupLayer(GroupLayer::default()),
        }
    }
}

impl Layer {

    pub fn as_tile_layer(&self) -> Option<&TileLayer> {
        match &self.kind {
            LayerKind::TileLayer(layer) => Some(layer),
            _ => None,
        }
    }

    pub fn as_object_group(&self) -> Option<&ObjectGroup> {
        match &self.kind {
            LayerKind::ObjectGroup(layer) => Some(layer),
            _ => None,
        }
    }

    pub fn as_image_layer(&self) -> Option<&ImageLayer> {
        match &self.kind {
            LayerKind::ImageLayer(layer) => Some(layer),
            _ => None,
        }
    }

    pub fn as_group_layer(&self) -> Option<&GroupLayer> {
        match &self.kind {
            LayerKind::GroupLayer(layer) => Some(layer),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum LayerKind {
    TileLayer(TileLayer),
    ObjectGroup(ObjectGroup),
    ImageLayer(ImageLayer),
    GroupLayer(GroupLayer),
}

#[derive(Clone, Debug)]
pub struct TileLayer {
    /// Width in tiles. For infinite layers, as declared by the document.
    pub width: u32,
    pub height: u32,
    pub kind: TileLayerKind,
}

#[derive(Clone, Debug)]
pub enum TileLayerKind {
    FiniteTileLayer(FiniteTileLayer),
    InfiniteTileLayer(InfiniteTileLayer),
}

impl TileLayer {

    /// Stored value of the cell at tile coordinates.
    /// None when the cell lies outside the stored area.
    pub fn get_tile_gid(&self, x: i32, y: i32) -> Option<Gid> {
        match &self.kind {
            TileLayerKind::FiniteTileLayer(layer) => {
                if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
                    return None;
                }
                let idx = y as usize * self.width as usize + x as usize;
                layer.get(idx).copied()
            },
            TileLayerKind::InfiniteTileLayer(layer) => layer.get_tile_gid(x, y),
        }
    }

    /// Computes min_x, min_y, max_x and max_y of tiles. Max values are exclusive.
    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        match &self.kind {
            TileLayerKind::FiniteTileLayer(_) => {
                (0, 0, self.width as i32, self.height as i32)
            },
            TileLayerKind::InfiniteTileLayer(layer) => layer.bounds(),
        }
    }

    /// Non-empty cells as tile position and stored value, row by row within each chunk.
    pub fn tiles(&self) -> Box<dyn Iterator<Item = (IVec2, Gid)> + '_> {
        match &self.kind {
            TileLayerKind::FiniteTileLayer(layer) => {
                let width = self.width.max(1) as usize;
                Box::new(layer.iter().enumerate()
                    .filter(|(_, gid)| !gid.is_empty())
                    .map(move |(i, gid)| (IVec2::new((i % width) as i32, (i / width) as i32), *gid)))
            },
            TileLayerKind::InfiniteTileLayer(layer) => {
                let mut origins: Vec<&IVec2> = layer.chunks.keys().collect();
                origins.sort_by_key(|origin| (origin.y, origin.x));
                Box::new(origins.into_iter().flat_map(move |origin| layer.chunks[origin].tiles()))
            },
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self.kind, TileLayerKind::InfiniteTileLayer(_))
    }
}

/// Vec to global tile ids, row-major
#[derive(Clone, Debug, Deref)]
pub struct FiniteTileLayer(pub(crate) Vec<Gid>);

/// Chunks of tile ids keyed by chunk origin, in tile coordinates.
/// Every chunk has the same dimensions and its origin is a multiple of them.
#[derive(Clone, Debug)]
pub struct InfiniteTileLayer {
    pub chunk_width: u32,
    pub chunk_height: u32,
    pub chunks: HashMap<IVec2, Chunk>,
}

impl InfiniteTileLayer {

    pub fn get_tile_gid(&self, x: i32, y: i32) -> Option<Gid> {
        let origin = IVec2::new(
            to_chunk_origin(x, self.chunk_width),
            to_chunk_origin(y, self.chunk_height),
        );
        let chunk = self.chunks.get(&origin)?;
        chunk.get_tile_gid(x - origin.x, y - origin.y)
    }

    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        if self.chunks.is_empty() {
            return (0, 0, 0, 0);
        }
        let mut min_x = i32::MAX;
        let mut min_y = i32::MAX;
        let mut max_x = i32::MIN;
        let mut max_y = i32::MIN;
        for chunk in self.chunks.values() {
            min_x = min_x.min(chunk.origin.x);
            min_y = min_y.min(chunk.origin.y);
            max_x = max_x.max(chunk.origin.x + chunk.width as i32);
            max_y = max_y.max(chunk.origin.y + chunk.height as i32);
        }
        (min_x, min_y, max_x, max_y)
    }
}

fn to_chunk_origin(v: i32, size: u32) -> i32 {
    let size = size.max(1) as i32;
    v.div_euclid(size) * size
}

/// Dense rectangle of cells within an infinite layer.
#[derive(Clone, Debug)]
pub struct Chunk {
    pub origin: IVec2,
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<Gid>,
}

impl Chunk {

    /// Cell at coordinates local to the chunk.
    pub fn get_tile_gid(&self, local_x: i32, local_y: i32) -> Option<Gid> {
        if local_x < 0 || local_y < 0 || local_x >= self.width as i32 || local_y >= self.height as i32 {
            return None;
        }
        self.tiles.get(local_y as usize * self.width as usize + local_x as usize).copied()
    }

    fn tiles(&self) -> impl Iterator<Item = (IVec2, Gid)> + '_ {
        let width = self.width.max(1) as usize;
        self.tiles.iter().enumerate()
            .filter(|(_, gid)| !gid.is_empty())
            .map(move |(i, gid)| (self.origin + IVec2::new((i % width) as i32, (i / width) as i32), *gid))
    }
}

/// Layer of free-form objects. Also used for tile collision shapes.
#[derive(Clone, Default, Debug)]
pub struct ObjectGroup {
    pub color: Option<Color>,
    pub draw_order: DrawOrder,
    pub objects: Vec<MapObject>,
}

impl ObjectGroup {
    pub fn iter(&self) -> impl Iterator<Item = &MapObject> {
        self.objects.iter()
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub enum DrawOrder {
    /// Sorted by y coordinate
    #[default]
    TopDown,
    /// In declaration order
    Index,
}

#[derive(Clone, Default, Debug)]
pub struct ImageLayer {
    pub image: Option<Image>,
    pub repeat_x: bool,
    pub repeat_y: bool,
}

/// Ordered child layers.
#[derive(Clone, Default, Debug, Deref)]
pub struct GroupLayer(pub(crate) Vec<Layer>);
impl GroupLayer {
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.0.iter()
    }
}

/// Layer visited by a [`LayerWalk`], with the state inherited from its ancestors applied.
#[derive(Copy, Clone, Debug)]
pub struct WalkedLayer<'a> {
    pub layer: &'a Layer,
    /// Number of enclosing groups
    pub depth: usize,
    /// Sum of this layer's offset and those of its ancestors.
    pub offset: Vec2,
    /// Product of this layer's opacity and those of its ancestors.
    pub opacity: f32,
    /// False if this layer or any ancestor is hidden.
    pub visible: bool,
}

/// Depth-first walk over a layer tree in declaration order.
/// Groups are yielded before their children.
pub struct LayerWalk<'a> {
    stack: Vec<(std::slice::Iter<'a, Layer>, Vec2, f32, bool)>,
}

impl<'a> LayerWalk<'a> {
    pub fn new(layers: &'a [Layer]) -> Self {
        Self { stack: vec![(layers.iter(), Vec2::ZERO, 1.0, true)] }
    }
}

impl<'a> Iterator for LayerWalk<'a> {
    type Item = WalkedLayer<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let depth = self.stack.len().checked_sub(1)?;
            let (iter, offset, opacity, visible) = self.stack.last_mut()?;
            let (offset, opacity, visible) = (*offset, *opacity, *visible);
            let Some(layer) = iter.next() else {
                self.stack.pop();
                continue;
            };
            let walked = WalkedLayer {
                layer,
                depth,
                offset: offset + layer.offset,
                opacity: opacity * layer.opacity,
                visible: visible && layer.visible,
            };
            if let LayerKind::GroupLayer(group) = &layer.kind {
                self.stack.push((group.0.iter(), walked.offset, walked.opacity, walked.visible));
            }
            return Some(walked);
        }
    }
}

#[cfg(test)]
mod test {
    use glam::{IVec2, Vec2};
    use crate::HashMap;
    use crate::map::{Gid, GroupLayer, Layer, LayerKind, LayerWalk, TileLayer, TileLayerKind};
    use super::{Chunk, FiniteTileLayer, InfiniteTileLayer};

    fn finite() -> TileLayer {
        TileLayer {
            width: 2,
            height: 2,
            kind: TileLayerKind::FiniteTileLayer(FiniteTileLayer(vec![Gid(5), Gid(0), Gid(9), Gid(5)])),
        }
    }

    fn infinite() -> TileLayer {
        let mut chunks = HashMap::default();
        for origin in [IVec2::new(-2, -2), IVec2::new(0, 0)] {
            chunks.insert(origin, Chunk {
                origin,
                width: 2,
                height: 2,
                tiles: vec![Gid(1), Gid(0), Gid(0), Gid((origin.x + 10) as u32)],
            });
        }
        TileLayer {
            width: 0,
            height: 0,
            kind: TileLayerKind::InfiniteTileLayer(InfiniteTileLayer { chunk_width: 2, chunk_height: 2, chunks }),
        }
    }

    #[test]
    fn finite_lookup() {
        let layer = finite();
        assert_eq!(Some(Gid(5)), layer.get_tile_gid(0, 0));
        assert_eq!(Some(Gid(0)), layer.get_tile_gid(1, 0));
        assert_eq!(Some(Gid(9)), layer.get_tile_gid(0, 1));
        assert_eq!(Some(Gid(5)), layer.get_tile_gid(1, 1));
        assert_eq!(None, layer.get_tile_gid(2, 0));
        assert_eq!(None, layer.get_tile_gid(-1, 0));
        assert_eq!((0, 0, 2, 2), layer.bounds());
    }

    #[test]
    fn finite_tiles_skip_empty() {
        let tiles: Vec<_> = finite().tiles().collect();
        assert_eq!(vec![
            (IVec2::new(0, 0), Gid(5)),
            (IVec2::new(0, 1), Gid(9)),
            (IVec2::new(1, 1), Gid(5)),
        ], tiles);
    }

    #[test]
    fn infinite_lookup_negative() {
        let layer = infinite();
        assert_eq!(Some(Gid(1)), layer.get_tile_gid(-2, -2));
        assert_eq!(Some(Gid(8)), layer.get_tile_gid(-1, -1));
        assert_eq!(Some(Gid(10)), layer.get_tile_gid(1, 1));
        assert_eq!(None, layer.get_tile_gid(-3, 0));
        assert_eq!(None, layer.get_tile_gid(2, 2));
        assert_eq!((-2, -2, 2, 2), layer.bounds());
    }

    #[test]
    fn infinite_tiles_ordered() {
        let tiles: Vec<_> = infinite().tiles().map(|(pos, _)| pos).collect();
        assert_eq!(vec![IVec2::new(-2, -2), IVec2::new(-1, -1), IVec2::new(0, 0), IVec2::new(1, 1)], tiles);
    }

    #[test]
    fn walk_accumulates_offsets() {
        let child = Layer {
            name: "child".into(),
            offset: Vec2::new(1.0, 2.0),
            opacity: 0.5,
            ..Default::default()
        };
        let group = Layer {
            name: "group".into(),
            offset: Vec2::new(10.0, 20.0),
            opacity: 0.5,
            visible: false,
            kind: LayerKind::GroupLayer(GroupLayer(vec![child])),
            ..Default::default()
        };
        let sibling = Layer { name: "sibling".into(), ..Default::default() };
        let layers = vec![group, sibling];
        let walked: Vec<_> = LayerWalk::new(&layers).collect();
        assert_eq!(3, walked.len());
        assert_eq!("child", walked[1].layer.name);
        assert_eq!(1, walked[1].depth);
        assert_eq!(Vec2::new(11.0, 22.0), walked[1].offset);
        assert_eq!(0.25, walked[1].opacity);
        assert!(!walked[1].visible);
        // Stored values stay as declared
        assert_eq!(Vec2::new(1.0, 2.0), walked[1].layer.offset);
        assert_eq!("sibling", walked[2].layer.name);
        assert_eq!(0, walked[2].depth);
        assert!(walked[2].visible);
    }
}
