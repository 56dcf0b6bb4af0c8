use roxmltree::{Document, Node};
use crate::{AssetPath, IntMap, URect};
use crate::map::{
    Animation, FillMode, Frame, Gid, Grid, Image, ObjectAlignment, Orientation,
    Tile, TileOffset, TileRenderSize, Tileset, TmxError, TmxResult,
};
use super::attr::*;
use super::{parse_object_group, properties_of, ParseContext, Scope};

/// A single tileset declared by a map or template.
/// Either stores the tileset, or references it in another document.
#[derive(Clone, Debug)]
pub(crate) enum TilesetEntry {
    Internal {
        tileset: Tileset,
    },
    External {
        first_gid: u32,
        source: AssetPath,
    }
}

impl TilesetEntry {

    pub fn parse(entry_node: Node, document: &AssetPath, ctx: &mut ParseContext) -> TmxResult<Self> {
        let first_gid: u32 = attr_parse(entry_node, "firstgid")?;
        match attr_path(entry_node, "source", document)? {
            Some(source) => Ok(Self::External { first_gid, source }),
            None => {
                let tileset = parse_tileset(entry_node, first_gid, document, ctx)?;
                Ok(Self::Internal { tileset })
            },
        }
    }

    pub fn first_gid(&self) -> u32 {
        match self {
            Self::Internal { tileset } => tileset.first_gid,
            Self::External { first_gid, .. } => *first_gid,
        }
    }

    /// Loads the referenced document if external.
    pub fn resolve(self, ctx: &mut ParseContext) -> TmxResult<Tileset> {
        match self {
            Self::Internal { tileset } => Ok(tileset),
            Self::External { first_gid, source } => {
                let text = ctx.source.read_text(&source)?;
                let mut tileset = parse_tileset_doc(&text, &source, first_gid, ctx)?;
                tileset.source = Some(source);
                Ok(tileset)
            },
        }
    }
}

/// Parses a TSX document.
pub(crate) fn parse_tileset_doc(
    text: &str,
    document: &AssetPath,
    first_gid: u32,
    ctx: &mut ParseContext,
) -> TmxResult<Tileset> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();
    if root.tag_name().name() != "tileset" {
        return Err(TmxError::malformed(format!("Expected <tileset> at root of {document}")));
    }
    let tileset = parse_tileset(root, first_gid, document, ctx)?;
    log::debug!("Resolved tileset '{}' from {document}", tileset.name);
    Ok(tileset)
}

pub(crate) fn parse_tileset(
    tileset_node: Node,
    first_gid: u32,
    document: &AssetPath,
    ctx: &mut ParseContext,
) -> TmxResult<Tileset> {
    let mut tileset = Tileset {
        first_gid,
        name: attr_string_or(tileset_node, "name", ""),
        class: attr_string_or(tileset_node, "class", ""),
        tile_width: attr_parse_or(tileset_node, "tilewidth", 0)?,
        tile_height: attr_parse_or(tileset_node, "tileheight", 0)?,
        spacing: attr_parse_or(tileset_node, "spacing", 0)?,
        margin: attr_parse_or(tileset_node, "margin", 0)?,
        tile_count: 0,
        columns: attr_parse_or(tileset_node, "columns", 0)?,
        object_alignment: attr_enum_or(tileset_node, "objectalignment", ObjectAlignment::Unspecified, ObjectAlignment::parse)?,
        tile_render_size: attr_enum_or(tileset_node, "tilerendersize", TileRenderSize::Tile, TileRenderSize::parse)?,
        fill_mode: attr_enum_or(tileset_node, "fillmode", FillMode::Stretch, FillMode::parse)?,
        properties: properties_of(tileset_node, document)?,
        ..Default::default()
    };
    let declared_count: Option<u32> = attr_parse_opt(tileset_node, "tilecount")?;

    // Parses children
    let scope = Scope::new(document);
    let mut tiles = IntMap::default();
    for child in tileset_node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "image" => tileset.image = Some(parse_image(child, document)?),
            "tileoffset" => tileset.tile_offset = TileOffset {
                x: attr_parse_or(child, "x", 0)?,
                y: attr_parse_or(child, "y", 0)?,
            },
            "grid" => tileset.grid = Some(Grid {
                orientation: attr_enum_or(child, "orientation", Orientation::Orthogonal, Orientation::parse)?,
                width: attr_parse(child, "width")?,
                height: attr_parse(child, "height")?,
            }),
            "tile" => {
                let tile = parse_tile(child, scope, ctx)?;
                tiles.insert(tile.id, tile);
            },
            "properties" => {},
            other => log::trace!("Skipping <{other}> in tileset '{}'", tileset.name),
        }
    }
    tileset.tiles = tiles;

    // Derives layout the document left out
    match tileset.image.as_ref().map(|image| (image.width, image.height)) {
        Some((image_width, image_height)) => {
            if tileset.columns == 0 {
                tileset.columns = image_width
                    .and_then(|width| tileset.columns_for_width(width))
                    .filter(|&columns| columns > 0)
                    .ok_or_else(|| TmxError::invalid("columns", image_width.unwrap_or(0).to_string()))?;
            }
            tileset.tile_count = match declared_count {
                Some(count) => count,
                None => image_height
                    .and_then(|height| tileset.rows_for_height(height))
                    .and_then(|rows| rows.checked_mul(tileset.columns))
                    .ok_or_else(|| TmxError::invalid("tilecount", ""))?,
            };
        },
        None => {
            let implied = tileset.tiles.keys().max().map(|id| id + 1).unwrap_or(0);
            tileset.tile_count = declared_count.unwrap_or(implied);
        },
    }
    check_gid_range(&tileset)?;
    Ok(tileset)
}

/// Global ids must start at 1 and end before the flag bits.
fn check_gid_range(tileset: &Tileset) -> TmxResult<()> {
    if tileset.first_gid == 0 {
        return Err(TmxError::invalid("firstgid", "0"));
    }
    let end = tileset.first_gid as u64 + tileset.tile_count as u64;
    if end > Gid::MAX_TILE_ID as u64 + 1 {
        return Err(TmxError::invalid("firstgid", format!(
            "{} with {} tiles",
            tileset.first_gid,
            tileset.tile_count,
        )));
    }
    Ok(())
}

pub(crate) fn parse_image(image_node: Node, document: &AssetPath) -> TmxResult<Image> {
    let Some(source) = attr_path(image_node, "source", document)? else {
        return Err(TmxError::malformed("Images embedded in documents are not supported"));
    };
    Ok(Image {
        format: image_node.attribute("format").map(String::from),
        source,
        trans: attr_color(image_node, "trans")?,
        width: attr_parse_opt(image_node, "width")?,
        height: attr_parse_opt(image_node, "height")?,
    })
}

fn parse_tile(tile_node: Node, scope: Scope, ctx: &mut ParseContext) -> TmxResult<Tile> {
    let class = tile_node.attribute("class").or(tile_node.attribute("type")).unwrap_or("");
    let mut tile = Tile {
        id: attr_parse(tile_node, "id")?,
        class: String::from(class),
        probability: attr_parse_or(tile_node, "probability", 1.0)?,
        properties: properties_of(tile_node, scope.document)?,
        ..Default::default()
    };
    for child in tile_node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "image" => tile.image = Some(parse_image(child, scope.document)?),
            "objectgroup" => tile.collision = Some(parse_object_group(child, scope, ctx)?),
            "animation" => {
                let frames = children(child, "frame")
                    .map(|frame_node| Ok(Frame {
                        tile_id: attr_parse(frame_node, "tileid")?,
                        duration: attr_parse(frame_node, "duration")?,
                    }))
                    .collect::<TmxResult<Vec<_>>>()?;
                tile.animation = Animation::new(frames);
            },
            _ => {},
        }
    }

    // Sub-rectangle of a collection tile's image
    let width: Option<u32> = attr_parse_opt(tile_node, "width")?;
    let height: Option<u32> = attr_parse_opt(tile_node, "height")?;
    if let (Some(width), Some(height)) = (width, height) {
        tile.image_rect = Some(URect {
            x: attr_parse_or(tile_node, "x", 0)?,
            y: attr_parse_or(tile_node, "y", 0)?,
            width,
            height,
        });
    }
    Ok(tile)
}

#[cfg(test)]
mod test {
    use roxmltree::Document;
    use crate::{AssetPath, DocumentSource, MemProtocol, URect};
    use crate::map::{Color, Gid, ObjectShape, Orientation, TileOffset, TmxError};
    use super::super::ParseContext;
    use super::{parse_tileset, parse_tileset_doc, TilesetEntry};

    fn source() -> DocumentSource {
        DocumentSource::builder()
            .default_protocol(MemProtocol::new().with("maps/tiles/terrain.tsx", TERRAIN))
            .build()
    }

    fn map_path() -> AssetPath {
        AssetPath::parse("maps/level.tmx", Some("mem")).unwrap()
    }

    const TERRAIN: &str = r##"
        <tileset version="1.10" name="terrain" tilewidth="16" tileheight="16" spacing="2" margin="1">
            <tileoffset x="0" y="4"/>
            <grid orientation="isometric" width="32" height="16"/>
            <image source="terrain.png" trans="ff00ff" width="72" height="55"/>
            <properties>
                <property name="solid" type="bool" value="false"/>
            </properties>
            <tile id="3" type="water" probability="0.5">
                <properties>
                    <property name="solid" type="bool" value="true"/>
                </properties>
                <objectgroup draworder="index">
                    <object id="1" x="0" y="8" width="16" height="8"/>
                    <object id="2" x="0" y="0"><ellipse/></object>
                </objectgroup>
                <animation>
                    <frame tileid="3" duration="100"/>
                    <frame tileid="4" duration="100"/>
                </animation>
            </tile>
        </tileset>"##;

    #[test]
    fn derives_layout_from_image() {
        let source = source();
        let mut ctx = ParseContext::new(&source);
        let path = AssetPath::parse("maps/tiles/terrain.tsx", Some("mem")).unwrap();
        let tileset = parse_tileset_doc(TERRAIN, &path, 1, &mut ctx).unwrap();
        assert_eq!("terrain", tileset.name);
        assert_eq!(4, tileset.columns);
        assert_eq!(12, tileset.tile_count);
        assert_eq!(TileOffset { x: 0, y: 4 }, tileset.tile_offset);
        assert_eq!(Orientation::Isometric, tileset.grid.unwrap().orientation);
        let image = tileset.image.as_ref().unwrap();
        assert_eq!("maps/tiles/terrain.png", image.source.without_protocol());
        assert_eq!(Some(Color::from_rgba8(255, 0, 255, 255)), image.trans);
        assert_eq!(Some(false), tileset.properties.get_bool("solid"));
    }

    #[test]
    fn tile_definitions() {
        let source = source();
        let mut ctx = ParseContext::new(&source);
        let path = AssetPath::parse("maps/tiles/terrain.tsx", Some("mem")).unwrap();
        let tileset = parse_tileset_doc(TERRAIN, &path, 1, &mut ctx).unwrap();
        let tile = tileset.tile(3).unwrap();
        assert_eq!("water", tile.class);
        assert_eq!(0.5, tile.probability);
        assert_eq!(Some(true), tile.properties.get_bool("solid"));
        let collision = tile.collision.as_ref().unwrap();
        assert_eq!(2, collision.objects.len());
        assert_eq!(ObjectShape::Ellipse, collision.objects[1].shape);
        let animation = tile.animation.as_ref().unwrap();
        assert_eq!(2, animation.frames().len());
        assert!(tileset.tile(0).is_none());
    }

    #[test]
    fn external_entry() {
        let source = source();
        let mut ctx = ParseContext::new(&source);
        let doc = Document::parse(r#"<tileset firstgid="40" source="tiles/terrain.tsx"/>"#).unwrap();
        let entry = TilesetEntry::parse(doc.root_element(), &map_path(), &mut ctx).unwrap();
        assert_eq!(40, entry.first_gid());
        let tileset = entry.resolve(&mut ctx).unwrap();
        assert_eq!(40, tileset.first_gid);
        assert_eq!(40..52, tileset.gid_range());
        assert_eq!("maps/tiles/terrain.tsx", tileset.source.unwrap().without_protocol());
    }

    #[test]
    fn missing_external_document() {
        let source = source();
        let mut ctx = ParseContext::new(&source);
        let doc = Document::parse(r#"<tileset firstgid="1" source="missing.tsx"/>"#).unwrap();
        let entry = TilesetEntry::parse(doc.root_element(), &map_path(), &mut ctx).unwrap();
        assert!(matches!(entry.resolve(&mut ctx), Err(TmxError::UnresolvedReference(_))));
    }

    #[test]
    fn image_collection() {
        let source = source();
        let mut ctx = ParseContext::new(&source);
        let xml = r#"
            <tileset firstgid="1" name="props" tilewidth="64" tileheight="64" columns="0">
                <tile id="0"><image source="barrel.png" width="32" height="48"/></tile>
                <tile id="4" x="8" y="0" width="16" height="16"><image source="sheet.png" width="64" height="64"/></tile>
            </tileset>"#;
        let doc = Document::parse(xml).unwrap();
        let tileset = parse_tileset(doc.root_element(), 1, &map_path(), &mut ctx).unwrap();
        assert!(tileset.is_collection());
        assert_eq!(5, tileset.tile_count);
        assert_eq!((32, 48), tileset.tile_size(0));
        assert_eq!(Some(URect::new(8, 0, 16, 16)), tileset.tile(4).unwrap().image_rect);
        assert_eq!((16, 16), tileset.tile_size(4));
        assert_eq!("maps/barrel.png", tileset.tile(0).unwrap().image.as_ref().unwrap().source.without_protocol());
    }

    #[test]
    fn underivable_columns() {
        let source = source();
        let mut ctx = ParseContext::new(&source);
        let xml = r#"
            <tileset firstgid="1" name="broken" tilewidth="16" tileheight="16">
                <image source="broken.png"/>
            </tileset>"#;
        let doc = Document::parse(xml).unwrap();
        let result = parse_tileset(doc.root_element(), 1, &map_path(), &mut ctx);
        assert!(matches!(result, Err(TmxError::InvalidAttribute { .. })));
    }

    #[test]
    fn gid_range_must_fit() {
        let source = source();
        let mut ctx = ParseContext::new(&source);
        let xml = r#"<tileset name="items" tilewidth="16" tileheight="16" tilecount="4"/>"#;
        let doc = Document::parse(xml).unwrap();
        for first_gid in [0, u32::MAX, Gid::MAX_TILE_ID - 2] {
            let result = parse_tileset(doc.root_element(), first_gid, &map_path(), &mut ctx);
            assert!(matches!(result, Err(TmxError::InvalidAttribute { .. })), "first gid {first_gid}");
        }
        let last = parse_tileset(doc.root_element(), Gid::MAX_TILE_ID - 3, &map_path(), &mut ctx).unwrap();
        assert_eq!(Gid::MAX_TILE_ID + 1, last.gid_range().end);
    }

    #[test]
    fn embedded_images_unsupported() {
        let source = source();
        let mut ctx = ParseContext::new(&source);
        let xml = r#"
            <tileset firstgid="1" name="embedded" tilewidth="16" tileheight="16" columns="1" tilecount="1">
                <image format="png"><data encoding="base64">AAAA</data></image>
            </tileset>"#;
        let doc = Document::parse(xml).unwrap();
        let result = parse_tileset(doc.root_element(), 1, &map_path(), &mut ctx);
        assert!(matches!(result, Err(TmxError::MalformedDocument { .. })));
    }
}
