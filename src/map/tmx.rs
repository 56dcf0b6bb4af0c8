use roxmltree::Document;
use crate::{AssetPath, DocumentSource, FileProtocol, LoadOptions};
use crate::map::parse::{parse_map, parse_tileset_doc, ParseContext};
use crate::map::{TiledMap, Tileset, TmxResult};

/// Loads TMX maps and TSX tilesets, along with every document they reference.
pub struct TmxLoader {
    source: DocumentSource,
}

impl TmxLoader {

    pub fn new(source: DocumentSource) -> Self {
        Self { source }
    }

    /// Loader reading from the file system.
    pub fn from_files(options: LoadOptions) -> Self {
        let source = DocumentSource::builder()
            .default_protocol(FileProtocol)
            .options(options)
            .build();
        Self { source }
    }

    pub fn source(&self) -> &DocumentSource {
        &self.source
    }

    /// Loads the map at the path given, resolving tilesets and templates relative to it.
    pub fn load(&self, path: &str) -> TmxResult<TiledMap> {
        let path = self.source.path(path)?;
        if !path.has_extension("tmx") {
            log::warn!("Loading {path} as a map despite its extension");
        }
        let text = self.source.read_text(&path)?;
        self.parse_str(&text, &path)
    }

    /// Parses map text as if it was read from the path given.
    pub fn parse_str(&self, text: &str, path: &AssetPath) -> TmxResult<TiledMap> {
        let doc = Document::parse(text)?;
        let mut ctx = ParseContext::new(&self.source);
        let map = parse_map(doc.root_element(), path, &mut ctx)?;
        if self.source.options().validate_gids {
            map.validate_gids()?;
        }
        log::debug!("Loaded map {path}");
        Ok(map)
    }

    /// Loads a standalone tileset, numbering its tiles from `first_gid`.
    pub fn load_tileset(&self, path: &str, first_gid: u32) -> TmxResult<Tileset> {
        let path = self.source.path(path)?;
        let text = self.source.read_text(&path)?;
        let mut ctx = ParseContext::new(&self.source);
        let mut tileset = parse_tileset_doc(&text, &path, first_gid, &mut ctx)?;
        tileset.source = Some(path);
        Ok(tileset)
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use glam::{IVec2, Vec2};
    use crate::{DocumentSource, LoadOptions, MemProtocol};
    use crate::map::*;

    const TERRAIN_TSX: &str = r#"
        <tileset version="1.10" name="terrain" tilewidth="16" tileheight="16" tilecount="16" columns="4">
            <image source="terrain.png" width="64" height="64"/>
            <tile id="1" type="water">
                <animation>
                    <frame tileid="1" duration="250"/>
                    <frame tileid="2" duration="250"/>
                </animation>
            </tile>
        </tileset>"#;

    const ITEMS_TSX: &str = r#"
        <tileset version="1.10" name="items" tilewidth="16" tileheight="16" tilecount="4" columns="0">
            <grid orientation="orthogonal" width="1" height="1"/>
            <tile id="0"><image source="../images/key.png" width="8" height="8"/></tile>
            <tile id="3"><image source="../images/chest.png" width="24" height="16"/></tile>
        </tileset>"#;

    const CHEST_TX: &str = r#"
        <template>
            <tileset firstgid="1" source="tilesets/items.tsx"/>
            <object name="chest" type="container" gid="4">
                <properties><property name="locked" type="bool" value="true"/></properties>
            </object>
        </template>"#;

    fn zlib_layer(cells: &[u32]) -> String {
        let bytes: Vec<u8> = cells.iter().flat_map(|cell| cell.to_le_bytes()).collect();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&bytes).unwrap();
        STANDARD.encode(encoder.finish().unwrap())
    }

    fn level_tmx() -> String {
        let detail = zlib_layer(&[0, 0x8000_0002, 17, 0]);
        format!(r##"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" tiledversion="1.10.2" orientation="orthogonal" renderorder="right-down"
     width="2" height="2" tilewidth="16" tileheight="16" infinite="0"
     backgroundcolor="#202020" nextlayerid="6" nextobjectid="4">
 <editorsettings><export format="tmx"/></editorsettings>
 <properties><property name="title" value="Level 1"/></properties>
 <tileset firstgid="17" source="tilesets/items.tsx"/>
 <tileset firstgid="1" source="tilesets/terrain.tsx"/>
 <layer id="1" name="ground" width="2" height="2">
  <data encoding="csv">5,0,
9,5</data>
 </layer>
 <group id="2" name="decor" offsetx="8" opacity="0.5">
  <layer id="3" name="detail" width="2" height="2" offsety="4">
   <data encoding="base64" compression="zlib">{detail}</data>
  </layer>
  <objectgroup id="4" name="things">
   <object id="1" name="spawn" type="marker" x="8" y="8"><point/></object>
   <object id="2" template="chest.tx" x="16" y="32"/>
   <object id="3" name="zone" x="0" y="0" width="32" height="16" rotation="45">
    <properties><property name="damage" type="int" value="3"/></properties>
   </object>
  </objectgroup>
 </group>
 <imagelayer id="5" name="sky"><image source="../images/sky.png"/></imagelayer>
</map>"##)
    }

    fn loader(level: &str) -> TmxLoader {
        let protocol = MemProtocol::new()
            .with("maps/level.tmx", level)
            .with("maps/tilesets/terrain.tsx", TERRAIN_TSX)
            .with("maps/tilesets/items.tsx", ITEMS_TSX)
            .with("maps/chest.tx", CHEST_TX)
            .with("maps/loop.tx", r#"<template><object name="loop" template="loop.tx"/></template>"#)
            .with("maps/ping.tx", r#"<template><object name="ping" template="pong.tx"/></template>"#)
            .with("maps/pong.tx", r#"<template><object name="pong" template="ping.tx"/></template>"#);
        let source = DocumentSource::builder().default_protocol(protocol).build();
        TmxLoader::new(source)
    }

    #[test]
    fn loads_map_with_external_documents() {
        let map = loader(&level_tmx()).load("maps/level.tmx").unwrap();
        assert_eq!("1.10.2", map.tiled_version);
        assert_eq!((2, 2, 16, 16), (map.width, map.height, map.tile_width, map.tile_height));
        assert_eq!(Some(Color::from_rgba8(0x20, 0x20, 0x20, 255)), map.background_color);
        assert_eq!((6, 4), (map.next_layer_id, map.next_object_id));
        assert_eq!(Some("Level 1"), map.properties.get_str("title"));

        // Sorted by first gid regardless of declaration order
        let names: Vec<_> = map.tilesets.iter().map(|tileset| tileset.name.as_str()).collect();
        assert_eq!(vec!["terrain", "items"], names);
        assert_eq!(1..17, map.tilesets[0].gid_range());
        assert_eq!(17..21, map.tilesets[1].gid_range());
        let key = map.tilesets[1].tile(0).unwrap().image.as_ref().unwrap();
        assert_eq!("maps/images/key.png", key.source.without_protocol());
    }

    #[test]
    fn resolves_tile_layers() {
        let map = loader(&level_tmx()).load("maps/level.tmx").unwrap();
        let ground = map.layer_by_name("ground").unwrap().as_tile_layer().unwrap();
        assert_eq!(Some(Gid(9)), ground.get_tile_gid(0, 1));
        let image_ref = map.tile_image_ref(Gid(9)).unwrap().unwrap();
        assert_eq!(0, image_ref.tileset_index);
        assert_eq!(Some(crate::URect::new(0, 32, 16, 16)), image_ref.rect);

        let detail = map.layer_by_name("detail").unwrap().as_tile_layer().unwrap();
        let flipped = detail.get_tile_gid(1, 0).unwrap();
        assert!(flipped.flags().flip_h());
        assert_eq!(2, flipped.tile_id());
        let key = map.tile_image_ref(detail.get_tile_gid(0, 1).unwrap()).unwrap().unwrap();
        assert_eq!((1, 0, None), (key.tileset_index, key.local_id, key.rect));

        let frames = map.animated_tile_frames(flipped).unwrap();
        assert_eq!(2, frames.len());
        assert_eq!(Gid::encode(TileFlags::FLIP_HORIZONTAL, 3), frames[1].gid);
        assert_eq!(Some(250), frames[1].duration);
    }

    #[test]
    fn group_state_accumulates_without_propagating() {
        let map = loader(&level_tmx()).load("maps/level.tmx").unwrap();
        let detail = map.layer_by_name("detail").unwrap();
        assert_eq!(Vec2::new(0.0, 4.0), detail.offset);
        assert_eq!(1.0, detail.opacity);
        let walked = map.layers_with_offsets().find(|walked| walked.layer.name == "detail").unwrap();
        assert_eq!(Vec2::new(8.0, 4.0), walked.offset);
        assert_eq!(0.5, walked.opacity);
        assert_eq!(1, walked.depth);
        let names: Vec<_> = map.iter_layers().map(|layer| layer.name.as_str()).collect();
        assert_eq!(vec!["ground", "decor", "detail", "things", "sky"], names);
        let sky = map.layer_by_name("sky").unwrap().as_image_layer().unwrap();
        assert_eq!("images/sky.png", sky.image.as_ref().unwrap().source.without_protocol());
    }

    #[test]
    fn objects_and_templates() {
        let map = loader(&level_tmx()).load("maps/level.tmx").unwrap();
        let chest = map.object_by_id(2).unwrap();
        assert_eq!("chest", chest.name);
        assert_eq!(vec![2], map.objects_by_type("container").iter().map(|object| object.id).collect::<Vec<_>>());
        assert_eq!(Some(Gid(20)), chest.gid);
        assert_eq!((24.0, 16.0), (chest.width, chest.height));
        assert_eq!(Some(true), chest.properties.get_bool("locked"));

        let zone = &map.objects_by_name("zone")[0];
        assert_eq!(45.0, zone.rotation);
        assert_eq!((32.0, 16.0), (zone.width, zone.height));
        assert_eq!(Some(3), zone.properties.get_int("damage"));
        assert!(map.objects_by_name("nonexistent").is_empty());
        assert_eq!(ObjectShape::Point, map.objects_by_name("spawn")[0].shape);
    }

    #[test]
    fn rejects_uncovered_gids() {
        let level = level_tmx().replace("9,5</data>", "9,99</data>");
        let result = loader(&level).load("maps/level.tmx");
        assert!(matches!(result, Err(TmxError::GidOutOfRange { tile_id: 99 })));

        let options = LoadOptions { validate_gids: false, ..Default::default() };
        let protocol = MemProtocol::new()
            .with("maps/level.tmx", level)
            .with("maps/tilesets/terrain.tsx", TERRAIN_TSX)
            .with("maps/tilesets/items.tsx", ITEMS_TSX)
            .with("maps/chest.tx", CHEST_TX)
            .with("maps/loop.tx", r#"<template><object name="loop" template="loop.tx"/></template>"#)
            .with("maps/ping.tx", r#"<template><object name="ping" template="pong.tx"/></template>"#)
            .with("maps/pong.tx", r#"<template><object name="pong" template="ping.tx"/></template>"#);
        let source = DocumentSource::builder().default_protocol(protocol).options(options).build();
        let map = TmxLoader::new(source).load("maps/level.tmx").unwrap();
        assert!(map.tile_image_ref(Gid(99)).is_err());
    }

    #[test]
    fn rejects_overlapping_tilesets() {
        let level = level_tmx().replace(r#"firstgid="17""#, r#"firstgid="10""#);
        let result = loader(&level).load("maps/level.tmx");
        assert!(matches!(result, Err(TmxError::OverlappingTilesetRanges { .. })));
    }

    #[test]
    fn rejects_gid_range_past_flag_bits() {
        let level = level_tmx().replace(r#"firstgid="17""#, r#"firstgid="4294967295""#);
        let result = loader(&level).load("maps/level.tmx");
        assert!(matches!(result, Err(TmxError::InvalidAttribute { name, .. }) if name == "firstgid"));
    }

    #[test]
    fn rejects_template_cycles() {
        for template in ["loop.tx", "ping.tx"] {
            let level = level_tmx().replace(r#"template="chest.tx""#, &format!(r#"template="{template}""#));
            let result = loader(&level).load("maps/level.tmx");
            assert!(matches!(result, Err(TmxError::MalformedDocument { .. })), "{template}");
        }
    }

    #[test]
    fn missing_documents() {
        let level = level_tmx().replace("tilesets/terrain.tsx", "tilesets/missing.tsx");
        let result = loader(&level).load("maps/level.tmx");
        assert!(matches!(result, Err(TmxError::UnresolvedReference(_))));
        assert!(matches!(loader("").load("maps/other.tmx"), Err(TmxError::UnresolvedReference(_))));
    }

    #[test]
    fn malformed_documents() {
        assert!(matches!(loader("<map").load("maps/level.tmx"), Err(TmxError::Xml(_))));
        let not_a_map = loader("<tileset/>").load("maps/level.tmx");
        assert!(matches!(not_a_map, Err(TmxError::MalformedDocument { .. })));
    }

    #[test]
    fn infinite_map() {
        let level = r#"
            <map version="1.10" orientation="orthogonal" width="4" height="4" tilewidth="16" tileheight="16" infinite="1">
                <tileset firstgid="1" source="tilesets/terrain.tsx"/>
                <layer id="1" name="ground" width="4" height="4">
                    <data encoding="csv">
                        <chunk x="-16" y="0" width="16" height="16">"#.to_owned()
            + &["3"; 256].join(",")
            + r#"</chunk>
                    </data>
                </layer>
            </map>"#;
        let map = loader(&level).load("maps/level.tmx").unwrap();
        assert!(map.infinite);
        let ground = map.layer_by_name("ground").unwrap().as_tile_layer().unwrap();
        assert!(ground.is_infinite());
        assert_eq!(Some(Gid(3)), ground.get_tile_gid(-1, 15));
        assert_eq!(None, ground.get_tile_gid(0, 0));
        assert_eq!((-16, 0, 0, 16), ground.bounds());
        assert_eq!(256, ground.tiles().count());
    }

    #[test]
    fn hexagonal_map() {
        let level = r#"
            <map orientation="hexagonal" width="4" height="4" tilewidth="32" tileheight="32"
                 hexsidelength="16" staggeraxis="y" staggerindex="odd"/>"#;
        let map = loader(level).load("maps/level.tmx").unwrap();
        assert_eq!(Orientation::Hexagonal, map.orientation);
        let tile = IVec2::new(1, 1);
        let center = map.tile_to_pixel_pos(tile) + Vec2::new(16.0, 16.0);
        assert_eq!(tile, map.pixel_to_tile_pos(center));
    }

    #[test]
    fn standalone_tileset() {
        let tileset = loader("").load_tileset("maps/tilesets/terrain.tsx", 1).unwrap();
        assert_eq!("terrain", tileset.name);
        assert_eq!(16, tileset.tile_count);
        assert!(tileset.tile(1).unwrap().animation.is_some());
    }
}
