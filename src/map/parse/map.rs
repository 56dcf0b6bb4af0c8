use roxmltree::Node;
use crate::AssetPath;
use crate::map::{
    sort_tilesets, Orientation, RenderOrder, StaggerAxis, StaggerIndex,
    TiledMap, TmxError, TmxResult,
};
use super::attr::*;
use super::{is_layer, parse_layer, properties_of, ParseContext, Scope, TilesetEntry};

/// Parses a `<map>` element along with every document it references.
pub(crate) fn parse_map(map_node: Node, document: &AssetPath, ctx: &mut ParseContext) -> TmxResult<TiledMap> {
    if map_node.tag_name().name() != "map" {
        return Err(TmxError::malformed(format!("Expected <map> at root of {document}")));
    }

    // Parses map attributes
    let mut map = TiledMap {
        version: attr_string_or(map_node, "version", ""),
        tiled_version: attr_string_or(map_node, "tiledversion", ""),
        class: attr_string_or(map_node, "class", ""),
        orientation: attr_enum_or(map_node, "orientation", Orientation::Orthogonal, Orientation::parse)?,
        render_order: attr_enum_or(map_node, "renderorder", RenderOrder::RightDown, RenderOrder::parse)?,
        width: attr_parse(map_node, "width")?,
        height: attr_parse(map_node, "height")?,
        tile_width: attr_parse(map_node, "tilewidth")?,
        tile_height: attr_parse(map_node, "tileheight")?,
        hex_side_length: attr_parse_or(map_node, "hexsidelength", 0)?,
        stagger_axis: attr_enum_or(map_node, "staggeraxis", StaggerAxis::default(), StaggerAxis::parse)?,
        stagger_index: attr_enum_or(map_node, "staggerindex", StaggerIndex::default(), StaggerIndex::parse)?,
        infinite: attr_bool_or(map_node, "infinite", false)?,
        background_color: attr_color(map_node, "backgroundcolor")?,
        next_layer_id: attr_parse_or(map_node, "nextlayerid", 0)?,
        next_object_id: attr_parse_or(map_node, "nextobjectid", 0)?,
        properties: properties_of(map_node, document)?,
        source: Some(document.clone()),
        ..Default::default()
    };

    // Tilesets come first since layers consult them
    let mut tilesets = Vec::new();
    for entry_node in children(map_node, "tileset") {
        let entry = TilesetEntry::parse(entry_node, document, ctx)?;
        tilesets.push(entry.resolve(ctx)?);
    }
    sort_tilesets(&mut tilesets)?;

    let mut layers = Vec::new();
    {
        let scope = Scope { document, tilesets: &tilesets };
        for child in map_node.children().filter(Node::is_element) {
            if is_layer(child) {
                layers.push(parse_layer(child, scope, ctx)?);
                continue;
            }
            match child.tag_name().name() {
                "tileset" | "properties" | "editorsettings" => {},
                other => log::warn!("Ignoring unknown element <{other}> in {document}"),
            }
        }
    }
    map.tilesets = tilesets;
    map.layers = layers;
    log::debug!("Parsed map {document} with {} tilesets and {} layers", map.tilesets.len(), map.layers.len());
    Ok(map)
}
