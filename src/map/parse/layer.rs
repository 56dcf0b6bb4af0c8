use glam::Vec2;
use roxmltree::Node;
use crate::map::{
    DrawOrder, FiniteTileLayer, Gid, GroupLayer, ImageLayer, Layer, LayerKind,
    ObjectGroup, TileLayer, TileLayerKind, TmxError, TmxResult,
};
use super::attr::*;
use super::data::parse_data;
use super::{parse_image, parse_object, properties_of, ParseContext, Scope};

/// Tags that declare layers.
const LAYER_TAGS: [&str; 4] = ["layer", "objectgroup", "imagelayer", "group"];

pub(crate) fn is_layer(node: Node) -> bool {
    node.is_element() && LAYER_TAGS.contains(&node.tag_name().name())
}

/// Parses a layer element of any kind, recursing into groups.
pub(crate) fn parse_layer(layer_node: Node, scope: Scope, ctx: &mut ParseContext) -> TmxResult<Layer> {
    let kind = match layer_node.tag_name().name() {
        "layer" => LayerKind::TileLayer(parse_tile_layer(layer_node, ctx)?),
        "objectgroup" => LayerKind::ObjectGroup(parse_object_group(layer_node, scope, ctx)?),
        "imagelayer" => LayerKind::ImageLayer(ImageLayer {
            image: child(layer_node, "image").map(|image_node| parse_image(image_node, scope.document)).transpose()?,
            repeat_x: attr_bool_or(layer_node, "repeatx", false)?,
            repeat_y: attr_bool_or(layer_node, "repeaty", false)?,
        }),
        "group" => {
            let mut children = Vec::new();
            for child in layer_node.children().filter(|child| is_layer(*child)) {
                children.push(parse_layer(child, scope, ctx)?);
            }
            LayerKind::GroupLayer(GroupLayer(children))
        },
        other => return Err(TmxError::malformed(format!("<{other}> is not a layer"))),
    };
    let layer = Layer {
        id: attr_parse_or(layer_node, "id", 0)?,
        name: attr_string_or(layer_node, "name", ""),
        class: attr_string_or(layer_node, "class", ""),
        visible: attr_bool_or(layer_node, "visible", true)?,
        opacity: attr_parse_or(layer_node, "opacity", 1.0)?,
        offset: Vec2::new(
            attr_parse_or(layer_node, "offsetx", 0.0)?,
            attr_parse_or(layer_node, "offsety", 0.0)?,
        ),
        parallax: Vec2::new(
            attr_parse_or(layer_node, "parallaxx", 1.0)?,
            attr_parse_or(layer_node, "parallaxy", 1.0)?,
        ),
        tint_color: attr_color(layer_node, "tintcolor")?,
        properties: properties_of(layer_node, scope.document)?,
        kind,
    };
    log::debug!("Built layer '{}'", layer.name);
    Ok(layer)
}

fn parse_tile_layer(layer_node: Node, ctx: &ParseContext) -> TmxResult<TileLayer> {
    let width: u32 = attr_parse(layer_node, "width")?;
    let height: u32 = attr_parse(layer_node, "height")?;
    let options = ctx.source.options();
    let data_node = child(layer_node, "data");

    // Chunked layers are bounded per chunk instead
    let chunked = data_node.is_some_and(|data_node| children(data_node, "chunk").next().is_some());
    let cells = width as u64 * height as u64;
    if !chunked && cells > options.max_layer_cells {
        return Err(TmxError::malformed(format!(
            "Layer of {width}x{height} cells exceeds the limit of {}",
            options.max_layer_cells,
        )));
    }

    let kind = match data_node {
        Some(data_node) => parse_data(data_node, width, height, options.max_chunk_cells)?,
        None => {
            log::warn!("Tile layer without <data>; treating every cell as empty");
            TileLayerKind::FiniteTileLayer(FiniteTileLayer(vec![Gid::EMPTY; cells as usize]))
        },
    };
    Ok(TileLayer { width, height, kind })
}

/// Parses an `<objectgroup>`, either a layer's or a tile's collision shapes.
pub(crate) fn parse_object_group(group_node: Node, scope: Scope, ctx: &mut ParseContext) -> TmxResult<ObjectGroup> {
    let draw_order = attr_enum_or(group_node, "draworder", DrawOrder::TopDown, |value| match value {
        "topdown" => Ok(DrawOrder::TopDown),
        "index" => Ok(DrawOrder::Index),
        _ => Err(TmxError::invalid("draworder", value)),
    })?;
    let mut objects = Vec::new();
    for object_node in children(group_node, "object") {
        objects.push(parse_object(object_node, scope, ctx)?);
    }
    Ok(ObjectGroup {
        color: attr_color(group_node, "color")?,
        draw_order,
        objects,
    })
}
