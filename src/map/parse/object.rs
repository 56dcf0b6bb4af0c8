use glam::Vec2;
use roxmltree::{Document, Node};
use crate::AssetPath;
use crate::map::{
    tileset_index, Gid, HorizontalAlignment, MapObject, ObjectShape, Text,
    TmxError, TmxResult, VerticalAlignment,
};
use super::attr::*;
use super::{properties_of, ParseContext, Scope, TilesetEntry};

/// Whether an object, or the template it came from, gave each dimension explicitly.
#[derive(Copy, Clone, Default, Debug)]
pub(crate) struct DeclaredSize {
    width: bool,
    height: bool,
}

/// Template object as cached for the rest of a load.
#[derive(Clone, Debug)]
pub(crate) struct TemplateObject {
    pub object: MapObject,
    pub declared: DeclaredSize,
}

/// Parses an `<object>`, applying its template first if it names one.
pub(crate) fn parse_object(object_node: Node, scope: Scope, ctx: &mut ParseContext) -> TmxResult<MapObject> {
    parse_object_declared(object_node, scope, ctx).map(|(object, _)| object)
}

fn parse_object_declared(
    object_node: Node,
    scope: Scope,
    ctx: &mut ParseContext,
) -> TmxResult<(MapObject, DeclaredSize)> {
    let (base, base_declared) = match attr_path(object_node, "template", scope.document)? {
        Some(path) => {
            let TemplateObject { mut object, declared } = load_template(&path, scope, ctx)?;
            object.template = Some(path);
            (object, declared)
        },
        None => (MapObject::default(), DeclaredSize::default()),
    };
    let class = object_node.attribute("class").or(object_node.attribute("type"));
    let mut object = MapObject {
        id: attr_parse_or(object_node, "id", base.id)?,
        name: object_node.attribute("name").map(String::from).unwrap_or(base.name),
        class: class.map(String::from).unwrap_or(base.class),
        x: attr_parse_or(object_node, "x", base.x)?,
        y: attr_parse_or(object_node, "y", base.y)?,
        width: attr_parse_or(object_node, "width", base.width)?,
        height: attr_parse_or(object_node, "height", base.height)?,
        rotation: attr_parse_or(object_node, "rotation", base.rotation)?,
        visible: attr_bool_or(object_node, "visible", base.visible)?,
        gid: attr_parse_opt(object_node, "gid")?.map(Gid).or(base.gid),
        shape: parse_shape(object_node)?.unwrap_or(base.shape),
        template: base.template,
        properties: base.properties.merged(&properties_of(object_node, scope.document)?),
    };
    let declared = DeclaredSize {
        width: base_declared.width || object_node.attribute("width").is_some(),
        height: base_declared.height || object_node.attribute("height").is_some(),
    };

    // Tile objects take the size of their tile unless one was given
    if let Some(gid) = object.gid {
        let (tile_width, tile_height) = tile_size(gid, scope);
        if !declared.width { object.width = tile_width }
        if !declared.height { object.height = tile_height }
    }
    Ok((object, declared))
}

/// Size of the tile a gid refers to. Zero if no tileset covers it.
fn tile_size(gid: Gid, scope: Scope) -> (f32, f32) {
    let tile_id = gid.tile_id();
    match tileset_index(scope.tilesets, tile_id) {
        Some(index) => {
            let tileset = &scope.tilesets[index];
            let (width, height) = tileset.tile_size(tile_id - tileset.first_gid);
            (width as f32, height as f32)
        },
        None => (0.0, 0.0),
    }
}

fn parse_shape(object_node: Node) -> TmxResult<Option<ObjectShape>> {
    for child in object_node.children().filter(Node::is_element) {
        let shape = match child.tag_name().name() {
            "ellipse" => ObjectShape::Ellipse,
            "point" => ObjectShape::Point,
            "polygon" => ObjectShape::Polygon(parse_points(attr_str(child, "points")?)?),
            "polyline" => ObjectShape::Polyline(parse_points(attr_str(child, "points")?)?),
            "text" => ObjectShape::Text(Box::new(parse_text(child)?)),
            _ => continue,
        };
        return Ok(Some(shape));
    }
    Ok(None)
}

/// Parses points in the form `x1,y1 x2,y2 ...`.
fn parse_points(text: &str) -> TmxResult<Vec<Vec2>> {
    text.split_whitespace()
        .map(|pair| {
            let (x, y) = pair.split_once(',').ok_or_else(|| TmxError::invalid("points", text))?;
            let x: f32 = parse_value("points", x)?;
            let y: f32 = parse_value("points", y)?;
            Ok(Vec2::new(x, y))
        })
        .collect()
}

fn parse_text(text_node: Node) -> TmxResult<Text> {
    let defaults = Text::default();
    Ok(Text {
        contents: String::from(text_node.text().unwrap_or("")),
        font_family: attr_string_or(text_node, "fontfamily", &defaults.font_family),
        pixel_size: attr_parse_or(text_node, "pixelsize", defaults.pixel_size)?,
        wrap: attr_bool_or(text_node, "wrap", defaults.wrap)?,
        color: attr_color(text_node, "color")?.unwrap_or(defaults.color),
        bold: attr_bool_or(text_node, "bold", defaults.bold)?,
        italic: attr_bool_or(text_node, "italic", defaults.italic)?,
        underline: attr_bool_or(text_node, "underline", defaults.underline)?,
        strikeout: attr_bool_or(text_node, "strikeout", defaults.strikeout)?,
        kerning: attr_bool_or(text_node, "kerning", defaults.kerning)?,
        halign: attr_enum_or(text_node, "halign", defaults.halign, |value| match value {
            "left" => Ok(HorizontalAlignment::Left),
            "center" => Ok(HorizontalAlignment::Center),
            "right" => Ok(HorizontalAlignment::Right),
            "justify" => Ok(HorizontalAlignment::Justify),
            _ => Err(TmxError::invalid("halign", value)),
        })?,
        valign: attr_enum_or(text_node, "valign", defaults.valign, |value| match value {
            "top" => Ok(VerticalAlignment::Top),
            "center" => Ok(VerticalAlignment::Center),
            "bottom" => Ok(VerticalAlignment::Bottom),
            _ => Err(TmxError::invalid("valign", value)),
        })?,
    })
}

/// Object declared by a template document, cached for the rest of the load.
fn load_template(path: &AssetPath, scope: Scope, ctx: &mut ParseContext) -> TmxResult<TemplateObject> {
    let hash = ctx.source.hash(path);
    if let Some(template) = ctx.templates.get(&hash) {
        return Ok(template.clone());
    }
    if ctx.loading_templates.contains(&hash) {
        return Err(TmxError::malformed(format!("Template {path} is instantiated from itself")));
    }
    ctx.loading_templates.push(hash);
    let loaded = read_template(path, scope, ctx);
    ctx.loading_templates.pop();
    let template = loaded?;
    log::debug!("Loaded template {path}");
    ctx.templates.insert(hash, template.clone());
    Ok(template)
}

fn read_template(path: &AssetPath, scope: Scope, ctx: &mut ParseContext) -> TmxResult<TemplateObject> {
    let text = ctx.source.read_text(path)?;
    let doc = Document::parse(&text)?;
    let root = doc.root_element();
    if root.tag_name().name() != "template" {
        return Err(TmxError::malformed(format!("Expected <template> at root of {path}")));
    }

    let mut entries = Vec::new();
    for entry_node in children(root, "tileset") {
        entries.push(TilesetEntry::parse(entry_node, path, ctx)?);
    }
    let Some(object_node) = child(root, "object") else {
        return Err(TmxError::malformed(format!("Template {path} declares no object")));
    };
    let template_scope = Scope::new(path);
    let (mut object, declared) = parse_object_declared(object_node, template_scope, ctx)?;

    // Template gids count from the template's own tileset entries
    if let Some(gid) = object.gid {
        let remapped = remap_template_gid(gid, &entries, scope)?;
        let (tile_width, tile_height) = tile_size(remapped, scope);
        if !declared.width { object.width = tile_width }
        if !declared.height { object.height = tile_height }
        object.gid = Some(remapped);
    }
    Ok(TemplateObject { object, declared })
}

/// Maps a gid from a template's tileset numbering to the map's.
fn remap_template_gid(gid: Gid, entries: &[TilesetEntry], scope: Scope) -> TmxResult<Gid> {
    if gid.is_empty() { return Ok(gid) }
    let tile_id = gid.tile_id();
    let entry = entries.iter()
        .filter(|entry| entry.first_gid() <= tile_id)
        .max_by_key(|entry| entry.first_gid())
        .ok_or(TmxError::GidOutOfRange { tile_id })?;
    let TilesetEntry::External { first_gid, source } = entry else {
        return Err(TmxError::malformed("Template tilesets must be external documents"));
    };
    let tileset = scope.tilesets.iter()
        .find(|tileset| tileset.source.as_ref() == Some(source))
        .ok_or_else(|| TmxError::malformed(format!("Template tileset {source} is not used by the map")))?;
    Ok(gid.with_tile_id(tile_id - first_gid + tileset.first_gid))
}
