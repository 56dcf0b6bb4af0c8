//! Coercion of raw attribute text into typed values.
//! Absent optional attributes fall back to their defaults. Present but malformed ones are errors.
use std::str::FromStr;
use roxmltree::Node;
use crate::AssetPath;
use crate::map::{Color, TmxError, TmxResult};

/// Value of a required attribute.
pub(crate) fn attr_str<'a>(node: Node<'a, '_>, name: &str) -> TmxResult<&'a str> {
    node.attribute(name).ok_or_else(|| TmxError::malformed(format!(
        "<{}> is missing attribute '{name}'",
        node.tag_name().name(),
    )))
}

pub(crate) fn parse_value<T: FromStr>(name: &str, value: &str) -> TmxResult<T> {
    value.trim().parse().map_err(|_| TmxError::invalid(name, value))
}

pub(crate) fn attr_parse<T: FromStr>(node: Node, name: &str) -> TmxResult<T> {
    parse_value(name, attr_str(node, name)?)
}

pub(crate) fn attr_parse_or<T: FromStr>(node: Node, name: &str, default: T) -> TmxResult<T> {
    match node.attribute(name) {
        Some(value) => parse_value(name, value),
        None => Ok(default),
    }
}

pub(crate) fn attr_parse_opt<T: FromStr>(node: Node, name: &str) -> TmxResult<Option<T>> {
    node.attribute(name).map(|value| parse_value(name, value)).transpose()
}

pub(crate) fn attr_string_or(node: Node, name: &str, default: &str) -> String {
    String::from(node.attribute(name).unwrap_or(default))
}

/// Accepts `true`/`false` in any case, and the `1`/`0` TMX writes for flags.
pub(crate) fn parse_bool(name: &str, value: &str) -> TmxResult<bool> {
    let trimmed = value.trim();
    if trimmed == "1" || trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    }
    else if trimmed == "0" || trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    }
    else {
        Err(TmxError::invalid(name, value))
    }
}

pub(crate) fn attr_bool_or(node: Node, name: &str, default: bool) -> TmxResult<bool> {
    match node.attribute(name) {
        Some(value) => parse_bool(name, value),
        None => Ok(default),
    }
}

pub(crate) fn attr_color(node: Node, name: &str) -> TmxResult<Option<Color>> {
    match node.attribute(name) {
        Some(value) => Color::parse_hex(value)
            .map(Some)
            .map_err(|_| TmxError::invalid(name, value)),
        None => Ok(None),
    }
}

/// Path attribute resolved against the document it appears in.
pub(crate) fn attr_path(node: Node, name: &str, document: &AssetPath) -> TmxResult<Option<AssetPath>> {
    match node.attribute(name) {
        Some(value) => Ok(Some(document.resolve(value)?)),
        None => Ok(None),
    }
}

/// Parses an enumeration attribute with the parser given.
pub(crate) fn attr_enum_or<T>(
    node: Node,
    name: &str,
    default: T,
    parse: impl Fn(&str) -> TmxResult<T>,
) -> TmxResult<T> {
    match node.attribute(name) {
        Some(value) => parse(value),
        None => Ok(default),
    }
}

/// First child element with the tag name given.
pub(crate) fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.is_element() && child.tag_name().name() == tag)
}

/// All child elements with the tag name given.
pub(crate) fn children<'a, 'input: 'a>(node: Node<'a, 'input>, tag: &'a str) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |child| child.is_element() && child.tag_name().name() == tag)
}

#[cfg(test)]
mod test {
    use roxmltree::Document;
    use crate::map::{Color, TmxError};
    use super::*;

    #[test]
    fn defaults_when_absent() {
        let doc = Document::parse("<layer/>").unwrap();
        let node = doc.root_element();
        assert_eq!(1.0f32, attr_parse_or(node, "opacity", 1.0).unwrap());
        assert!(attr_bool_or(node, "visible", true).unwrap());
        assert_eq!(None, attr_color(node, "tintcolor").unwrap());
        assert_eq!("", attr_string_or(node, "name", ""));
        assert!(matches!(attr_parse::<u32>(node, "width"), Err(TmxError::MalformedDocument { .. })));
    }

    #[test]
    fn malformed_when_present() {
        let doc = Document::parse(r##"<layer opacity="half" visible="maybe" tintcolor="#zz0000" width="-3"/>"##).unwrap();
        let node = doc.root_element();
        assert!(matches!(attr_parse_or(node, "opacity", 1.0f32), Err(TmxError::InvalidAttribute { .. })));
        assert!(matches!(attr_bool_or(node, "visible", true), Err(TmxError::InvalidAttribute { .. })));
        assert!(matches!(attr_color(node, "tintcolor"), Err(TmxError::InvalidAttribute { .. })));
        assert!(matches!(attr_parse::<u32>(node, "width"), Err(TmxError::InvalidAttribute { .. })));
    }

    #[test]
    fn bools() {
        assert!(parse_bool("b", "TRUE").unwrap());
        assert!(parse_bool("b", "1").unwrap());
        assert!(!parse_bool("b", "False").unwrap());
        assert!(!parse_bool("b", "0").unwrap());
        assert!(parse_bool("b", "yes").is_err());
    }

    #[test]
    fn colors() {
        let doc = Document::parse(r##"<map backgroundcolor="#ff0000"/>"##).unwrap();
        let color = attr_color(doc.root_element(), "backgroundcolor").unwrap();
        assert_eq!(Some(Color::new(1.0, 0.0, 0.0, 1.0)), color);
    }

    #[test]
    fn children_by_tag() {
        let doc = Document::parse("<a><b/><c/><b/></a>").unwrap();
        let node = doc.root_element();
        assert_eq!(2, children(node, "b").count());
        assert!(child(node, "c").is_some());
        assert!(child(node, "d").is_none());
    }
}
