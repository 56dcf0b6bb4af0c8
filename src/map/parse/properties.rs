use roxmltree::Node;
use crate::AssetPath;
use crate::map::{Color, Properties, PropertyValue, TmxError, TmxResult};
use super::attr::{attr_str, child, children, parse_bool, parse_value};

/// Properties declared by the `<properties>` child of an element.
/// Empty if there is none.
pub(crate) fn properties_of(node: Node, document: &AssetPath) -> TmxResult<Properties> {
    match child(node, "properties") {
        Some(properties_node) => parse_properties(properties_node, document),
        None => Ok(Properties::default()),
    }
}

pub(crate) fn parse_properties(properties_node: Node, document: &AssetPath) -> TmxResult<Properties> {
    let mut properties = Properties::new();
    for property_node in children(properties_node, "property") {
        let name = attr_str(property_node, "name")?;
        let value = parse_property(property_node, document)?;
        properties.insert(String::from(name), value);
    }
    Ok(properties)
}

fn parse_property(node: Node, document: &AssetPath) -> TmxResult<PropertyValue> {
    // Multi-line strings are written as text content instead of a value attribute
    let text = node.attribute("value").or_else(|| node.text()).unwrap_or("");
    let kind = node.attribute("type").unwrap_or("string");
    let value = match kind {
        "string" => PropertyValue::String(String::from(text)),
        "int" => PropertyValue::Int(parse_value("value", text)?),
        "float" => PropertyValue::Float(parse_value("value", text)?),
        "bool" => PropertyValue::Bool(parse_bool("value", text)?),
        "color" => match text {
            "" => PropertyValue::Color(Color::TRANSPARENT),
            _ => PropertyValue::Color(Color::parse_hex(text)?),
        },
        "file" => PropertyValue::File(resolve_file(text, document)),
        "object" => PropertyValue::Object(match text {
            "" => 0,
            _ => parse_value("value", text)?,
        }),
        "class" => PropertyValue::Class {
            property_type: String::from(node.attribute("propertytype").unwrap_or("")),
            members: properties_of(node, document)?,
        },
        _ => return Err(TmxError::invalid("type", kind)),
    };
    Ok(value)
}

/// Joins a relative file reference to the document's directory.
/// Unlike document references, file properties may name directories or extensionless files.
fn resolve_file(reference: &str, document: &AssetPath) -> String {
    if reference.is_empty() || reference.starts_with('/') || reference.contains("://") {
        return String::from(reference);
    }
    match document.parent() {
        Some(parent) => format!("{parent}/{reference}"),
        None => String::from(reference),
    }
}

#[cfg(test)]
mod test {
    use roxmltree::Document;
    use crate::AssetPath;
    use crate::map::{Color, PropertyValue, TmxError};
    use super::properties_of;

    fn document() -> AssetPath {
        AssetPath::parse("maps/level.tmx", Some("mem")).unwrap()
    }

    #[test]
    fn typed_values() {
        let xml = r##"
            <map>
                <properties>
                    <property name="title" value="Caves"/>
                    <property name="depth" type="int" value="-3"/>
                    <property name="gravity" type="float" value="9.8"/>
                    <property name="dark" type="bool" value="true"/>
                    <property name="fog" type="color" value="#80ff0000"/>
                    <property name="music" type="file" value="../music/caves.ogg"/>
                    <property name="boss" type="object" value="12"/>
                    <property name="notes">line one
line two</property>
                </properties>
            </map>"##;
        let doc = Document::parse(xml).unwrap();
        let properties = properties_of(doc.root_element(), &document()).unwrap();
        assert_eq!(8, properties.len());
        assert_eq!(Some("Caves"), properties.get_str("title"));
        assert_eq!(Some(-3), properties.get_int("depth"));
        assert_eq!(Some(9.8), properties.get_float("gravity"));
        assert_eq!(Some(true), properties.get_bool("dark"));
        assert_eq!(Some(&PropertyValue::Color(Color::from_rgba8(255, 0, 0, 128))), properties.get("fog"));
        assert_eq!(Some(&PropertyValue::File(String::from("maps/../music/caves.ogg"))), properties.get("music"));
        assert_eq!(Some(&PropertyValue::Object(12)), properties.get("boss"));
        assert_eq!(Some("line one\nline two"), properties.get_str("notes"));
    }

    #[test]
    fn class_members() {
        let xml = r#"
            <tile>
                <properties>
                    <property name="spawn" type="class" propertytype="Spawner">
                        <properties>
                            <property name="rate" type="float" value="0.5"/>
                        </properties>
                    </property>
                </properties>
            </tile>"#;
        let doc = Document::parse(xml).unwrap();
        let properties = properties_of(doc.root_element(), &document()).unwrap();
        let Some(PropertyValue::Class { property_type, members }) = properties.get("spawn") else {
            panic!("Expected class property");
        };
        assert_eq!("Spawner", property_type);
        assert_eq!(Some(0.5), members.get_float("rate"));
    }

    #[test]
    fn missing_properties_are_empty() {
        let doc = Document::parse("<layer/>").unwrap();
        assert!(properties_of(doc.root_element(), &document()).unwrap().is_empty());
    }

    #[test]
    fn malformed_values() {
        let doc = Document::parse(r#"<a><properties><property name="n" type="int" value="x"/></properties></a>"#).unwrap();
        let result = properties_of(doc.root_element(), &document());
        assert!(matches!(result, Err(TmxError::InvalidAttribute { .. })));
        let doc = Document::parse(r#"<a><properties><property name="n" type="vector" value="1"/></properties></a>"#).unwrap();
        let result = properties_of(doc.root_element(), &document());
        assert!(matches!(result, Err(TmxError::InvalidAttribute { .. })));
    }
}
