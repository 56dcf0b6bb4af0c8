//! Builds the map model from element trees.
//! Each file handles one part of a TMX, TSX or TX document.
mod attr;
mod properties;
mod data;
mod tileset;
mod object;
mod layer;
mod map;

pub(crate) use properties::*;
pub(crate) use tileset::*;
pub(crate) use object::*;
pub(crate) use layer::*;
pub(crate) use map::*;

use crate::{AssetPath, DocumentSource, HashMap, PathHash};
use crate::map::Tileset;

/// State that lives for one load pass.
pub(crate) struct ParseContext<'s> {
    pub source: &'s DocumentSource,
    /// Template objects already loaded, with their tile ids remapped to the map's tilesets.
    pub templates: HashMap<PathHash, TemplateObject>,
    /// Templates currently being loaded, innermost last.
    pub loading_templates: Vec<PathHash>,
}

impl<'s> ParseContext<'s> {
    pub fn new(source: &'s DocumentSource) -> Self {
        Self { source, templates: HashMap::default(), loading_templates: Vec::new() }
    }
}

/// Where an element being parsed lives.
#[derive(Copy, Clone)]
pub(crate) struct Scope<'a> {
    /// Document relative references resolve against.
    pub document: &'a AssetPath,
    /// Tilesets of the map, sorted by first gid. Empty while tilesets themselves are parsed.
    pub tilesets: &'a [Tileset],
}

impl<'a> Scope<'a> {
    pub fn new(document: &'a AssetPath) -> Self {
        Self { document, tilesets: &[] }
    }
}
