use std::ops::Range;
use derive_more::*;
use crate::LoadError;

/// Reasons a map can fail to load or a query can fail.
/// Loading stops at the first one encountered.
#[derive(Error, Display, From, Debug)]
pub enum TmxError {
    #[display(fmt="{_0}")]
    Xml(roxmltree::Error),
    #[display(fmt="Malformed document: {reason}")]
    #[from(ignore)]
    MalformedDocument { reason: String },
    #[display(fmt="Invalid value '{value}' for attribute '{name}'")]
    #[from(ignore)]
    InvalidAttribute { name: String, value: String },
    #[display(fmt="Unresolved reference: {_0}")]
    UnresolvedReference(LoadError),
    #[display(fmt="Tile id {tile_id} is not covered by any tileset")]
    #[from(ignore)]
    GidOutOfRange { tile_id: u32 },
    #[display(fmt="Tileset ranges {first:?} and {second:?} overlap")]
    #[from(ignore)]
    OverlappingTilesetRanges { first: Range<u32>, second: Range<u32> },
    #[display(fmt="Object {id} has a concave outline")]
    #[from(ignore)]
    NonConvexShape { id: u32 },
    #[display(fmt="Unsupported encoding '{encoding}'")]
    #[from(ignore)]
    UnsupportedEncoding { encoding: String },
}

impl TmxError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument { reason: reason.into() }
    }

    pub(crate) fn invalid(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidAttribute { name: name.into(), value: value.into() }
    }
}

pub type TmxResult<T> = Result<T, TmxError>;
