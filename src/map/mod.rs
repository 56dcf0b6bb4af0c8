mod error;
mod gid;
mod color;
mod properties;
mod orientation;
mod tile;
mod tileset;
mod layer;
mod object;
mod map;
mod tmx;
mod parse;

pub use error::*;
pub use gid::*;
pub use color::*;
pub use properties::*;
pub use orientation::*;
pub use tile::*;
pub use tileset::*;
pub use layer::*;
pub use object::*;
pub use map::*;
pub use tmx::*;
