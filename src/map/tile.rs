use smallvec::SmallVec;
use crate::URect;
use super::{Gid, Image, ObjectGroup, Properties};

/// Definition of a single tile within a tileset.
/// Only tiles that declare something beyond the tileset defaults get one.
#[derive(Clone, Default, Debug)]
pub struct Tile {
    /// ID of tile local to its tileset
    pub id: u32,
    /// Type, called class in newer documents.
    pub class: String,
    pub probability: f32,
    /// Image of the tile in image collection tilesets.
    pub image: Option<Image>,
    /// Sub-rectangle of `image` to use. The whole image when absent.
    pub image_rect: Option<URect>,
    /// Collision shapes, in pixels relative to the tile's top-left.
    pub collision: Option<ObjectGroup>,
    pub animation: Option<Animation>,
    pub properties: Properties,
}

/// Single step of a tile animation, in tileset-local ids.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Frame {
    pub tile_id: u32,
    /// Milliseconds
    pub duration: u32,
}

/// Cyclic sequence of frames.
/// Never empty.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Animation {
    frames: SmallVec<[Frame; 4]>,
}

impl Animation {

    /// None if there are no frames.
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Option<Self> {
        let frames: SmallVec<[Frame; 4]> = frames.into_iter().collect();
        if frames.is_empty() { return None }
        Some(Self { frames })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Length of one full cycle in milliseconds.
    pub fn total_duration(&self) -> u64 {
        self.frames.iter().map(|frame| frame.duration as u64).sum()
    }

    /// Frame showing after `elapsed_ms` of playback, wrapping around at the end.
    pub fn frame_at(&self, elapsed_ms: u64) -> &Frame {
        let total = self.total_duration();
        if total == 0 { return &self.frames[0] }
        let mut remaining = elapsed_ms % total;
        for frame in &self.frames {
            if remaining < frame.duration as u64 {
                return frame;
            }
            remaining -= frame.duration as u64;
        }
        &self.frames[0]
    }

    /// Index of the frame that follows the one given.
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.frames.len()
    }
}

/// Frame of an animation resolved to map-wide ids.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct AnimationFrame {
    pub gid: Gid,
    /// Milliseconds. None for tiles that are not animated and show forever.
    pub duration: Option<u32>,
}
