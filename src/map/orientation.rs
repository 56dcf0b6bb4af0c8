use glam::{IVec2, Vec2};
use crate::map::TmxError;

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
pub enum Orientation {
    #[default]
    Orthogonal,
    Isometric,
    Staggered,
    Hexagonal,
}

impl Orientation {
    pub fn parse(str: &str) -> Result<Self, TmxError> {
        match str {
            "orthogonal" => Ok(Self::Orthogonal),
            "isometric" => Ok(Self::Isometric),
            "staggered" => Ok(Self::Staggered),
            "hexagonal" => Ok(Self::Hexagonal),
            _ => Err(TmxError::invalid("orientation", str)),
        }
    }
}

/// Order in which tiles are meant to be drawn.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
pub enum RenderOrder {
    #[default]
    RightDown,
    RightUp,
    LeftDown,
    LeftUp,
}

impl RenderOrder {
    pub fn parse(str: &str) -> Result<Self, TmxError> {
        match str {
            "right-down" => Ok(Self::RightDown),
            "right-up" => Ok(Self::RightUp),
            "left-down" => Ok(Self::LeftDown),
            "left-up" => Ok(Self::LeftUp),
            _ => Err(TmxError::invalid("renderorder", str)),
        }
    }
}

/// Axis along which every other row or column is shifted.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
pub enum StaggerAxis {
    X,
    #[default]
    Y,
}

impl StaggerAxis {
    pub fn parse(str: &str) -> Result<Self, TmxError> {
        match str {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            _ => Err(TmxError::invalid("staggeraxis", str)),
        }
    }
}

/// Whether odd or even rows/columns are the shifted ones.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
pub enum StaggerIndex {
    #[default]
    Odd,
    Even,
}

impl StaggerIndex {
    pub fn parse(str: &str) -> Result<Self, TmxError> {
        match str {
            "odd" => Ok(Self::Odd),
            "even" => Ok(Self::Even),
            _ => Err(TmxError::invalid("staggerindex", str)),
        }
    }
}

/// Everything needed to convert between pixel and tile coordinates of a map.
/// Pixel coordinates are in the map's screen space, y pointing down.
/// Tile positions returned by [`GridGeometry::tile_to_pixel`] are the top-left
/// of the tile's bounding box (the top corner for isometric tiles).
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub struct GridGeometry {
    pub orientation: Orientation,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Height of the map in tiles. Isometric maps place tile (0, 0) at x = map_height * tile_width / 2.
    pub map_height: u32,
    pub hex_side_length: u32,
    pub stagger_axis: StaggerAxis,
    pub stagger_index: StaggerIndex,
}

impl GridGeometry {

    pub fn pixel_to_tile(&self, pixel: Vec2) -> IVec2 {
        let tw = self.tile_width.max(1) as f32;
        let th = self.tile_height.max(1) as f32;
        match self.orientation {
            Orientation::Orthogonal => IVec2::new(
                (pixel.x / tw).floor() as i32,
                (pixel.y / th).floor() as i32,
            ),
            Orientation::Isometric => {
                let x = pixel.x - self.isometric_origin_x();
                let tile_y = pixel.y / th;
                let tile_x = x / tw;
                IVec2::new(
                    (tile_y + tile_x).floor() as i32,
                    (tile_y - tile_x).floor() as i32,
                )
            },
            Orientation::Staggered => self.staggered_pixel_to_tile(pixel),
            Orientation::Hexagonal => self.hexagonal_pixel_to_tile(pixel),
        }
    }

    pub fn tile_to_pixel(&self, tile: IVec2) -> Vec2 {
        match self.orientation {
            Orientation::Orthogonal => Vec2::new(
                (tile.x * self.tile_width as i32) as f32,
                (tile.y * self.tile_height as i32) as f32,
            ),
            Orientation::Isometric => Vec2::new(
                (tile.x - tile.y) as f32 * self.tile_width as f32 / 2.0 + self.isometric_origin_x(),
                (tile.x + tile.y) as f32 * self.tile_height as f32 / 2.0,
            ),
            Orientation::Staggered | Orientation::Hexagonal => {
                let p = self.stagger_params();
                if p.stagger_x {
                    let mut y = tile.y * (p.tile_height + p.side_length_y);
                    if p.do_stagger(tile.x) { y += p.row_height; }
                    Vec2::new((tile.x * p.column_width) as f32, y as f32)
                }
                else {
                    let mut x = tile.x * (p.tile_width + p.side_length_x);
                    if p.do_stagger(tile.y) { x += p.column_width; }
                    Vec2::new(x as f32, (tile.y * p.row_height) as f32)
                }
            },
        }
    }

    fn isometric_origin_x(&self) -> f32 {
        self.map_height as f32 * self.tile_width as f32 / 2.0
    }

    fn stagger_params(&self) -> StaggerParams {
        let stagger_x = self.stagger_axis == StaggerAxis::X;
        let hex_side = match self.orientation {
            Orientation::Hexagonal => self.hex_side_length as i32,
            _ => 0,
        };
        let tile_width = (self.tile_width as i32 & !1).max(2);
        let tile_height = (self.tile_height as i32 & !1).max(2);
        let side_length_x = if stagger_x { hex_side } else { 0 };
        let side_length_y = if stagger_x { 0 } else { hex_side };
        let side_offset_x = (tile_width - side_length_x) / 2;
        let side_offset_y = (tile_height - side_length_y) / 2;
        StaggerParams {
            stagger_x,
            stagger_even: self.stagger_index == StaggerIndex::Even,
            tile_width,
            tile_height,
            side_length_x,
            side_length_y,
            side_offset_x,
            side_offset_y,
            column_width: side_offset_x + side_length_x,
            row_height: side_offset_y + side_length_y,
        }
    }

    fn staggered_pixel_to_tile(&self, pixel: Vec2) -> IVec2 {
        let p = self.stagger_params();
        let (mut x, mut y) = (pixel.x, pixel.y);
        if p.stagger_x {
            if p.stagger_even { x -= p.side_offset_x as f32; }
        }
        else if p.stagger_even {
            y -= p.side_offset_y as f32;
        }

        // Grid-aligned tile, then the position within it
        let tw = p.tile_width as f32;
        let th = p.tile_height as f32;
        let mut reference = IVec2::new((x / tw).floor() as i32, (y / th).floor() as i32);
        let rel = Vec2::new(x - reference.x as f32 * tw, y - reference.y as f32 * th);
        p.to_stagger_coords(&mut reference);

        // Corners belong to neighbouring tiles
        let y_pos = rel.x * (th / tw);
        let side_offset_y = p.side_offset_y as f32;
        if side_offset_y - y_pos > rel.y {
            p.top_left(reference)
        }
        else if -side_offset_y + y_pos > rel.y {
            p.top_right(reference)
        }
        else if side_offset_y + y_pos < rel.y {
            p.bottom_left(reference)
        }
        else if side_offset_y * 3.0 - y_pos < rel.y {
            p.bottom_right(reference)
        }
        else {
            reference
        }
    }

    fn hexagonal_pixel_to_tile(&self, pixel: Vec2) -> IVec2 {
        let p = self.stagger_params();
        let (mut x, mut y) = (pixel.x, pixel.y);
        if p.stagger_x {
            x -= if p.stagger_even { p.tile_width } else { p.side_offset_x } as f32;
        }
        else {
            y -= if p.stagger_even { p.tile_height } else { p.side_offset_y } as f32;
        }

        let cell_width = (p.column_width * 2) as f32;
        let cell_height = (p.row_height * 2) as f32;
        let mut reference = IVec2::new((x / cell_width).floor() as i32, (y / cell_height).floor() as i32);
        let rel = Vec2::new(x - reference.x as f32 * cell_width, y - reference.y as f32 * cell_height);
        p.to_stagger_coords(&mut reference);

        // Nearest hexagon center wins
        let column_width = p.column_width as f32;
        let row_height = p.row_height as f32;
        let (centers, offsets) = if p.stagger_x {
            let left = p.side_length_x as f32 / 2.0;
            let center_x = left + column_width;
            let center_y = p.tile_height as f32 / 2.0;
            (
                [
                    Vec2::new(left, center_y),
                    Vec2::new(center_x, center_y - row_height),
                    Vec2::new(center_x, center_y + row_height),
                    Vec2::new(center_x + column_width, center_y),
                ],
                [IVec2::new(0, 0), IVec2::new(1, -1), IVec2::new(1, 0), IVec2::new(2, 0)],
            )
        }
        else {
            let top = p.side_length_y as f32 / 2.0;
            let center_x = p.tile_width as f32 / 2.0;
            let center_y = top + row_height;
            (
                [
                    Vec2::new(center_x, top),
                    Vec2::new(center_x - column_width, center_y),
                    Vec2::new(center_x + column_width, center_y),
                    Vec2::new(center_x, center_y + row_height),
                ],
                [IVec2::new(0, 0), IVec2::new(-1, 1), IVec2::new(0, 1), IVec2::new(0, 2)],
            )
        };
        let mut nearest = 0;
        let mut min_dist = f32::MAX;
        for (i, center) in centers.iter().enumerate() {
            let dist = center.distance_squared(rel);
            if dist < min_dist {
                min_dist = dist;
                nearest = i;
            }
        }
        reference + offsets[nearest]
    }
}

/// Integer measurements shared by staggered and hexagonal maps.
struct StaggerParams {
    stagger_x: bool,
    stagger_even: bool,
    tile_width: i32,
    tile_height: i32,
    side_length_x: i32,
    side_length_y: i32,
    side_offset_x: i32,
    side_offset_y: i32,
    column_width: i32,
    row_height: i32,
}

impl StaggerParams {

    /// True if the row or column at index is shifted.
    fn do_stagger(&self, index: i32) -> bool {
        ((index & 1) == 1) ^ self.stagger_even
    }

    /// Converts grid-aligned coordinates to staggered ones along the stagger axis.
    fn to_stagger_coords(&self, reference: &mut IVec2) {
        let index = if self.stagger_x { &mut reference.x } else { &mut reference.y };
        *index *= 2;
        if self.stagger_even { *index += 1; }
    }

    fn top_left(&self, t: IVec2) -> IVec2 {
        match (self.stagger_x, self.do_stagger(if self.stagger_x { t.x } else { t.y })) {
            (false, true) => IVec2::new(t.x, t.y - 1),
            (false, false) => IVec2::new(t.x - 1, t.y - 1),
            (true, true) => IVec2::new(t.x - 1, t.y),
            (true, false) => IVec2::new(t.x - 1, t.y - 1),
        }
    }

    fn top_right(&self, t: IVec2) -> IVec2 {
        match (self.stagger_x, self.do_stagger(if self.stagger_x { t.x } else { t.y })) {
            (false, true) => IVec2::new(t.x + 1, t.y - 1),
            (false, false) => IVec2::new(t.x, t.y - 1),
            (true, true) => IVec2::new(t.x + 1, t.y),
            (true, false) => IVec2::new(t.x + 1, t.y - 1),
        }
    }

    fn bottom_left(&self, t: IVec2) -> IVec2 {
        match (self.stagger_x, self.do_stagger(if self.stagger_x { t.x } else { t.y })) {
            (false, true) => IVec2::new(t.x, t.y + 1),
            (false, false) => IVec2::new(t.x - 1, t.y + 1),
            (true, true) => IVec2::new(t.x - 1, t.y + 1),
            (true, false) => IVec2::new(t.x - 1, t.y),
        }
    }

    fn bottom_right(&self, t: IVec2) -> IVec2 {
        match (self.stagger_x, self.do_stagger(if self.stagger_x { t.x } else { t.y })) {
            (false, true) => IVec2::new(t.x + 1, t.y + 1),
            (false, false) => IVec2::new(t.x, t.y + 1),
            (true, true) => IVec2::new(t.x + 1, t.y + 1),
            (true, false) => IVec2::new(t.x + 1, t.y),
        }
    }
}
