use std::f32::consts::TAU;
use glam::Vec2;
use crate::{rotate_points, AssetPath, Rect};
use super::{Color, Gid, Properties, TmxError, TmxResult};

/// Object placed in an object group or a tile's collision group.
/// Geometry is stored exactly as declared. Rotation is never pre-applied;
/// [`MapObject::outline`] and friends apply it on demand.
#[derive(Clone, Debug)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    /// Type, called class in newer documents.
    pub class: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Degrees, clockwise, about (x, y).
    pub rotation: f32,
    pub visible: bool,
    /// Set for tile objects.
    pub gid: Option<Gid>,
    pub shape: ObjectShape,
    /// Template the object was instantiated from.
    pub template: Option<AssetPath>,
    pub properties: Properties,
}

impl Default for MapObject {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            class: String::new(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            visible: true,
            gid: None,
            shape: ObjectShape::Rectangle,
            template: None,
            properties: Properties::default(),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum ObjectShape {
    Rectangle,
    /// Fits the object's bounding rectangle.
    Ellipse,
    Point,
    /// Closed. Points are relative to the object's position.
    Polygon(Vec<Vec2>),
    /// Open. Points are relative to the object's position.
    Polyline(Vec<Vec2>),
    Text(Box<Text>),
}

#[derive(Clone, PartialEq, Debug)]
pub struct Text {
    pub contents: String,
    pub font_family: String,
    pub pixel_size: u32,
    pub wrap: bool,
    pub color: Color,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub kerning: bool,
    pub halign: HorizontalAlignment,
    pub valign: VerticalAlignment,
}

impl Default for Text {
    fn default() -> Self {
        Self {
            contents: String::new(),
            font_family: String::from("sans-serif"),
            pixel_size: 16,
            wrap: false,
            color: Color::BLACK,
            bold: false,
            italic: false,
            underline: false,
            strikeout: false,
            kerning: true,
            halign: HorizontalAlignment::Left,
            valign: VerticalAlignment::Top,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub enum VerticalAlignment {
    #[default]
    Top,
    Center,
    Bottom,
}

/// Segments used when approximating ellipses with polygons.
const ELLIPSE_SEGMENTS: usize = 16;

impl MapObject {

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn is_tile_object(&self) -> bool {
        self.gid.is_some()
    }

    /// Outline of the object in map pixels with rotation applied.
    /// Ellipses are approximated by a polygon. Tile objects are anchored at their bottom-left.
    pub fn outline(&self) -> Vec<Vec2> {
        let origin = self.position();
        let mut points = match &self.shape {
            ObjectShape::Point => vec![origin],
            ObjectShape::Polygon(points) | ObjectShape::Polyline(points) => {
                points.iter().map(|p| origin + *p).collect()
            },
            ObjectShape::Ellipse => {
                let radius = self.size() / 2.0;
                let center = origin + radius;
                (0..ELLIPSE_SEGMENTS)
                    .map(|i| {
                        let theta = TAU * i as f32 / ELLIPSE_SEGMENTS as f32;
                        center + Vec2::new(theta.cos(), theta.sin()) * radius
                    })
                    .collect()
            },
            ObjectShape::Rectangle | ObjectShape::Text(_) => {
                let top_left = if self.is_tile_object() { origin - Vec2::new(0.0, self.height) } else { origin };
                vec![
                    top_left,
                    top_left + Vec2::new(self.width, 0.0),
                    top_left + self.size(),
                    top_left + Vec2::new(0.0, self.height),
                ]
            },
        };
        rotate_points(&mut points, origin, self.rotation);
        points
    }

    /// Axis-aligned bounds of the rotated outline.
    pub fn bounds(&self) -> Rect {
        Rect::enclosing(self.outline()).unwrap_or(Rect::new(self.x, self.y, 0.0, 0.0))
    }

    /// True if the point, in map pixels, lies within the object.
    /// Points and polylines enclose no area and never contain anything.
    pub fn contains_point(&self, point: Vec2) -> bool {
        match &self.shape {
            ObjectShape::Point | ObjectShape::Polyline(_) => false,
            ObjectShape::Ellipse => {
                if self.width <= 0.0 || self.height <= 0.0 { return false }
                // Undo the rotation, then test against the axis-aligned ellipse
                let mut local = [point];
                rotate_points(&mut local, self.position(), -self.rotation);
                let radius = self.size() / 2.0;
                let d = (local[0] - (self.position() + radius)) / radius;
                d.length_squared() <= 1.0
            },
            _ => point_in_polygon(point, &self.outline()),
        }
    }

    /// True if the object's bounds overlap the rectangle.
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        self.bounds().intersects(rect)
    }

    /// True if the bounds of both objects overlap.
    pub fn intersects_object(&self, other: &MapObject) -> bool {
        self.intersects_rect(&other.bounds())
    }

    /// Exact test of the rotated outlines against each other, touching included.
    /// Only convex outlines are supported.
    pub fn intersects_polygon(&self, other: &MapObject) -> TmxResult<bool> {
        let (a, b) = (self.outline(), other.outline());
        for (object, outline) in [(self, &a), (other, &b)] {
            if !is_convex(outline) {
                return Err(TmxError::NonConvexShape { id: object.id });
            }
        }

        // Axis-aligned axes separate degenerate outlines with no edges
        let axes = [Vec2::X, Vec2::Y].into_iter()
            .chain(edge_normals(&a))
            .chain(edge_normals(&b));
        for axis in axes {
            let (min_a, max_a) = project(&a, axis);
            let (min_b, max_b) = project(&b, axis);
            if max_a < min_b || max_b < min_a {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// True if every turn along the outline bends the same way.
/// Straight runs are ignored.
fn is_convex(outline: &[Vec2]) -> bool {
    let len = outline.len();
    if len < 4 { return true }
    let mut winding = 0.0_f32;
    for i in 0..len {
        let (p1, p2, p3) = (outline[i], outline[(i + 1) % len], outline[(i + 2) % len]);
        let cross = (p2 - p1).perp_dot(p3 - p2);
        if cross.abs() <= f32::EPSILON { continue }
        if winding != 0.0 && cross.signum() != winding {
            return false;
        }
        winding = cross.signum();
    }
    true
}

/// Unit normals of each edge of a closed outline. Zero length edges have none.
fn edge_normals(outline: &[Vec2]) -> impl Iterator<Item = Vec2> + '_ {
    (0..outline.len()).filter_map(move |i| {
        let edge = outline[(i + 1) % outline.len()] - outline[i];
        edge.perp().try_normalize()
    })
}

fn project(outline: &[Vec2], axis: Vec2) -> (f32, f32) {
    outline.iter()
        .map(|point| point.dot(axis))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), dot| (min.min(dot), max.max(dot)))
}

/// Ray casting test.
fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    if polygon.len() < 3 { return false }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
