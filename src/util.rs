use fxhash::FxHashMap;
use glam::Vec2;

/**
 * Hash map with a fast non-cryptographically secure hash function.
 */
pub type HashMap<K, V> = FxHashMap<K, V>;

/**
 * Hash map whose hash function is only suitable for small int types.
 * Outputs the original integer when used.
 */
pub type IntMap<K, V> = identity_hash::IntMap<K, V>;


/// Basic rectangle primitive.
#[derive(Copy, Clone, PartialEq, Default, Debug)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// Smallest rectangle containing all points.
    /// None if there are no points.
    pub fn enclosing(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { origin: min, size: max - min })
    }

    pub fn min(&self) -> Vec2 {
        self.origin
    }

    pub fn max(&self) -> Vec2 {
        self.origin + self.size
    }

    /// True if both rectangles share some area.
    /// Touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x < b_max.x && a_max.x > b_min.x && a_min.y < b_max.y && a_max.y > b_min.y
    }
}

/// Basic rectangle primitive with unsigned integer coordinates.
/// Used for pixel regions of tileset images.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
pub struct URect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl URect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

impl From<URect> for Rect {
    fn from(rect: URect) -> Self {
        Rect::new(rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32)
    }
}

/// Rotates points clockwise (y pointing down) about an origin, in degrees.
pub fn rotate_points(points: &mut [Vec2], origin: Vec2, degrees: f32) {
    if degrees == 0.0 { return }
    let rotation = Vec2::from_angle(degrees.to_radians());
    for point in points {
        *point = origin + rotation.rotate(*point - origin);
    }
}
