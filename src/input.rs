use crate::geometry::Point;

/// Viewport coordinates pulled out of a DOM pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Mouse { client: Point },
    /// First active touch point of a touch event.
    Touch { first: Point }
}

impl PointerInput {
    pub fn client(&self) -> Point {
        match *self {
            PointerInput::Mouse { client } => client,
            PointerInput::Touch { first } => first
        }
    }
}

/// Map viewport coordinates into logical surface coordinates.
///
/// `origin` is the top-left corner of the surface's bounding box. The drawing
/// context is already scaled, so no device-pixel-ratio correction happens here.
pub fn resolve_point(input: &PointerInput, origin: Point) -> Point {
    let client = input.client();
    Point::new(client.x - origin.x, client.y - origin.y)
}
