//! The backend canvas collaborator.
//!
//! This crate never rasterizes anything itself (rasterization is explicitly
//! out of scope). Instead the decoder drives an abstract [`Canvas`]
//! implementation that some raster backend provides — a thin seam mirroring
//! a well-known 2D canvas API. Tests in this crate use a recording fake
//! implementation; see `tests/support`.

use crate::color::Color;
use crate::transform::AffineMatrix;

/// The drawing surface for one layer, as driven by the decoder's context
/// state machine.
///
/// Implementations must not manipulate the transform or the save/restore
/// stack on their own — the decoder owns those transitions and calls
/// `save`/`restore`/`set_matrix` explicitly at the right points. Draw
/// methods should simply rasterize using whatever matrix was last set.
pub trait Canvas {
    /// Pushes the backend's own save stack, keeping it aligned with the
    /// decoder's context stack.
    fn save(&mut self);

    /// Pops the backend's own save stack.
    fn restore(&mut self);

    /// Installs the composite transform matrix. Called exactly once before
    /// each draw operation.
    fn set_matrix(&mut self, matrix: AffineMatrix);

    /// Clears the entire layer to transparent. Called once per layer at a
    /// Master or Clear layer-block transition, before any operations (if
    /// any) are delivered.
    fn clear(&mut self);

    fn draw_polygon(&mut self, points: &[(i32, i32)], stroke: Color, thickness: u32);

    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: Color, font_size: u32);

    fn draw_circle(&mut self, cx: i32, cy: i32, radius: u32, stroke: Color, thickness: u32);

    fn draw_rect(&mut self, x: i32, y: i32, w: u32, h: u32, stroke: Color, thickness: u32);

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, stroke: Color, thickness: u32);
}
