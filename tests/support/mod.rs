//! A recording fake [`Canvas`] shared by this crate's integration tests.
//!
//! Real rasterization is out of scope for this crate; every end-to-end
//! scenario in these tests instead asserts on the sequence of calls the
//! decoder made against this fake, which is exactly what a real backend
//! would have received.

use canvas_stream::canvas::Canvas;
use canvas_stream::color::Color;
use canvas_stream::transform::AffineMatrix;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Save,
    Restore,
    SetMatrix(AffineMatrix),
    Clear,
    DrawPolygon { points: Vec<(i32, i32)>, stroke: Color, thickness: u32 },
    DrawText { text: String, x: i32, y: i32, color: Color, font_size: u32 },
    DrawCircle { cx: i32, cy: i32, radius: u32, stroke: Color, thickness: u32 },
    DrawRect { x: i32, y: i32, w: u32, h: u32, stroke: Color, thickness: u32 },
    DrawLine { x1: i32, y1: i32, x2: i32, y2: i32, stroke: Color, thickness: u32 },
}

#[derive(Default)]
pub struct RecordingCanvas {
    pub calls: Vec<Call>,
}

impl Canvas for RecordingCanvas {
    fn save(&mut self) {
        self.calls.push(Call::Save);
    }

    fn restore(&mut self) {
        self.calls.push(Call::Restore);
    }

    fn set_matrix(&mut self, matrix: AffineMatrix) {
        self.calls.push(Call::SetMatrix(matrix));
    }

    fn clear(&mut self) {
        self.calls.push(Call::Clear);
    }

    fn draw_polygon(&mut self, points: &[(i32, i32)], stroke: Color, thickness: u32) {
        self.calls.push(Call::DrawPolygon {
            points: points.to_vec(),
            stroke,
            thickness,
        });
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: Color, font_size: u32) {
        self.calls.push(Call::DrawText {
            text: text.to_owned(),
            x,
            y,
            color,
            font_size,
        });
    }

    fn draw_circle(&mut self, cx: i32, cy: i32, radius: u32, stroke: Color, thickness: u32) {
        self.calls.push(Call::DrawCircle {
            cx,
            cy,
            radius,
            stroke,
            thickness,
        });
    }

    fn draw_rect(&mut self, x: i32, y: i32, w: u32, h: u32, stroke: Color, thickness: u32) {
        self.calls.push(Call::DrawRect {
            x,
            y,
            w,
            h,
            stroke,
            thickness,
        });
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, stroke: Color, thickness: u32) {
        self.calls.push(Call::DrawLine {
            x1,
            y1,
            x2,
            y2,
            stroke,
            thickness,
        });
    }
}
