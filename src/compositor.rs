//! The output-side compositor seam.
//!
//! A compositor call draws all layer buffers in ascending layer-id order
//! onto an output canvas. Rasterization is out of scope, so this module
//! only walks a [`Frame`] snapshot in that order and hands each occupied
//! slot's buffer to whatever output surface the caller provides — it does
//! not know how to blend pixels.

use crate::snapshot::{Frame, LayerBuffer};

/// An output surface that can accept one layer's raw buffer at a time, in
/// ascending layer-id order.
pub trait Compositor {
    fn composite_layer(&mut self, layer_id: u8, buffer: &LayerBuffer);
}

/// Draws every occupied slot of `frame` onto `output`, in ascending
/// layer-id order (slot index doubles as layer id).
pub fn composite(frame: &Frame, output: &mut impl Compositor) {
    for layer_id in 0..frame.len() {
        if let Some(leased) = frame.get(layer_id) {
            let guard = leased.get();
            output.composite_layer(layer_id as u8, &guard);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{composite, Compositor};
    use crate::config::StageConfig;
    use crate::snapshot::LayerBuffer;
    use crate::stage::{RenderingStage, Stage};
    use crate::canvas::Canvas;
    use crate::color::Color;
    use crate::transform::AffineMatrix;

    #[derive(Default)]
    struct NullCanvas;
    impl Canvas for NullCanvas {
        fn save(&mut self) {}
        fn restore(&mut self) {}
        fn set_matrix(&mut self, _matrix: AffineMatrix) {}
        fn clear(&mut self) {}
        fn draw_polygon(&mut self, _points: &[(i32, i32)], _stroke: Color, _thickness: u32) {}
        fn draw_text(&mut self, _text: &str, _x: i32, _y: i32, _color: Color, _font_size: u32) {}
        fn draw_circle(&mut self, _cx: i32, _cy: i32, _radius: u32, _stroke: Color, _thickness: u32) {}
        fn draw_rect(&mut self, _x: i32, _y: i32, _w: u32, _h: u32, _stroke: Color, _thickness: u32) {}
        fn draw_line(&mut self, _x1: i32, _y1: i32, _x2: i32, _y2: i32, _stroke: Color, _thickness: u32) {}
    }

    struct RecordingOutput {
        order: Vec<u8>,
    }
    impl Compositor for RecordingOutput {
        fn composite_layer(&mut self, layer_id: u8, _buffer: &LayerBuffer) {
            self.order.push(layer_id);
        }
    }

    #[test]
    fn composites_in_ascending_layer_id_order() {
        let mut stage: RenderingStage<NullCanvas> = RenderingStage::new(StageConfig::default());
        stage.clear(3).unwrap();
        stage.clear(0).unwrap();
        stage.clear(1).unwrap();
        stage.on_frame_end();

        let frame = stage.try_copy_frame().unwrap();
        let mut output = RecordingOutput { order: Vec::new() };
        composite(&frame, &mut output);
        assert_eq!(output.order, vec![0, 1, 3]);
    }
}
