//! `RemoteCanvas` — the per-connection producer API.
//!
//! Application code drives a connection's outgoing frames through this
//! type: `begin_frame`, then zero or more `layer(id)` handles on which
//! styling, transform, save/restore, and draw calls are recorded, then
//! `flush` to assemble and send the framed wire message. State (the
//! per-layer scratch buffer, op count, and mode) lives here; the actual
//! byte encoding is delegated to [`crate::encoder`], which stays stateless.

use smallvec::SmallVec;

use crate::cancel::Cancel;
use crate::color::Color;
use crate::encoder::{
    encode_draw_circle, encode_draw_line, encode_draw_polygon, encode_draw_rect, encode_draw_text,
    encode_reset_context, encode_restore_context, encode_save_context, encode_set_context, ContextField,
};
use crate::errors::{CanvasError, Result};
use crate::transport::AsyncTransport;
use crate::wire::format::FrameType;

/// Most frames touch only a handful of layers; inlining a small number
/// avoids a heap allocation on the common path.
type TouchOrder = SmallVec<[u8; 8]>;

/// One layer's accumulated state for the frame currently being built.
struct LayerScratch {
    mode: FrameType,
    /// `true` once `Master`/`Remain`/`Clear` was set explicitly this frame;
    /// until then the layer behaves as `Master` but hasn't been "touched"
    /// in insertion-order bookkeeping yet.
    touched: bool,
    ops: Vec<u8>,
    op_count: u32,
}

impl LayerScratch {
    fn new() -> Self {
        Self {
            mode: FrameType::Master,
            touched: false,
            ops: Vec::new(),
            op_count: 0,
        }
    }

    fn reset_for_new_frame(&mut self) {
        self.mode = FrameType::Master;
        self.touched = false;
        self.ops.clear();
        self.op_count = 0;
    }
}

/// Per-connection producer state: the current frame id and every layer's
/// scratch buffer, keyed by layer id and kept in first-touched-this-frame
/// order so `flush` emits layer blocks in insertion order.
pub struct RemoteCanvas {
    frame_id: u64,
    frame_open: bool,
    layers: [LayerScratch; 256],
    touch_order: TouchOrder,
}

impl RemoteCanvas {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame_id: 0,
            frame_open: false,
            layers: std::array::from_fn(|_| LayerScratch::new()),
            touch_order: SmallVec::new(),
        }
    }

    /// Increments the frame id, marks every layer untouched, and clears
    /// each layer's scratch buffer and mode. Every frame must begin with
    /// this call.
    pub fn begin_frame(&mut self) {
        self.frame_id += 1;
        self.frame_open = true;
        self.touch_order.clear();
        for layer in &mut self.layers {
            layer.reset_for_new_frame();
        }
    }

    /// Returns a handle for layer `id`, marking it touched in the current
    /// frame. Idempotent within a frame: calling this twice for the same
    /// id does not duplicate its entry in the emitted layer block order.
    ///
    /// # Panics
    ///
    /// Panics if called without an enclosing [`Self::begin_frame`] — issuing
    /// layer operations outside a frame is a programming error, and this
    /// crate surfaces it immediately and consistently rather than silently
    /// coercing it into an implicit frame.
    pub fn layer(&mut self, id: u8) -> LayerHandle<'_> {
        assert!(
            self.frame_open,
            "RemoteCanvas::layer({id}) called without an enclosing begin_frame()"
        );
        if !self.layers[id as usize].touched {
            self.layers[id as usize].touched = true;
            self.touch_order.push(id);
        }
        LayerHandle { canvas: self, id }
    }

    /// Assembles the current frame's message (header, every touched
    /// layer's block, end marker) and sends it over `transport`. Returns
    /// without writing if the transport is already closed or `cancel` has
    /// been requested.
    pub async fn flush(&mut self, transport: &mut impl AsyncTransport, cancel: &Cancel) -> Result<()> {
        if transport.is_closed() || cancel.is_cancelled() {
            return Ok(());
        }

        let mut message = Vec::new();
        message.extend_from_slice(&self.frame_id.to_le_bytes());
        message.push(u8::try_from(self.touch_order.len()).unwrap_or(u8::MAX));

        for &id in &self.touch_order {
            let layer = &self.layers[id as usize];
            message.push(id);
            message.push(layer.mode.to_byte());
            if layer.mode == FrameType::Master {
                crate::wire::varint::write_uvarint(u64::from(layer.op_count), &mut message);
                message.extend_from_slice(&layer.ops);
            }
        }
        message.extend_from_slice(&crate::wire::format::END_MARKER);

        self.frame_open = false;
        transport.send(message).await
    }

    #[must_use]
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }
}

impl Default for RemoteCanvas {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle for recording operations against one layer within the frame
/// currently open on a [`RemoteCanvas`].
///
/// Every recording method other than `master`/`remain`/`clear` fails with
/// [`CanvasError::OperationAfterModeSwitch`] once the layer has switched to
/// `Remain` or `Clear` mode, since a Remain/Clear layer block must carry no
/// operations on the wire.
pub struct LayerHandle<'a> {
    canvas: &'a mut RemoteCanvas,
    id: u8,
}

impl LayerHandle<'_> {
    fn scratch(&mut self) -> &mut LayerScratch {
        &mut self.canvas.layers[self.id as usize]
    }

    fn guard_master(&mut self) -> Result<&mut LayerScratch> {
        let layer = &mut self.canvas.layers[self.id as usize];
        if layer.mode != FrameType::Master {
            return Err(CanvasError::OperationAfterModeSwitch {
                layer: self.id,
                mode: match layer.mode {
                    FrameType::Remain => "Remain",
                    FrameType::Clear => "Clear",
                    FrameType::Master => unreachable!(),
                },
            });
        }
        Ok(layer)
    }

    fn record(&mut self, write: impl FnOnce(&mut Vec<u8>)) -> Result<()> {
        let layer = self.guard_master()?;
        write(&mut layer.ops);
        layer.op_count += 1;
        Ok(())
    }

    /// Explicitly marks this layer `Master` (the default at `begin_frame`).
    /// A no-op if the layer hasn't already switched to `Remain`/`Clear`.
    pub fn master(&mut self) {
        self.scratch().mode = FrameType::Master;
    }

    /// Switches this layer to `Remain`: the decoder reuses the previous
    /// frame's buffer for this layer unchanged. Must be called before any
    /// draw/context operation on this layer this frame.
    pub fn remain(&mut self) {
        self.scratch().mode = FrameType::Remain;
    }

    /// Switches this layer to `Clear`: the decoder erases it to
    /// transparent with no further operations. Must be called before any
    /// draw/context operation on this layer this frame.
    pub fn clear(&mut self) {
        self.scratch().mode = FrameType::Clear;
    }

    pub fn set_stroke(&mut self, color: Color) -> Result<()> {
        self.set_context(&[ContextField::Stroke(color)])
    }

    pub fn set_fill(&mut self, color: Color) -> Result<()> {
        self.set_context(&[ContextField::Fill(color)])
    }

    pub fn set_thickness(&mut self, thickness: u32) -> Result<()> {
        self.set_context(&[ContextField::Thickness(thickness)])
    }

    pub fn set_font_size(&mut self, size: u32) -> Result<()> {
        self.set_context(&[ContextField::FontSize(size)])
    }

    pub fn set_font_color(&mut self, color: Color) -> Result<()> {
        self.set_context(&[ContextField::FontColor(color)])
    }

    pub fn translate(&mut self, x: i32, y: i32) -> Result<()> {
        self.set_context(&[ContextField::Offset(x, y)])
    }

    pub fn rotate(&mut self, degrees: f32) -> Result<()> {
        self.set_context(&[ContextField::Rotation(degrees)])
    }

    pub fn scale(&mut self, x: f32, y: f32) -> Result<()> {
        self.set_context(&[ContextField::Scale(x, y)])
    }

    pub fn skew(&mut self, x: f32, y: f32) -> Result<()> {
        self.set_context(&[ContextField::Skew(x, y)])
    }

    pub fn set_matrix(&mut self, matrix: [f32; 6]) -> Result<()> {
        self.set_context(&[ContextField::Matrix(matrix)])
    }

    /// Records a `SetContext` operation carrying one or more field updates
    /// in a single opcode. The convenience setters above each wrap a
    /// single-field call; batching several fields (e.g. stroke and
    /// thickness together) saves an opcode byte per extra field.
    pub fn set_context(&mut self, fields: &[ContextField]) -> Result<()> {
        self.record(|out| {
            encode_set_context(fields, out);
        })
    }

    pub fn save(&mut self) -> Result<()> {
        self.record(|out| {
            encode_save_context(out);
        })
    }

    pub fn restore(&mut self) -> Result<()> {
        self.record(|out| {
            encode_restore_context(out);
        })
    }

    pub fn reset_context(&mut self) -> Result<()> {
        self.record(|out| {
            encode_reset_context(out);
        })
    }

    pub fn draw_polygon(&mut self, points: &[(i32, i32)]) -> Result<()> {
        self.record(|out| {
            encode_draw_polygon(points, out);
        })
    }

    pub fn draw_text(&mut self, x: i32, y: i32, text: &str) -> Result<()> {
        self.record(|out| {
            encode_draw_text(x, y, text, out);
        })
    }

    pub fn draw_circle(&mut self, cx: i32, cy: i32, radius: u32) -> Result<()> {
        self.record(|out| {
            encode_draw_circle(cx, cy, radius, out);
        })
    }

    pub fn draw_rectangle(&mut self, x: i32, y: i32, w: u32, h: u32) -> Result<()> {
        self.record(|out| {
            encode_draw_rect(x, y, w, h, out);
        })
    }

    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) -> Result<()> {
        self.record(|out| {
            encode_draw_line(x1, y1, x2, y2, out);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RemoteCanvas;
    use crate::cancel::Cancel;
    use crate::color::Color;
    use crate::transport::ChannelTransport;

    #[test]
    #[should_panic(expected = "without an enclosing begin_frame")]
    fn layer_without_begin_frame_panics() {
        let mut canvas = RemoteCanvas::new();
        canvas.layer(0);
    }

    #[test]
    fn remain_then_draw_is_rejected() {
        let mut canvas = RemoteCanvas::new();
        canvas.begin_frame();
        let mut layer = canvas.layer(0);
        layer.remain();
        assert!(layer.draw_circle(0, 0, 5).is_err());
    }

    #[test]
    fn touch_order_is_first_touch_order_and_idempotent() {
        let mut canvas = RemoteCanvas::new();
        canvas.begin_frame();
        canvas.layer(3);
        canvas.layer(1);
        canvas.layer(3);
        assert_eq!(canvas.touch_order.as_slice(), [3, 1]);
    }

    #[tokio::test]
    async fn flush_emits_header_layer_blocks_and_end_marker() {
        let mut canvas = RemoteCanvas::new();
        canvas.begin_frame();
        canvas
            .layer(0)
            .set_stroke(Color::rgba(255, 0, 0, 255))
            .unwrap();
        canvas.layer(0).draw_rectangle(10, 20, 100, 50).unwrap();

        let (mut transport, mut rx) = ChannelTransport::channel(1);
        canvas.flush(&mut transport, &Cancel::new()).await.unwrap();

        let message = rx.try_recv().unwrap();
        assert_eq!(&message[0..8], &1u64.to_le_bytes());
        assert_eq!(message[8], 1); // one touched layer
        assert_eq!(message[message.len() - 2..], [0xFF, 0xFF]);
    }
}
