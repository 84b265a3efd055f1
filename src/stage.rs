//! The decoder-side `Stage`: owns the layer pool and the published frame,
//! and gives the decoder a narrow seam (`clear`/`remain`/`canvas_for`) to
//! drive without knowing anything about ref-counting or pooling itself.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::canvas::Canvas;
use crate::config::StageConfig;
use crate::errors::{CanvasError, Result};
use crate::snapshot::{Frame, LayerBuffer, LayerPool, Ref};

/// The decoder-side abstraction over the raster backend and the pool,
/// parameterized over the backend's [`Canvas`] implementation.
///
/// Implemented here by [`RenderingStage`]; kept as a trait so the decoder
/// (in [`crate::decoder`]) can be exercised in tests against a lighter
/// fake if a suite ever needs one, without pulling in the pool.
pub trait Stage {
    type Canvas: Canvas;

    /// Called once per message, before any layer block is processed.
    fn on_frame_start(&mut self, frame_id: u64);

    /// Rents a fresh layer buffer and installs it as the working buffer
    /// for `layer_id`, for both `Master` and `Clear` layer blocks.
    fn clear(&mut self, layer_id: u8) -> Result<()>;

    /// Installs the previously-published lease for `layer_id` as this
    /// message's working buffer for that layer. Fails if no such lease
    /// exists in the last published frame.
    fn remain(&mut self, layer_id: u8) -> Result<()>;

    /// Returns the backend canvas driving layer `layer_id`. Only valid
    /// after `clear` has installed a working buffer for that layer this
    /// message (i.e. for `Master` layers).
    fn canvas_for(&mut self, layer_id: u8) -> &mut Self::Canvas;

    /// Atomically publishes the working set built up via `clear`/`remain`
    /// this message as the new frame, releasing the prior one.
    fn on_frame_end(&mut self);
}

/// One entry in the decoder's working set for the message currently being
/// applied: the pooled buffer lease plus (for `Master` layers only) the
/// backend canvas drawing into it this message.
struct Working<C> {
    buffer: Ref<LayerBuffer>,
    canvas: Option<C>,
}

/// The reference implementation of [`Stage`]: owns a [`LayerPool`] and the
/// single published [`Frame`] renderers observe, guarded by a short
/// `parking_lot::Mutex` held only long enough to swap or copy it.
pub struct RenderingStage<C: Canvas + Default> {
    config: StageConfig,
    pool: LayerPool,
    display_frame: Mutex<Frame>,
    working: HashMap<u8, Working<C>>,
    last_frame_id: Option<u64>,
    /// The `Master` canvases finished by the most recently published
    /// message, keyed by layer id. Real backends hold their own canvas
    /// per layer independently of this bookkeeping; this crate retains
    /// them here purely so callers (and this crate's own tests) can
    /// inspect what the decoder drew without a real raster surface.
    last_canvases: HashMap<u8, C>,
}

impl<C: Canvas + Default> RenderingStage<C> {
    #[must_use]
    pub fn new(config: StageConfig) -> Self {
        let pool = LayerPool::new();
        for _ in 0..config.initial_pool_capacity {
            // Pre-warm the free list: rent then immediately dispose.
            if let Ok(lease) = pool.rent(config.layer_byte_size()) {
                drop(lease);
            }
        }
        Self {
            config,
            pool,
            display_frame: Mutex::new(Frame::empty()),
            working: HashMap::new(),
            last_frame_id: None,
            last_canvases: HashMap::new(),
        }
    }

    /// The `Master` canvas the most recently published message finished
    /// for `layer_id`, if any (layers that were `Remain`ed or absent this
    /// message have none).
    #[must_use]
    pub fn last_canvas(&self, layer_id: u8) -> Option<&C> {
        self.last_canvases.get(&layer_id)
    }

    #[must_use]
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    #[must_use]
    pub fn pool(&self) -> &LayerPool {
        &self.pool
    }

    /// The frame id passed to the most recent `on_frame_start` call.
    #[must_use]
    pub fn last_frame_id(&self) -> Option<u64> {
        self.last_frame_id
    }

    /// Atomically copies the currently displayed frame for a renderer.
    /// Returns `None` only in the pathological case where the frame was
    /// disposed between the lock being taken and the copy (never observed
    /// in practice since `RenderingStage` is the only disposer and it only
    /// disposes by replacing, not by an out-of-band dispose call).
    #[must_use]
    pub fn try_copy_frame(&self) -> Option<Frame> {
        self.display_frame.lock().try_copy()
    }
}

impl<C: Canvas + Default> Stage for RenderingStage<C> {
    type Canvas = C;

    fn on_frame_start(&mut self, frame_id: u64) {
        log::debug!("stage: frame {frame_id} starting");
        self.working.clear();
        self.last_frame_id = Some(frame_id);
    }

    fn clear(&mut self, layer_id: u8) -> Result<()> {
        let lease = self.pool.rent(self.config.layer_byte_size())?;
        let canvas = C::default();
        self.working.insert(
            layer_id,
            Working {
                buffer: Ref::new(lease),
                canvas: Some(canvas),
            },
        );
        Ok(())
    }

    fn remain(&mut self, layer_id: u8) -> Result<()> {
        let copy = {
            let display = self.display_frame.lock();
            display
                .get(layer_id as usize)
                .and_then(crate::snapshot::Ref::try_copy)
        };
        let Some(buffer) = copy else {
            return Err(CanvasError::RemainWithoutPredecessor(layer_id));
        };
        self.working.insert(layer_id, Working { buffer, canvas: None });
        Ok(())
    }

    fn canvas_for(&mut self, layer_id: u8) -> &mut C {
        self.working
            .get_mut(&layer_id)
            .and_then(|w| w.canvas.as_mut())
            .expect("canvas_for called on a layer with no working Master canvas")
    }

    fn on_frame_end(&mut self) {
        self.last_canvases.clear();
        let new_frame = if self.working.is_empty() {
            Frame::empty()
        } else {
            let max_id = self.working.keys().copied().max().unwrap_or(0);
            let mut slots: Vec<Option<Ref<LayerBuffer>>> = (0..=max_id).map(|_| None).collect();
            for (id, working) in self.working.drain() {
                if let Some(canvas) = working.canvas {
                    self.last_canvases.insert(id, canvas);
                }
                slots[id as usize] = Some(working.buffer);
            }
            Frame::new(slots)
        };
        *self.display_frame.lock() = new_frame;
    }
}

#[cfg(test)]
mod tests {
    use super::{RenderingStage, Stage};
    use crate::canvas::Canvas;
    use crate::color::Color;
    use crate::config::StageConfig;
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

    #[test]
    fn remain_without_predecessor_errors() {
        let mut stage: RenderingStage<NullCanvas> = RenderingStage::new(StageConfig::default());
        assert!(stage.remain(5).is_err());
    }

    #[test]
    fn clear_then_frame_end_publishes_a_nonempty_frame() {
        let mut stage: RenderingStage<NullCanvas> = RenderingStage::new(StageConfig::default());
        stage.on_frame_start(1);
        stage.clear(0).unwrap();
        stage.on_frame_end();
        let copy = stage.try_copy_frame().unwrap();
        assert!(copy.get(0).is_some());
    }

    #[test]
    fn remain_after_publish_shares_the_same_lease() {
        let mut stage: RenderingStage<NullCanvas> = RenderingStage::new(StageConfig::default());
        stage.clear(0).unwrap();
        stage.on_frame_end();
        let before = stage.pool().free_count();

        stage.remain(0).unwrap();
        stage.on_frame_end();
        // Remain shares the lease rather than renting a new buffer.
        assert_eq!(stage.pool().free_count(), before);
    }
}
