//! The stateful per-layer drawing context: styling plus either component
//! transform fields or an explicit matrix, and the save/restore stack that
//! holds snapshots of it.
//!
//! Both the decoder (`SetContext`/`SaveContext`/`RestoreContext`/`ResetContext`
//! opcodes) and any higher-level inspection code share this type; the
//! producer side does not need to replicate it; it only needs to know which
//! single field changed to encode a one-field `SetContext` op (see
//! [`crate::producer`]).

use crate::color::Color;
use crate::transform::{compose, AffineMatrix, TransformComponents};

/// Styling and transform state applied to subsequent draw operations on a
/// layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawContext {
    pub stroke: Color,
    pub fill: Color,
    pub thickness: u32,
    pub font_size: u32,
    pub font_color: Color,
    pub transform: TransformComponents,
    /// When present, takes precedence over `transform`.
    pub matrix: Option<AffineMatrix>,
}

impl Default for DrawContext {
    fn default() -> Self {
        Self {
            stroke: Color::BLACK,
            fill: Color::BLACK,
            thickness: 1,
            font_size: 12,
            font_color: Color::BLACK,
            transform: TransformComponents::default(),
            matrix: None,
        }
    }
}

impl DrawContext {
    /// Computes the composite matrix to hand to `canvas.SetMatrix`: the
    /// explicit matrix if one was set, otherwise the composed component
    /// transform.
    #[must_use]
    pub fn effective_matrix(&self) -> AffineMatrix {
        self.matrix.unwrap_or_else(|| compose(&self.transform))
    }
}

/// A per-layer LIFO of saved [`DrawContext`] values.
#[derive(Clone, Debug, Default)]
pub struct ContextStack {
    stack: Vec<DrawContext>,
}

impl ContextStack {
    #[must_use]
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    /// Pushes a copy of `current` onto the stack.
    pub fn save(&mut self, current: &DrawContext) {
        self.stack.push(*current);
    }

    /// Pops the top of the stack and returns it. If the stack is empty,
    /// returns `None` — callers (the decoder) replace the current context
    /// with the default and log a warning, per protocol.
    pub fn restore(&mut self) -> Option<DrawContext> {
        self.stack.pop()
    }

    /// Clears the stack. Used by `ResetContext`.
    pub fn clear(&mut self) {
        self.stack.clear();
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
