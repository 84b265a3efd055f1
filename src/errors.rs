//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`CanvasError`] covers all failure modes including:
//! - malformed wire-format messages
//! - protocol-level decode failures (e.g. `Remain` without a predecessor)
//! - pool/lease misuse after shutdown
//! - transport and async-task failures
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, CanvasError>`.
//!
//! ```rust,ignore
//! use canvas_stream::errors::{CanvasError, Result};
//!
//! fn flush() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for this crate.
///
/// Each variant provides specific context about what went wrong. Decode
/// errors never carry partial state back into the caller: a failed decode
/// always leaves the previously published frame untouched.
#[derive(Error, Debug)]
pub enum CanvasError {
    // ========================================================================
    // Wire Format / Decode Errors
    // ========================================================================
    /// An opcode byte did not match any known operation.
    #[error("unknown opcode: {0:#04x}")]
    UnknownOpcode(u8),

    /// A layer block's frame-type byte was not 0 (Master), 1 (Remain) or 2 (Clear).
    #[error("unknown frame type: {0}")]
    UnknownFrameType(u8),

    /// A varint's continuation bit was set for 10 consecutive bytes.
    #[error("varint overflow while decoding {context}")]
    VarintOverflow {
        /// What was being decoded when the overflow was detected.
        context: &'static str,
    },

    /// A `DrawPolygon` declared more points than fit in the remaining bytes,
    /// or a layer block's operations consumed more bytes than its declared
    /// `op_count` allowed for.
    #[error("message truncated while decoding {context}")]
    Truncated {
        /// What was being decoded when the bytes ran out.
        context: &'static str,
    },

    /// The two-byte `0xFF 0xFF` end marker was missing after the declared
    /// layer blocks were fully parsed.
    #[error("missing end marker after {layer_count} layer block(s)")]
    MissingEndMarker {
        /// Number of layer blocks that were successfully parsed.
        layer_count: u8,
    },

    /// A `Remain` layer block named a layer id absent from the previously
    /// published snapshot. Fatal to the current message.
    #[error("layer {0} cannot Remain: no predecessor in the previous frame")]
    RemainWithoutPredecessor(u8),

    /// Two layer blocks in the same message declared the same layer id.
    #[error("duplicate layer id {0} in one message")]
    DuplicateLayerId(u8),

    /// A decoded frame id was not strictly greater than the previous one
    /// observed on this connection.
    #[error("frame id {got} is not greater than the last decoded frame id {last}")]
    NonIncreasingFrameId {
        /// The frame id this message declared.
        got: u64,
        /// The most recent frame id successfully decoded on this connection.
        last: u64,
    },

    // ========================================================================
    // Producer-Side Errors
    // ========================================================================
    /// A draw or context operation was issued against a layer whose mode for
    /// this frame is `Remain` or `Clear`, which must carry no operations.
    #[error("layer {layer} cannot record operations after switching to {mode}")]
    OperationAfterModeSwitch {
        /// The layer id the caller attempted to record an operation on.
        layer: u8,
        /// The mode (`"Remain"` or `"Clear"`) the layer had already switched to.
        mode: &'static str,
    },

    /// The caller-provided fixed-size buffer was too small for the encoded
    /// operation.
    #[error("encode buffer too small: needed at least {needed} bytes, had {available}")]
    EncodeBufferTooSmall {
        /// Bytes required to encode the operation.
        needed: usize,
        /// Bytes actually available in the destination span.
        available: usize,
    },

    // ========================================================================
    // Pool / Lease Errors
    // ========================================================================
    /// `LayerPool::rent` was called after the pool was disposed.
    #[error("layer pool is disposed; cannot rent a new layer buffer")]
    PoolDisposed,

    // ========================================================================
    // Transport / Async Errors
    // ========================================================================
    /// The transport was closed; nothing was written.
    #[error("transport closed")]
    TransportClosed,

    /// An I/O error propagated from the transport.
    #[error("transport I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// An async task failed to complete (panicked or was cancelled).
    #[error("task join error: {0}")]
    TaskJoinError(String),
}

#[cfg(not(target_arch = "wasm32"))]
impl From<tokio::task::JoinError> for CanvasError {
    fn from(err: tokio::task::JoinError) -> Self {
        CanvasError::TaskJoinError(err.to_string())
    }
}

/// Alias for `Result<T, CanvasError>`.
pub type Result<T> = std::result::Result<T, CanvasError>;
