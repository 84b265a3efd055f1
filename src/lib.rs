//! Binary wire protocol, encoder/decoder, and reference-counted frame
//! handoff for a real-time vector-graphics streaming canvas.
//!
//! This crate is the transport-and-state-machine core of a layered,
//! remote-drawing system: a producer ([`producer::RemoteCanvas`]) records
//! styling, transform, and draw operations per layer and flushes them as a
//! compact framed message; a [`decoder::Decoder`] replays that message
//! against a [`stage::Stage`], which composites independently-buffered
//! layers and publishes reference-counted frame snapshots that one or
//! more renderer tasks copy without tearing or stalling the producer.
//!
//! Rasterization, font rendering, GPU integration, and network transport
//! reliability are explicitly out of scope — this crate only owns the
//! byte format, the stateful drawing context, and the pooled,
//! reference-counted frame handoff. A raster backend supplies the
//! [`canvas::Canvas`] the decoder draws through.
//!
//! ```rust
//! use canvas_stream::color::Color;
//! use canvas_stream::producer::RemoteCanvas;
//!
//! let mut canvas = RemoteCanvas::new();
//! canvas.begin_frame();
//! canvas.layer(0).set_stroke(Color::rgb(255, 0, 0)).unwrap();
//! canvas.layer(0).draw_rectangle(10, 20, 100, 50).unwrap();
//! assert_eq!(canvas.frame_id(), 1);
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod canvas;
pub mod cancel;
pub mod color;
pub mod compositor;
pub mod config;
pub mod context;
pub mod decoder;
pub mod encoder;
pub mod errors;
pub mod producer;
pub mod snapshot;
pub mod stage;
pub mod transform;
pub mod transport;
pub mod wire;

pub use canvas::Canvas;
pub use color::Color;
pub use config::StageConfig;
pub use context::{ContextStack, DrawContext};
pub use decoder::{DecodeOutcome, Decoder};
pub use errors::{CanvasError, Result};
pub use producer::{LayerHandle, RemoteCanvas};
pub use stage::{RenderingStage, Stage};
pub use transform::{AffineMatrix, TransformComponents};
