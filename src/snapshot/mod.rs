//! Pooled, reference-counted frame storage.
//!
//! A frame is a [`RefArray<LayerBuffer>`], one slot per layer id. The
//! decoder holds the sole [`Ref`] to a layer while mutating it; publishing
//! a frame means handing a `try_copy` of each occupied slot to the
//! renderer side, so renderers and the next decode pass can run against
//! independent, refcounted views of the same underlying buffers without
//! copying their bytes.

pub mod lease;
pub mod pool;
pub mod refcount;

pub use lease::Lease;
pub use pool::{LayerBuffer, LayerPool};
pub use refcount::{Ref, RefArray};

/// One published frame: a layer-indexed array of optional buffer handles.
pub type Frame = RefArray<LayerBuffer>;
