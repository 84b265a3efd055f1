//! Stateless encoding functions.
//!
//! Each function appends one operation's wire bytes to a caller-owned
//! `Vec<u8>` (the layer's scratch buffer in the producer) and returns the
//! number of bytes written. A fixed-span variant, [`encode_context_field`]
//! and friends' `_into` siblings are not provided separately — instead
//! [`encode_into_fixed`] re-encodes any operation into a caller-supplied
//! `&mut [u8]`, returning [`CanvasError::EncodeBufferTooSmall`] rather than
//! panicking when the span is undersized. State (the current per-layer
//! context) is never touched here; it lives one layer up, in
//! [`crate::producer`].

use crate::color::Color;
use crate::errors::{CanvasError, Result};
use crate::wire::format::{Opcode, PropertyId};
use crate::wire::varint::{write_uvarint, write_zigzag32};

/// One `SetContext` field update: a property id plus its payload, matching
/// the wire property table exactly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ContextField {
    Stroke(Color),
    Fill(Color),
    Thickness(u32),
    FontSize(u32),
    FontColor(Color),
    Offset(i32, i32),
    Rotation(f32),
    Scale(f32, f32),
    Skew(f32, f32),
    Matrix([f32; 6]),
}

impl ContextField {
    const fn property_id(self) -> PropertyId {
        match self {
            ContextField::Stroke(_) => PropertyId::Stroke,
            ContextField::Fill(_) => PropertyId::Fill,
            ContextField::Thickness(_) => PropertyId::Thickness,
            ContextField::FontSize(_) => PropertyId::FontSize,
            ContextField::FontColor(_) => PropertyId::FontColor,
            ContextField::Offset(..) => PropertyId::Offset,
            ContextField::Rotation(_) => PropertyId::Rotation,
            ContextField::Scale(..) => PropertyId::Scale,
            ContextField::Skew(..) => PropertyId::Skew,
            ContextField::Matrix(_) => PropertyId::Matrix,
        }
    }

    fn write_payload(self, out: &mut Vec<u8>) {
        match self {
            ContextField::Stroke(c) | ContextField::Fill(c) | ContextField::FontColor(c) => {
                out.extend_from_slice(&c.to_bytes());
            }
            ContextField::Thickness(v) | ContextField::FontSize(v) => {
                write_uvarint(u64::from(v), out);
            }
            ContextField::Offset(x, y) => {
                write_zigzag32(x, out);
                write_zigzag32(y, out);
            }
            ContextField::Rotation(deg) => out.extend_from_slice(&deg.to_le_bytes()),
            ContextField::Scale(x, y) | ContextField::Skew(x, y) => {
                out.extend_from_slice(&x.to_le_bytes());
                out.extend_from_slice(&y.to_le_bytes());
            }
            ContextField::Matrix(values) => {
                for v in values {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
        }
    }
}

fn write_points(points: &[(i32, i32)], out: &mut Vec<u8>) {
    write_uvarint(points.len() as u64, out);
    let mut prev = (0i32, 0i32);
    for (i, &(x, y)) in points.iter().enumerate() {
        if i == 0 {
            write_zigzag32(x, out);
            write_zigzag32(y, out);
        } else {
            write_zigzag32(x - prev.0, out);
            write_zigzag32(y - prev.1, out);
        }
        prev = (x, y);
    }
}

/// Encodes a `DrawPolygon` operation (opcode + delta-encoded points).
pub fn encode_draw_polygon(points: &[(i32, i32)], out: &mut Vec<u8>) -> usize {
    let start = out.len();
    out.push(Opcode::DrawPolygon as u8);
    write_points(points, out);
    out.len() - start
}

/// Encodes a `DrawText` operation.
pub fn encode_draw_text(x: i32, y: i32, text: &str, out: &mut Vec<u8>) -> usize {
    let start = out.len();
    out.push(Opcode::DrawText as u8);
    write_zigzag32(x, out);
    write_zigzag32(y, out);
    write_uvarint(text.len() as u64, out);
    out.extend_from_slice(text.as_bytes());
    out.len() - start
}

/// Encodes a `DrawCircle` operation.
pub fn encode_draw_circle(cx: i32, cy: i32, radius: u32, out: &mut Vec<u8>) -> usize {
    let start = out.len();
    out.push(Opcode::DrawCircle as u8);
    write_zigzag32(cx, out);
    write_zigzag32(cy, out);
    write_uvarint(u64::from(radius), out);
    out.len() - start
}

/// Encodes a `DrawRect` operation.
pub fn encode_draw_rect(x: i32, y: i32, w: u32, h: u32, out: &mut Vec<u8>) -> usize {
    let start = out.len();
    out.push(Opcode::DrawRect as u8);
    write_zigzag32(x, out);
    write_zigzag32(y, out);
    write_uvarint(u64::from(w), out);
    write_uvarint(u64::from(h), out);
    out.len() - start
}

/// Encodes a `DrawLine` operation.
pub fn encode_draw_line(x1: i32, y1: i32, x2: i32, y2: i32, out: &mut Vec<u8>) -> usize {
    let start = out.len();
    out.push(Opcode::DrawLine as u8);
    write_zigzag32(x1, out);
    write_zigzag32(y1, out);
    write_zigzag32(x2, out);
    write_zigzag32(y2, out);
    out.len() - start
}

/// Encodes a `SetContext` operation carrying one or more field updates.
pub fn encode_set_context(fields: &[ContextField], out: &mut Vec<u8>) -> usize {
    let start = out.len();
    out.push(Opcode::SetContext as u8);
    write_uvarint(fields.len() as u64, out);
    for field in fields {
        out.push(field.property_id() as u8);
        field.write_payload(out);
    }
    out.len() - start
}

/// Encodes a bare `SaveContext` operation.
pub fn encode_save_context(out: &mut Vec<u8>) -> usize {
    out.push(Opcode::SaveContext as u8);
    1
}

/// Encodes a bare `RestoreContext` operation.
pub fn encode_restore_context(out: &mut Vec<u8>) -> usize {
    out.push(Opcode::RestoreContext as u8);
    1
}

/// Encodes a bare `ResetContext` operation.
pub fn encode_reset_context(out: &mut Vec<u8>) -> usize {
    out.push(Opcode::ResetContext as u8);
    1
}

/// Encodes an operation already built as growable bytes into a caller-owned
/// fixed-size span, distinguishing buffer exhaustion from success.
///
/// Most callers should encode directly into a `Vec<u8>` scratch buffer with
/// the functions above; this exists for callers (e.g. embedders with a
/// pre-allocated transport frame) that must write into an exact span.
pub fn encode_into_fixed(encoded: &[u8], out: &mut [u8]) -> Result<usize> {
    if out.len() < encoded.len() {
        return Err(CanvasError::EncodeBufferTooSmall {
            needed: encoded.len(),
            available: out.len(),
        });
    }
    out[..encoded.len()].copy_from_slice(encoded);
    Ok(encoded.len())
}
