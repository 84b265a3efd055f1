//! The decoder: parses one framed message at a time and drives a [`Stage`]
//! through it.
//!
//! Parsing is split into two passes on purpose. [`parse_message`] is pure:
//! it validates the entire message's byte layout (including every
//! operation inside every `Master` layer block) and builds an in-memory
//! [`ParsedMessage`] without touching the stage at all. Only once a full,
//! valid message is known to be present does [`Decoder::decode`] apply it
//! to the stage. This is what lets "need more data" be side-effect-free:
//! a caller that retries `decode` after appending more bytes never causes
//! a layer to be cleared or Remained twice.

use crate::canvas::Canvas;
use crate::color::Color;
use crate::context::{ContextStack, DrawContext};
use crate::errors::{CanvasError, Result};
use crate::stage::Stage;
use crate::wire::format::{FrameType, Opcode, PropertyId, END_MARKER};
use crate::wire::varint::{read_uvarint, read_zigzag32};

/// Outcome of a single [`Decoder::decode`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// `buf` does not yet contain a complete message; call again after
    /// appending more bytes. No side effects occurred.
    NeedMoreData,
    /// A complete message was parsed, applied to the stage, and published.
    Decoded {
        /// Exact byte length of the consumed message.
        bytes_consumed: usize,
        frame_id: u64,
        layer_count: u8,
    },
}

/// One already-decoded operation, holding owned values rather than
/// re-reading from the byte buffer during apply.
enum Op {
    DrawPolygon(Vec<(i32, i32)>),
    DrawText { x: i32, y: i32, text: String },
    DrawCircle { cx: i32, cy: i32, radius: u32 },
    DrawRect { x: i32, y: i32, w: u32, h: u32 },
    DrawLine { x1: i32, y1: i32, x2: i32, y2: i32 },
    SetContext(Vec<FieldUpdate>),
    SaveContext,
    RestoreContext,
    ResetContext,
}

enum FieldUpdate {
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

struct ParsedLayer {
    layer_id: u8,
    frame_type: FrameType,
    ops: Vec<Op>,
}

struct ParsedMessage {
    frame_id: u64,
    layers: Vec<ParsedLayer>,
}

/// Reads `n` bytes from `buf` starting at `*pos`, advancing `*pos`.
/// Returns `None` (need more data) if not enough bytes remain.
fn take<'a>(buf: &'a [u8], pos: &mut usize, n: usize) -> Option<&'a [u8]> {
    let end = pos.checked_add(n)?;
    let slice = buf.get(*pos..end)?;
    *pos = end;
    Some(slice)
}

fn read_uvarint_at(buf: &[u8], pos: &mut usize, context: &'static str) -> Result<Option<u64>> {
    let Some((value, consumed)) = read_uvarint(&buf[*pos..], context)? else {
        return Ok(None);
    };
    *pos += consumed;
    Ok(Some(value))
}

fn read_zigzag_at(buf: &[u8], pos: &mut usize, context: &'static str) -> Result<Option<i32>> {
    let Some((value, consumed)) = read_zigzag32(&buf[*pos..], context)? else {
        return Ok(None);
    };
    *pos += consumed;
    Ok(Some(value))
}

fn read_f32_at(buf: &[u8], pos: &mut usize) -> Option<f32> {
    let bytes = take(buf, pos, 4)?;
    Some(f32::from_le_bytes(bytes.try_into().unwrap()))
}

fn read_color_at(buf: &[u8], pos: &mut usize) -> Option<Color> {
    let bytes = take(buf, pos, 4)?;
    Some(Color::from_bytes(bytes.try_into().unwrap()))
}

/// Parses one operation's payload (the opcode byte at `*pos - 1` has
/// already been consumed by the caller). Returns `Ok(None)` if the buffer
/// runs out partway through — the top-level caller maps that to
/// `NeedMoreData`.
fn parse_op(opcode: Opcode, buf: &[u8], pos: &mut usize) -> Result<Option<Op>> {
    Ok(Some(match opcode {
        Opcode::DrawPolygon => {
            let Some(count) = read_uvarint_at(buf, pos, "DrawPolygon point_count")? else {
                return Ok(None);
            };
            let mut points = Vec::with_capacity(count as usize);
            let mut prev = (0i32, 0i32);
            for i in 0..count {
                let ctx = "DrawPolygon point";
                let Some(x) = read_zigzag_at(buf, pos, ctx)? else {
                    return Ok(None);
                };
                let Some(y) = read_zigzag_at(buf, pos, ctx)? else {
                    return Ok(None);
                };
                let point = if i == 0 { (x, y) } else { (prev.0 + x, prev.1 + y) };
                points.push(point);
                prev = point;
            }
            Op::DrawPolygon(points)
        }
        Opcode::DrawText => {
            let Some(x) = read_zigzag_at(buf, pos, "DrawText x")? else {
                return Ok(None);
            };
            let Some(y) = read_zigzag_at(buf, pos, "DrawText y")? else {
                return Ok(None);
            };
            let Some(len) = read_uvarint_at(buf, pos, "DrawText byte_len")? else {
                return Ok(None);
            };
            let Some(bytes) = take(buf, pos, len as usize) else {
                return Ok(None);
            };
            let text = std::str::from_utf8(bytes)
                .map_err(|_| CanvasError::Truncated {
                    context: "DrawText utf8",
                })?
                .to_owned();
            Op::DrawText { x, y, text }
        }
        Opcode::DrawCircle => {
            let Some(cx) = read_zigzag_at(buf, pos, "DrawCircle cx")? else {
                return Ok(None);
            };
            let Some(cy) = read_zigzag_at(buf, pos, "DrawCircle cy")? else {
                return Ok(None);
            };
            let Some(radius) = read_uvarint_at(buf, pos, "DrawCircle radius")? else {
                return Ok(None);
            };
            Op::DrawCircle {
                cx,
                cy,
                radius: radius as u32,
            }
        }
        Opcode::DrawRect => {
            let Some(x) = read_zigzag_at(buf, pos, "DrawRect x")? else {
                return Ok(None);
            };
            let Some(y) = read_zigzag_at(buf, pos, "DrawRect y")? else {
                return Ok(None);
            };
            let Some(w) = read_uvarint_at(buf, pos, "DrawRect w")? else {
                return Ok(None);
            };
            let Some(h) = read_uvarint_at(buf, pos, "DrawRect h")? else {
                return Ok(None);
            };
            Op::DrawRect {
                x,
                y,
                w: w as u32,
                h: h as u32,
            }
        }
        Opcode::DrawLine => {
            let Some(x1) = read_zigzag_at(buf, pos, "DrawLine x1")? else {
                return Ok(None);
            };
            let Some(y1) = read_zigzag_at(buf, pos, "DrawLine y1")? else {
                return Ok(None);
            };
            let Some(x2) = read_zigzag_at(buf, pos, "DrawLine x2")? else {
                return Ok(None);
            };
            let Some(y2) = read_zigzag_at(buf, pos, "DrawLine y2")? else {
                return Ok(None);
            };
            Op::DrawLine { x1, y1, x2, y2 }
        }
        Opcode::SetContext => {
            let Some(field_count) = read_uvarint_at(buf, pos, "SetContext field_count")? else {
                return Ok(None);
            };
            let mut fields = Vec::with_capacity(field_count as usize);
            for _ in 0..field_count {
                let Some(prop_byte) = take(buf, pos, 1) else {
                    return Ok(None);
                };
                let Some(prop) = PropertyId::from_byte(prop_byte[0]) else {
                    return Err(CanvasError::UnknownOpcode(prop_byte[0]));
                };
                let field = match prop {
                    PropertyId::Stroke => {
                        let Some(c) = read_color_at(buf, pos) else { return Ok(None) };
                        FieldUpdate::Stroke(c)
                    }
                    PropertyId::Fill => {
                        let Some(c) = read_color_at(buf, pos) else { return Ok(None) };
                        FieldUpdate::Fill(c)
                    }
                    PropertyId::FontColor => {
                        let Some(c) = read_color_at(buf, pos) else { return Ok(None) };
                        FieldUpdate::FontColor(c)
                    }
                    PropertyId::Thickness => {
                        let Some(v) = read_uvarint_at(buf, pos, "Thickness")? else {
                            return Ok(None);
                        };
                        FieldUpdate::Thickness(v as u32)
                    }
                    PropertyId::FontSize => {
                        let Some(v) = read_uvarint_at(buf, pos, "FontSize")? else {
                            return Ok(None);
                        };
                        FieldUpdate::FontSize(v as u32)
                    }
                    PropertyId::Offset => {
                        let Some(x) = read_zigzag_at(buf, pos, "Offset x")? else {
                            return Ok(None);
                        };
                        let Some(y) = read_zigzag_at(buf, pos, "Offset y")? else {
                            return Ok(None);
                        };
                        FieldUpdate::Offset(x, y)
                    }
                    PropertyId::Rotation => {
                        let Some(deg) = read_f32_at(buf, pos) else { return Ok(None) };
                        FieldUpdate::Rotation(deg)
                    }
                    PropertyId::Scale => {
                        let Some(x) = read_f32_at(buf, pos) else { return Ok(None) };
                        let Some(y) = read_f32_at(buf, pos) else { return Ok(None) };
                        FieldUpdate::Scale(x, y)
                    }
                    PropertyId::Skew => {
                        let Some(x) = read_f32_at(buf, pos) else { return Ok(None) };
                        let Some(y) = read_f32_at(buf, pos) else { return Ok(None) };
                        FieldUpdate::Skew(x, y)
                    }
                    PropertyId::Matrix => {
                        let mut values = [0f32; 6];
                        for v in &mut values {
                            let Some(f) = read_f32_at(buf, pos) else { return Ok(None) };
                            *v = f;
                        }
                        FieldUpdate::Matrix(values)
                    }
                };
                fields.push(field);
            }
            Op::SetContext(fields)
        }
        Opcode::SaveContext => Op::SaveContext,
        Opcode::RestoreContext => Op::RestoreContext,
        Opcode::ResetContext => Op::ResetContext,
    }))
}

fn parse_message(buf: &[u8]) -> Result<Option<(ParsedMessage, usize)>> {
    let mut pos = 0usize;

    let Some(frame_id_bytes) = take(buf, &mut pos, 8) else {
        return Ok(None);
    };
    let frame_id = u64::from_le_bytes(frame_id_bytes.try_into().unwrap());

    let Some(layer_count_byte) = take(buf, &mut pos, 1) else {
        return Ok(None);
    };
    let layer_count = layer_count_byte[0];

    let mut seen = [false; 256];
    let mut layers = Vec::with_capacity(layer_count as usize);

    for _ in 0..layer_count {
        let Some(header) = take(buf, &mut pos, 2) else {
            return Ok(None);
        };
        let layer_id = header[0];
        let Some(frame_type) = FrameType::from_byte(header[1]) else {
            return Err(CanvasError::UnknownFrameType(header[1]));
        };
        if seen[layer_id as usize] {
            return Err(CanvasError::DuplicateLayerId(layer_id));
        }
        seen[layer_id as usize] = true;

        let mut ops = Vec::new();
        if frame_type == FrameType::Master {
            let Some(op_count) = read_uvarint_at(buf, &mut pos, "layer op_count")? else {
                return Ok(None);
            };
            for _ in 0..op_count {
                let Some(opcode_byte) = take(buf, &mut pos, 1) else {
                    return Ok(None);
                };
                let Some(opcode) = Opcode::from_byte(opcode_byte[0]) else {
                    return Err(CanvasError::UnknownOpcode(opcode_byte[0]));
                };
                let Some(op) = parse_op(opcode, buf, &mut pos)? else {
                    return Ok(None);
                };
                ops.push(op);
            }
        }

        layers.push(ParsedLayer {
            layer_id,
            frame_type,
            ops,
        });
    }

    let Some(marker) = take(buf, &mut pos, 2) else {
        return Ok(None);
    };
    if marker != END_MARKER {
        return Err(CanvasError::MissingEndMarker { layer_count });
    }

    Ok(Some((ParsedMessage { frame_id, layers }, pos)))
}

fn apply_field(ctx: &mut DrawContext, field: &FieldUpdate) {
    match *field {
        FieldUpdate::Stroke(c) => ctx.stroke = c,
        FieldUpdate::Fill(c) => ctx.fill = c,
        FieldUpdate::FontColor(c) => ctx.font_color = c,
        FieldUpdate::Thickness(v) => ctx.thickness = v,
        FieldUpdate::FontSize(v) => ctx.font_size = v,
        FieldUpdate::Offset(x, y) => {
            ctx.transform.translate_x = x as f32;
            ctx.transform.translate_y = y as f32;
        }
        FieldUpdate::Rotation(deg) => ctx.transform.rotation = deg,
        FieldUpdate::Scale(x, y) => {
            ctx.transform.scale_x = x;
            ctx.transform.scale_y = y;
        }
        FieldUpdate::Skew(x, y) => {
            ctx.transform.skew_x = x;
            ctx.transform.skew_y = y;
        }
        FieldUpdate::Matrix(values) => {
            ctx.matrix = Some(crate::transform::AffineMatrix::new(
                values[0], values[1], values[2], values[3], values[4], values[5],
            ));
        }
    }
}

fn apply_master_layer<S: Stage>(stage: &mut S, layer_id: u8, ops: &[Op]) {
    let mut ctx = DrawContext::default();
    let mut stack = ContextStack::new();

    for op in ops {
        match op {
            Op::SetContext(fields) => {
                for field in fields {
                    apply_field(&mut ctx, field);
                }
            }
            Op::SaveContext => {
                stack.save(&ctx);
                stage.canvas_for(layer_id).save();
            }
            Op::RestoreContext => {
                match stack.restore() {
                    Some(restored) => ctx = restored,
                    None => {
                        log::warn!("RestoreContext on empty stack for layer {layer_id}; resetting to default");
                        ctx = DrawContext::default();
                    }
                }
                stage.canvas_for(layer_id).restore();
            }
            Op::ResetContext => {
                stack.clear();
                ctx = DrawContext::default();
            }
            Op::DrawPolygon(points) => {
                let matrix = ctx.effective_matrix();
                let canvas = stage.canvas_for(layer_id);
                canvas.set_matrix(matrix);
                canvas.draw_polygon(points, ctx.stroke, ctx.thickness);
            }
            Op::DrawText { x, y, text } => {
                let matrix = ctx.effective_matrix();
                let canvas = stage.canvas_for(layer_id);
                canvas.set_matrix(matrix);
                canvas.draw_text(text, *x, *y, ctx.font_color, ctx.font_size);
            }
            Op::DrawCircle { cx, cy, radius } => {
                let matrix = ctx.effective_matrix();
                let canvas = stage.canvas_for(layer_id);
                canvas.set_matrix(matrix);
                canvas.draw_circle(*cx, *cy, *radius, ctx.stroke, ctx.thickness);
            }
            Op::DrawRect { x, y, w, h } => {
                let matrix = ctx.effective_matrix();
                let canvas = stage.canvas_for(layer_id);
                canvas.set_matrix(matrix);
                canvas.draw_rect(*x, *y, *w, *h, ctx.stroke, ctx.thickness);
            }
            Op::DrawLine { x1, y1, x2, y2 } => {
                let matrix = ctx.effective_matrix();
                let canvas = stage.canvas_for(layer_id);
                canvas.set_matrix(matrix);
                canvas.draw_line(*x1, *y1, *x2, *y2, ctx.stroke, ctx.thickness);
            }
        }
    }
}

/// Parses and applies protocol messages to a [`Stage`].
///
/// Tracks the last successfully decoded frame id to enforce strict
/// monotonicity; a single `Decoder` is meant to live for the lifetime of
/// one connection.
#[derive(Default)]
pub struct Decoder {
    last_frame_id: Option<u64>,
}

impl Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to parse and apply exactly one message from the front of
    /// `buf`. On [`DecodeOutcome::NeedMoreData`], `buf` is left untouched
    /// and no stage method was called; the caller should append more bytes
    /// and call again. On success, `bytes_consumed` bytes should be
    /// dropped from the caller's accumulation buffer before the next call.
    pub fn decode<S: Stage>(&mut self, buf: &[u8], stage: &mut S) -> Result<DecodeOutcome> {
        let Some((parsed, bytes_consumed)) = parse_message(buf)? else {
            return Ok(DecodeOutcome::NeedMoreData);
        };

        if let Some(last) = self.last_frame_id {
            if parsed.frame_id <= last {
                return Err(CanvasError::NonIncreasingFrameId {
                    got: parsed.frame_id,
                    last,
                });
            }
        }

        stage.on_frame_start(parsed.frame_id);
        for layer in &parsed.layers {
            match layer.frame_type {
                FrameType::Master => {
                    stage.clear(layer.layer_id)?;
                    stage.canvas_for(layer.layer_id).clear();
                    apply_master_layer(stage, layer.layer_id, &layer.ops);
                }
                FrameType::Clear => {
                    stage.clear(layer.layer_id)?;
                    stage.canvas_for(layer.layer_id).clear();
                }
                FrameType::Remain => {
                    stage.remain(layer.layer_id)?;
                }
            }
        }
        stage.on_frame_end();

        self.last_frame_id = Some(parsed.frame_id);
        Ok(DecodeOutcome::Decoded {
            bytes_consumed,
            frame_id: parsed.frame_id,
            layer_count: u8::try_from(parsed.layers.len()).unwrap_or(u8::MAX),
        })
    }
}
