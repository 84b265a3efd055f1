//! Affine transform composition.
//!
//! A [`DrawContext`] (see [`crate::context`]) carries either a set of
//! component transform fields (translation, rotation, scale, skew) or an
//! explicit matrix. [`compose`] turns whichever is active into the single
//! [`AffineMatrix`] the backend canvas receives via `SetMatrix`.

use glam::{Affine2, Mat2, Vec2};

/// A 2x3 affine matrix, stored in the wire-format field order
/// (`scaleX, skewX, transX, skewY, scaleY, transY`):
///
/// ```text
/// [ scale_x  skew_x   trans_x ]
/// [ skew_y   scale_y  trans_y ]
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineMatrix {
    pub scale_x: f32,
    pub skew_x: f32,
    pub trans_x: f32,
    pub skew_y: f32,
    pub scale_y: f32,
    pub trans_y: f32,
}

impl AffineMatrix {
    /// The identity transform.
    pub const IDENTITY: AffineMatrix = AffineMatrix {
        scale_x: 1.0,
        skew_x: 0.0,
        trans_x: 0.0,
        skew_y: 0.0,
        scale_y: 1.0,
        trans_y: 0.0,
    };

    /// Builds a matrix directly from the six wire-order fields.
    #[must_use]
    pub const fn new(
        scale_x: f32,
        skew_x: f32,
        trans_x: f32,
        skew_y: f32,
        scale_y: f32,
        trans_y: f32,
    ) -> Self {
        Self {
            scale_x,
            skew_x,
            trans_x,
            skew_y,
            scale_y,
            trans_y,
        }
    }

    #[must_use]
    pub fn to_glam(self) -> Affine2 {
        Affine2::from_cols_array(&[
            self.scale_x,
            self.skew_y,
            self.skew_x,
            self.scale_y,
            self.trans_x,
            self.trans_y,
        ])
    }

    #[must_use]
    pub fn from_glam(m: Affine2) -> Self {
        let a = m.to_cols_array();
        Self {
            scale_x: a[0],
            skew_y: a[1],
            skew_x: a[2],
            scale_y: a[3],
            trans_x: a[4],
            trans_y: a[5],
        }
    }
}

impl Default for AffineMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// The translate/rotate/scale/skew component fields of a [`DrawContext`]
/// when no explicit matrix has been set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformComponents {
    pub translate_x: f32,
    pub translate_y: f32,
    /// Rotation in degrees.
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Skew in degrees along each axis.
    pub skew_x: f32,
    pub skew_y: f32,
}

impl Default for TransformComponents {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
        }
    }
}

fn skew_matrix(skew_x_degrees: f32, skew_y_degrees: f32) -> Affine2 {
    let tx = skew_x_degrees.to_radians().tan();
    let ty = skew_y_degrees.to_radians().tan();
    Affine2::from_mat2_translation(Mat2::from_cols(Vec2::new(1.0, ty), Vec2::new(tx, 1.0)), Vec2::ZERO)
}

/// Composes the component fields into a single matrix.
///
/// Order, as required by the wire protocol: start from identity, then
/// post-concatenate translation, rotation, scale, and skew in that order —
/// equivalent to calling `translate()`, `rotate()`, `scale()`, `skew()` in
/// sequence on a canvas-style API, where each later call operates in the
/// coordinate system established by the earlier ones.
#[must_use]
pub fn compose(components: &TransformComponents) -> AffineMatrix {
    let translate = Affine2::from_translation(Vec2::new(components.translate_x, components.translate_y));
    let rotate = Affine2::from_angle(components.rotation.to_radians());
    let scale = Affine2::from_scale(Vec2::new(components.scale_x, components.scale_y));
    let skew = skew_matrix(components.skew_x, components.skew_y);
    let combined = Affine2::IDENTITY * translate * rotate * scale * skew;
    AffineMatrix::from_glam(combined)
}

#[cfg(test)]
mod tests {
    use super::{compose, AffineMatrix, TransformComponents};

    #[test]
    fn identity_components_compose_to_identity() {
        let m = compose(&TransformComponents::default());
        assert!((m.scale_x - 1.0).abs() < 1e-6);
        assert!((m.scale_y - 1.0).abs() < 1e-6);
        assert!(m.trans_x.abs() < 1e-6);
        assert!(m.trans_y.abs() < 1e-6);
        assert!(m.skew_x.abs() < 1e-6);
        assert!(m.skew_y.abs() < 1e-6);
    }

    #[test]
    fn translate_then_scale_scales_in_translated_space() {
        // translate(100,100) then scale(0.5,0.5): a point at local origin
        // after scale still maps to world (100,100) because scale is nested
        // inside the translation, matching canvas-call nesting.
        let c = TransformComponents {
            translate_x: 100.0,
            translate_y: 100.0,
            scale_x: 0.5,
            scale_y: 0.5,
            ..Default::default()
        };
        let m = compose(&c);
        let world = m.to_glam().transform_point2(glam::Vec2::ZERO);
        assert!((world.x - 100.0).abs() < 1e-4);
        assert!((world.y - 100.0).abs() < 1e-4);
    }

    #[test]
    fn matrix_round_trips_through_glam() {
        let m = AffineMatrix::new(2.0, 0.1, 5.0, 0.2, 3.0, 7.0);
        let back = AffineMatrix::from_glam(m.to_glam());
        assert!((back.scale_x - m.scale_x).abs() < 1e-6);
        assert!((back.skew_x - m.skew_x).abs() < 1e-6);
        assert!((back.trans_x - m.trans_x).abs() < 1e-6);
        assert!((back.skew_y - m.skew_y).abs() < 1e-6);
        assert!((back.scale_y - m.scale_y).abs() < 1e-6);
        assert!((back.trans_y - m.trans_y).abs() < 1e-6);
    }

    #[test]
    fn identity_matrix_is_default() {
        assert_eq!(AffineMatrix::default(), AffineMatrix::IDENTITY);
    }
}
