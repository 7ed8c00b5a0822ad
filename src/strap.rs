//! The procedural curve drawn as the visible strap between anchor and card.
//!
//! The curve is fully derived state: four world-space control points, rebuilt
//! every frame from the anchor's position and the card's interpolated pose.
//! Renderers read [`StrapCurve`] and draw it however they like, for example
//! as a gizmo line strip or an extruded ribbon mesh.

use bevy::{prelude::*, transform::TransformSystem};
use derive_more::From;

use crate::{
    LanyardSet,
    rig::{Badge, BadgeRig},
};

/// Rebuilds [`StrapCurve`]s in [`PostUpdate`] after transform propagation,
/// so the curve always matches what is rendered this frame.
pub struct StrapPlugin;

impl Plugin for StrapPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<StrapCurve>()
            .register_type::<StrapOffsets>();

        app.configure_sets(
            PostUpdate,
            LanyardSet::Strap.after(TransformSystem::TransformPropagate),
        );

        app.add_systems(PostUpdate, update_strap_curves.in_set(LanyardSet::Strap));
    }
}

/// Local offsets defining where the strap visually attaches.
///
/// The first pair is relative to the anchor's world position and does not
/// rotate; the second pair is in the card's local space and swings with it.
/// The defaults line up with the clasp position of [`BadgeConfig`]'s default
/// card.
///
/// [`BadgeConfig`]: crate::rig::BadgeConfig
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct StrapOffsets {
    /// Offsets of the first two control points, relative to the anchor.
    pub anchor: [Vec3; 2],
    /// Offsets of the last two control points, in the card's local space.
    pub card: [Vec3; 2],
}

impl Default for StrapOffsets {
    fn default() -> Self {
        Self {
            anchor: [Vec3::ZERO, Vec3::new(0.0, -0.3, 0.0)],
            card: [Vec3::new(0.09, 2.35, 0.05), Vec3::new(0.09, 2.0, 0.05)],
        }
    }
}

/// The strap's four control points in world space, ordered from the anchor
/// down to the card.
///
/// The default is four coincident points at the origin, which marks the
/// curve as [degenerate](Self::is_degenerate); renderers should treat that
/// as nothing to draw. The curve keeps its last valid value whenever fresh
/// poses are unavailable, so it never collapses mid-flight.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Reflect, From)]
#[reflect(Component)]
pub struct StrapCurve {
    points: [Vec3; 4],
}

impl StrapCurve {
    /// Returns the control points, ordered from the anchor to the card.
    pub fn points(&self) -> [Vec3; 4] {
        self.points
    }

    /// Whether the curve still holds its construction-time placeholder
    /// value and should not be drawn.
    pub fn is_degenerate(&self) -> bool {
        self.points.iter().all(|point| *point == self.points[0])
    }

    /// Samples the curve as a polyline with `subdivisions` segments, using a
    /// Catmull-Rom spline through all four control points.
    ///
    /// Returns an empty list for a [degenerate](Self::is_degenerate) curve.
    pub fn sample(&self, subdivisions: usize) -> Vec<Vec3> {
        if self.is_degenerate() {
            return Vec::new();
        }
        let [a, b, c, d] = self.points;
        // Duplicated end points extend the spline so that it passes through
        // the outermost control points as well.
        let Ok(curve) = CubicCardinalSpline::new_catmull_rom([a, a, b, c, d, d]).to_curve() else {
            return Vec::new();
        };
        curve.iter_positions(subdivisions).collect()
    }
}

/// Computes the strap's control points for the given poses.
///
/// Pure: the same poses and offsets always produce the same points.
pub fn control_points(
    anchor_position: Vec3,
    card_position: Vec3,
    card_rotation: Quat,
    offsets: &StrapOffsets,
) -> [Vec3; 4] {
    [
        anchor_position + offsets.anchor[0],
        anchor_position + offsets.anchor[1],
        card_position + card_rotation * offsets.card[0],
        card_position + card_rotation * offsets.card[1],
    ]
}

/// Recomputes every badge's strap curve from the freshly propagated body
/// transforms.
///
/// Skips badges whose bodies are not available yet, and drops frames that
/// would write non-finite points into the curve, leaving the last valid
/// value in place either way.
fn update_strap_curves(
    mut badges: Query<(&Badge, &BadgeRig, &mut StrapCurve)>,
    transforms: Query<&GlobalTransform>,
) {
    for (badge, rig, mut curve) in &mut badges {
        let Ok([anchor, card]) = transforms.get_many([rig.anchor, rig.card]) else {
            continue;
        };
        let (_, card_rotation, card_position) = card.to_scale_rotation_translation();
        let points = control_points(
            anchor.translation(),
            card_position,
            card_rotation,
            &badge.config().strap,
        );
        if points.iter().any(|point| !point.is_finite()) {
            warn_once!("non-finite strap control points; keeping the previous curve");
            continue;
        }
        curve.set_if_neq(StrapCurve { points });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_curve_is_degenerate() {
        let curve = StrapCurve::default();
        assert!(curve.is_degenerate());
        assert!(curve.sample(16).is_empty());
    }

    #[test]
    fn control_points_follow_the_card() {
        let offsets = StrapOffsets::default();
        let anchor = Vec3::new(0.0, 3.0, 0.0);
        let card = Vec3::new(0.5, 0.0, 0.0);
        let quarter_turn = Quat::from_rotation_y(core::f32::consts::FRAC_PI_2);

        let points = control_points(anchor, card, quarter_turn, &offsets);
        assert_eq!(points[0], anchor);
        assert_eq!(points[1], anchor + offsets.anchor[1]);

        // The card-local offsets rotate with the card.
        let expected = card + quarter_turn * offsets.card[1];
        assert_relative_eq!(points[3].x, expected.x);
        assert_relative_eq!(points[3].y, expected.y);
        assert_relative_eq!(points[3].z, expected.z);
    }

    #[test]
    fn sample_starts_at_the_anchor_point() {
        let points = [
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(0.0, 2.7, 0.0),
            Vec3::new(0.2, 0.4, 0.0),
            Vec3::new(0.2, 0.0, 0.0),
        ];
        let curve = StrapCurve::from(points);
        let samples = curve.sample(16);
        assert!(samples.len() > 2);
        assert!(samples.iter().all(|point| point.is_finite()));
        let first = samples.first().unwrap();
        assert_relative_eq!(first.x, points[0].x);
        assert_relative_eq!(first.y, points[0].y);
    }
}
