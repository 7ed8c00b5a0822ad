//! Badge construction and the hover-driven body type rule.
//!
//! Spawning a [`Badge`] builds a three-body chain: a static anchor, a small
//! dynamic hinge, and the dynamic card plate, linked by a rope joint and a
//! configurable tether. The bodies live on their own entities so that the
//! physics engine owns their transforms directly; [`BadgeRig`] on the badge
//! entity records the handles.

use avian3d::{math::*, prelude::*};
use bevy::prelude::*;
use thiserror::Error;

use crate::{
    LanyardSet,
    interaction::InteractionState,
    keep_alive::{HoverPulse, KeepAliveConfig},
    strap::{StrapCurve, StrapOffsets},
};

/// Builds badge rigs when a [`Badge`] is spawned, tears them down when it is
/// removed, and keeps the card's [`RigidBody`] type in sync with the hover
/// state once per physics tick.
pub struct BadgeRigPlugin;

impl Plugin for BadgeRigPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Badge>()
            .register_type::<BadgeRig>()
            .register_type::<BadgeAnchor>()
            .register_type::<BadgeHinge>()
            .register_type::<BadgeCard>();

        // Keep-alive runs first so that a hover pulse started or expired by it
        // is reflected in the card's body type within the same tick.
        app.configure_sets(
            PhysicsSchedule,
            (LanyardSet::KeepAlive, LanyardSet::BodyType)
                .chain()
                .in_set(PhysicsStepSet::First),
        );

        app.add_systems(
            PhysicsSchedule,
            apply_hover_body_type.in_set(LanyardSet::BodyType),
        );

        app.add_observer(build_rig);
        app.add_observer(tear_down_rig);
    }
}

/// An interactive hanging ID badge.
///
/// Spawning this component is all it takes to get a badge: an observer builds
/// the physical rig described by the [`BadgeConfig`] and inserts a
/// [`BadgeRig`] with the body handles. Despawning the entity (or removing the
/// component) tears the rig down again.
///
/// The configuration is validated by [`Badge::new`] and fixed for the
/// lifetime of the badge; there is no runtime reconfiguration.
#[derive(Component, Clone, Debug, PartialEq, Reflect)]
#[reflect(Component)]
#[require(InteractionState, StrapCurve)]
pub struct Badge {
    config: BadgeConfig,
}

impl Badge {
    /// Creates a badge from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`BadgeConfigError`] if the configuration describes a rig
    /// that cannot be built, for example a non-positive rope length.
    pub fn new(config: BadgeConfig) -> Result<Self, BadgeConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration the rig was built from.
    pub fn config(&self) -> &BadgeConfig {
        &self.config
    }
}

/// The joint connecting the hinge to the card.
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub enum TetherKind {
    /// A ball-socket attachment: the card pivots freely around its
    /// attachment point but cannot translate relative to the hinge.
    Spherical,
    /// A rope: the attachment point may sag up to `rest_length` away from
    /// the hinge, with slack allowed but no stretch.
    Rope {
        /// Maximum distance between the hinge and the card's attachment point.
        rest_length: Scalar,
    },
}

impl TetherKind {
    /// The distance from the hinge to the card's attachment point when the
    /// chain hangs straight down.
    pub fn rest_length(&self) -> Scalar {
        match self {
            Self::Spherical => 0.0,
            Self::Rope { rest_length } => *rest_length,
        }
    }
}

/// Construction parameters for a badge rig.
///
/// The defaults describe a card roughly 2.8 x 3.2 units in size hanging one
/// unit below an anchor at `(0, 3, 0)`, attached by a ball-socket tether.
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct BadgeConfig {
    /// World-space position of the fixed anchor body.
    pub anchor_position: Vector,
    /// Rest length of the rope between the anchor and the hinge.
    pub rope_length: Scalar,
    /// The joint connecting the hinge to the card.
    pub tether: TetherKind,
    /// Attachment point of the tether in the card's local space, typically
    /// at the clasp above the plate's top edge.
    pub card_anchor: Vector,
    /// Radius of the hinge's spherical collider.
    pub hinge_radius: Scalar,
    /// Half-extents of the card's box collider.
    pub card_half_extents: Vector,
    /// Gravity scale applied to the hinge and card bodies. Global gravity
    /// itself is a world-level setting owned by the caller.
    pub gravity_scale: Scalar,
    /// Local offsets defining the strap's control points.
    pub strap: StrapOffsets,
    /// Tuning for the idle keep-alive behavior.
    pub keep_alive: KeepAliveConfig,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            anchor_position: Vector::new(0.0, 3.0, 0.0),
            rope_length: 1.0,
            tether: TetherKind::Spherical,
            card_anchor: Vector::new(0.09, 2.0, 0.05),
            hinge_radius: 0.1,
            card_half_extents: Vector::new(1.4, 1.6, 0.05),
            gravity_scale: 1.0,
            strap: StrapOffsets::default(),
            keep_alive: KeepAliveConfig::default(),
        }
    }
}

impl BadgeConfig {
    /// Checks that the configuration describes a buildable rig.
    ///
    /// Called by [`Badge::new`]; configuration problems are rejected here,
    /// before any bodies exist, rather than surfacing mid-simulation.
    pub fn validate(&self) -> Result<(), BadgeConfigError> {
        if self.rope_length <= 0.0 {
            return Err(BadgeConfigError::RopeLength(self.rope_length));
        }
        if let TetherKind::Rope { rest_length } = self.tether {
            if rest_length <= 0.0 {
                return Err(BadgeConfigError::TetherLength(rest_length));
            }
        }
        if self.hinge_radius <= 0.0 {
            return Err(BadgeConfigError::HingeRadius(self.hinge_radius));
        }
        if self.card_half_extents.min_element() <= 0.0 {
            return Err(BadgeConfigError::CardExtents(self.card_half_extents));
        }
        self.keep_alive.validate()
    }

    /// Sets the world-space position of the anchor body.
    pub fn with_anchor_position(mut self, position: Vector) -> Self {
        self.anchor_position = position;
        self
    }

    /// Sets the rest length of the anchor-to-hinge rope.
    pub fn with_rope_length(mut self, length: Scalar) -> Self {
        self.rope_length = length;
        self
    }

    /// Sets the joint connecting the hinge to the card.
    pub fn with_tether(mut self, tether: TetherKind) -> Self {
        self.tether = tether;
        self
    }

    /// Sets the keep-alive tuning.
    pub fn with_keep_alive(mut self, keep_alive: KeepAliveConfig) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}

/// An error returned when a [`BadgeConfig`] fails validation.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum BadgeConfigError {
    #[error("rope length must be positive, got {0}")]
    RopeLength(Scalar),
    #[error("tether rest length must be positive, got {0}")]
    TetherLength(Scalar),
    #[error("hinge collider radius must be positive, got {0}")]
    HingeRadius(Scalar),
    #[error("card half-extents must be positive on every axis, got {0}")]
    CardExtents(Vector),
    #[error("keep-alive {name} must be non-negative, got {value}")]
    NegativeThreshold { name: &'static str, value: Scalar },
    #[error("keep-alive ceiling ({ceiling}) must be above the floor ({floor})")]
    BandOrder { floor: Scalar, ceiling: Scalar },
    #[error("hover pulse duration must be non-zero")]
    EmptyPulse,
}

/// Handles to the bodies and joints of a constructed rig.
///
/// Inserted on the badge entity once construction has finished. Until then,
/// systems that need the bodies simply skip the badge for the frame.
#[derive(Component, Clone, Copy, Debug, PartialEq, Reflect)]
#[reflect(Component)]
pub struct BadgeRig {
    /// The static body the chain hangs from.
    pub anchor: Entity,
    /// The small dynamic body between the anchor and the card.
    pub hinge: Entity,
    /// The dynamic body carrying the badge plate.
    pub card: Entity,
    /// The rope joint between the anchor and the hinge.
    pub rope_joint: Entity,
    /// The tether joint between the hinge and the card.
    pub tether_joint: Entity,
}

/// Marks the anchor body of a badge rig.
#[derive(Component, Clone, Copy, Debug, PartialEq, Reflect)]
#[reflect(Component)]
pub struct BadgeAnchor {
    /// The badge entity this body belongs to.
    pub badge: Entity,
}

/// Marks the hinge body of a badge rig.
#[derive(Component, Clone, Copy, Debug, PartialEq, Reflect)]
#[reflect(Component)]
pub struct BadgeHinge {
    /// The badge entity this body belongs to.
    pub badge: Entity,
}

/// Marks the card body of a badge rig.
///
/// Pointer events on the card's interactive regions resolve to the owning
/// badge through this marker.
#[derive(Component, Clone, Copy, Debug, PartialEq, Reflect)]
#[reflect(Component)]
pub struct BadgeCard {
    /// The badge entity this body belongs to.
    pub badge: Entity,
}

/// Spawns the bodies and joints for a newly added [`Badge`].
///
/// The chain starts taut, hanging straight down from the anchor, so that
/// identical configurations always produce identical initial poses.
fn build_rig(
    trigger: Trigger<OnAdd, Badge>,
    badges: Query<&Badge>,
    rigs: Query<&BadgeRig>,
    mut commands: Commands,
) {
    let badge = trigger.target();
    if rigs.contains(badge) {
        return;
    }
    let Ok(config) = badges.get(badge).map(Badge::config) else {
        return;
    };

    let hinge_position = config.anchor_position - Vector::Y * config.rope_length;
    let card_position =
        hinge_position - Vector::Y * config.tether.rest_length() - config.card_anchor;

    let anchor = commands
        .spawn((
            Name::new("badge anchor"),
            BadgeAnchor { badge },
            RigidBody::Static,
            Transform::from_translation(config.anchor_position.f32()),
        ))
        .id();

    let hinge = commands
        .spawn((
            Name::new("badge hinge"),
            BadgeHinge { badge },
            RigidBody::Dynamic,
            Collider::sphere(config.hinge_radius),
            GravityScale(config.gravity_scale),
            TransformInterpolation,
            Transform::from_translation(hinge_position.f32()),
        ))
        .id();

    // The collider expects full extents. The impulse accumulator is
    // pre-inserted and non-persistent, so the keep-alive system can write to
    // it without structural commands and each write is applied exactly once.
    let card = commands
        .spawn((
            Name::new("badge card"),
            BadgeCard { badge },
            RigidBody::Dynamic,
            Collider::cuboid(
                2.0 * config.card_half_extents.x,
                2.0 * config.card_half_extents.y,
                2.0 * config.card_half_extents.z,
            ),
            GravityScale(config.gravity_scale),
            ExternalImpulse::default().with_persistence(false),
            TransformInterpolation,
            Transform::from_translation(card_position.f32()),
        ))
        .id();

    let rope_joint = commands
        .spawn((
            Name::new("badge rope"),
            DistanceJoint::new(anchor, hinge).with_limits(0.0, config.rope_length),
        ))
        .id();

    let tether_joint = match config.tether {
        TetherKind::Spherical => commands
            .spawn((
                Name::new("badge tether"),
                SphericalJoint::new(hinge, card).with_local_anchor_2(config.card_anchor),
            ))
            .id(),
        TetherKind::Rope { rest_length } => commands
            .spawn((
                Name::new("badge tether"),
                DistanceJoint::new(hinge, card)
                    .with_local_anchor_2(config.card_anchor)
                    .with_limits(0.0, rest_length),
            ))
            .id(),
    };

    commands.entity(badge).insert(BadgeRig {
        anchor,
        hinge,
        card,
        rope_joint,
        tether_joint,
    });

    debug!("built badge rig for {badge}");
}

/// Despawns a rig's bodies and joints when its [`Badge`] goes away.
///
/// Runs for both component removal and entity despawn, so tearing a badge
/// down mid-simulation never leaves orphaned bodies behind.
fn tear_down_rig(trigger: Trigger<OnRemove, Badge>, rigs: Query<&BadgeRig>, mut commands: Commands) {
    let Ok(rig) = rigs.get(trigger.target()) else {
        return;
    };
    for entity in [
        rig.rope_joint,
        rig.tether_joint,
        rig.card,
        rig.hinge,
        rig.anchor,
    ] {
        commands.entity(entity).try_despawn();
    }
    debug!("tore down badge rig for {}", trigger.target());
}

/// Applies the hover rule: the card is kinematic while a pointer hovers one
/// of its regions or a flick pulse is live, and dynamic otherwise.
///
/// Runs before the physics step so that a transition requested this frame is
/// in effect for this frame's integration. Velocities are cleared only on the
/// dynamic-to-kinematic edge; repeating the same state is a no-op.
fn apply_hover_body_type(
    badges: Query<(&InteractionState, Option<&HoverPulse>, &BadgeRig)>,
    mut cards: Query<(&mut RigidBody, &mut LinearVelocity, &mut AngularVelocity)>,
) {
    for (state, pulse, rig) in &badges {
        // The card may still be a frame away from existing.
        let Ok((mut body, mut linear_velocity, mut angular_velocity)) = cards.get_mut(rig.card)
        else {
            continue;
        };

        let target = if state.hovered() || pulse.is_some_and(HoverPulse::is_live) {
            RigidBody::Kinematic
        } else {
            RigidBody::Dynamic
        };

        if *body == target {
            continue;
        }

        if target == RigidBody::Kinematic {
            // Freeze in place: a kinematic body keeps integrating whatever
            // velocity it had, which is not what a held badge should do.
            *linear_velocity = LinearVelocity::ZERO;
            *angular_velocity = AngularVelocity::ZERO;
        }

        *body = target;
    }
}
