//! The idle heuristic that keeps the badge from settling into a dead pose.
//!
//! A damped simulation left alone eventually goes still, which reads as
//! broken rather than calm. Once per physics tick this module samples the
//! card and nudges it only when its motion crosses calibrated bounds, so the
//! badge stays gently alive without the motion looking driven.

use core::time::Duration;

use avian3d::{math::*, prelude::*};
use bevy::prelude::*;

use crate::{
    LanyardSet,
    interaction::InteractionState,
    rig::{Badge, BadgeConfigError, BadgeRig},
};

/// Runs the keep-alive heuristic once per physics tick, before the card's
/// body type is re-evaluated, inside [`PhysicsStepSet::First`].
pub struct KeepAlivePlugin;

impl Plugin for KeepAlivePlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<KeepAliveConfig>()
            .register_type::<HoverPulse>();

        app.add_systems(
            PhysicsSchedule,
            keep_badges_alive.in_set(LanyardSet::KeepAlive),
        );
    }
}

/// Which keep-alive policy drives the badge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub enum KeepAliveMode {
    /// Push back whenever the card's yaw strays beyond
    /// [`yaw_limit`](KeepAliveConfig::yaw_limit), preventing runaway
    /// rotation without ever letting the card face away.
    YawRestoring,
    /// Nudge the card whenever its angular speed decays below
    /// [`floor`](KeepAliveConfig::floor), and treat speeds above
    /// [`ceiling`](KeepAliveConfig::ceiling) as a flick that starts a short
    /// [`HoverPulse`].
    #[default]
    VelocityBand,
}

/// Tuning for the keep-alive heuristic.
///
/// The thresholds and magnitudes are calibrated by eye rather than derived
/// from physical law; the defaults produce a gentle perpetual sway on the
/// default card.
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct KeepAliveConfig {
    /// The active policy.
    pub mode: KeepAliveMode,
    /// Yaw deviation in radians beyond which the restoring impulse fires.
    pub yaw_limit: Scalar,
    /// Magnitude of the restoring impulse.
    pub restoring_impulse: Scalar,
    /// Angular speed in rad/s below which the card gets a nudge. A floor of
    /// zero never fires.
    pub floor: Scalar,
    /// Angular speed in rad/s above which motion counts as a flick. Use
    /// [`Scalar::INFINITY`] to never trigger flick pulses.
    pub ceiling: Scalar,
    /// Magnitude of the below-floor nudge impulse.
    pub nudge_impulse: Scalar,
    /// Point where impulses are applied, in the card's local space. An
    /// off-center arm turns the impulse into swing.
    pub impulse_arm: Vector,
    /// How long a flick-triggered [`HoverPulse`] holds the card.
    pub pulse_duration: Duration,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            mode: KeepAliveMode::VelocityBand,
            yaw_limit: 0.4,
            restoring_impulse: 0.05,
            floor: 0.25,
            ceiling: 8.0,
            nudge_impulse: 0.12,
            impulse_arm: Vector::new(0.5, 0.0, 0.0),
            pulse_duration: Duration::from_millis(50),
        }
    }
}

impl KeepAliveConfig {
    /// Checks thresholds and magnitudes. Negative values are rejected, as is
    /// a velocity band whose ceiling does not clear its floor.
    pub fn validate(&self) -> Result<(), BadgeConfigError> {
        for (name, value) in [
            ("yaw limit", self.yaw_limit),
            ("restoring impulse", self.restoring_impulse),
            ("velocity floor", self.floor),
            ("nudge impulse", self.nudge_impulse),
        ] {
            if value < 0.0 {
                return Err(BadgeConfigError::NegativeThreshold { name, value });
            }
        }
        if self.ceiling <= self.floor {
            return Err(BadgeConfigError::BandOrder {
                floor: self.floor,
                ceiling: self.ceiling,
            });
        }
        if self.pulse_duration.is_zero() {
            return Err(BadgeConfigError::EmptyPulse);
        }
        Ok(())
    }
}

/// A short-lived hover override started by a flick.
///
/// While live, the card is held kinematic and the cursor hint engages just
/// as if a pointer were hovering, then everything reverts on expiry with no
/// pointer event required. The timer runs on the physics clock, so a pulse
/// expires on a tick boundary.
#[derive(Component, Clone, Debug, PartialEq, Reflect)]
#[reflect(Component)]
pub struct HoverPulse {
    timer: Timer,
}

impl HoverPulse {
    /// Starts a pulse that expires after `duration`.
    pub fn new(duration: Duration) -> Self {
        Self {
            timer: Timer::new(duration, TimerMode::Once),
        }
    }

    /// Whether the pulse is still holding the card.
    pub fn is_live(&self) -> bool {
        !self.timer.finished()
    }
}

/// Whether an angular speed counts as a flick under the given tuning.
fn flick_detected(speed: Scalar, tuning: &KeepAliveConfig) -> bool {
    tuning.mode == KeepAliveMode::VelocityBand && speed > tuning.ceiling
}

/// The corrective impulse to apply this tick, if any.
///
/// Both policies push along world Z through the off-center arm, which turns
/// into yaw torque. The sign of the current yaw picks the direction that
/// pushes back toward center.
fn corrective_impulse(yaw: Scalar, speed: Scalar, tuning: &KeepAliveConfig) -> Option<Vector> {
    match tuning.mode {
        KeepAliveMode::YawRestoring => (yaw.abs() > tuning.yaw_limit)
            .then(|| Vector::Z * (yaw.signum() * tuning.restoring_impulse)),
        KeepAliveMode::VelocityBand => {
            (speed < tuning.floor).then(|| Vector::Z * (yaw.signum() * tuning.nudge_impulse))
        }
    }
}

/// Samples each badge's card once per physics tick and keeps it alive.
///
/// Pulse expiry is handled here, before the body-type rule runs, so a
/// finished pulse frees the card within the same tick. Impulses are
/// non-persistent, so each write is applied exactly once by the solver;
/// writing one also wakes a sleeping card.
fn keep_badges_alive(
    time: Res<Time>,
    mut commands: Commands,
    mut badges: Query<(
        Entity,
        &Badge,
        &BadgeRig,
        &InteractionState,
        Option<&mut HoverPulse>,
    )>,
    mut cards: Query<(&Rotation, &AngularVelocity, &mut ExternalImpulse)>,
) {
    for (entity, badge, rig, state, pulse) in &mut badges {
        let tuning = &badge.config().keep_alive;

        let mut pulse_live = false;
        if let Some(mut pulse) = pulse {
            pulse.timer.tick(time.delta());
            if pulse.is_live() {
                pulse_live = true;
            } else {
                commands.entity(entity).remove::<HoverPulse>();
            }
        }

        // The card may still be a frame away from existing.
        let Ok((rotation, angular_velocity, mut impulse)) = cards.get_mut(rig.card) else {
            continue;
        };

        // A held card is kinematic; impulses would fight the freeze.
        if state.hovered() || pulse_live {
            continue;
        }

        let speed = angular_velocity.0.length();
        let yaw = rotation.0.to_euler(EulerRot::YXZ).0;

        if flick_detected(speed, tuning) {
            commands
                .entity(entity)
                .insert(HoverPulse::new(tuning.pulse_duration));
            debug!("flick at {speed:.2} rad/s; pulsing badge {entity}");
            continue;
        }

        if let Some(corrective) = corrective_impulse(yaw, speed, tuning) {
            // The application point is the arm rotated into world space,
            // relative to the center of mass.
            let arm = rotation.0 * tuning.impulse_arm;
            impulse.apply_impulse_at_point(corrective, arm, Vector::ZERO);
            trace!("keep-alive impulse {corrective} on badge {entity}");
        }
    }
}
