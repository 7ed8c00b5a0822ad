//! # Lanyard
//!
//! **Lanyard** is an interactive "ID badge on a lanyard" rig for the
//! [Bevy game engine](https://bevyengine.org/), simulated with
//! [Avian](https://github.com/Jondolf/avian) rigid bodies and joints.
//! The badge hangs from its anchor on a short chain, swings and sways under
//! gravity, freezes in place while a pointer hovers its clickable regions,
//! and gives itself a gentle nudge whenever the motion dies down, so it
//! never settles into a visually dead pose.
//!
//! The crate deliberately stops at the physics and interaction rig: bodies,
//! joints, the per-frame [`StrapCurve`](strap::StrapCurve), hover state, and
//! activation events. Meshes, materials, and what pressing a region actually
//! does are left to the application.
//!
//! ## Getting started
//!
//! Add [`PhysicsPlugins`](avian3d::prelude::PhysicsPlugins) and
//! [`LanyardPlugins`], then spawn a [`Badge`](rig::Badge):
//!
//! ```no_run
//! use avian3d::prelude::*;
//! use bevy::prelude::*;
//! use lanyard::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins((DefaultPlugins, PhysicsPlugins::default(), LanyardPlugins))
//!         .add_systems(Startup, setup)
//!         .run();
//! }
//!
//! fn setup(mut commands: Commands) -> Result {
//!     commands.spawn(Badge::new(BadgeConfig::default())?);
//!     Ok(())
//! }
//! ```
//!
//! Pointer interaction rides on `bevy_picking`: run a backend such as Bevy's
//! `MeshPickingPlugin` and parent [`InteractiveRegion`](interaction::InteractiveRegion)
//! entities to the card body, and hover, press, and cursor affordance all
//! work. Without a backend the badge simply swings on its own.
//!
//! ## Frame anatomy
//!
//! All rig logic runs inside Avian's fixed-timestep [`PhysicsSchedule`], in
//! [`PhysicsStepSet::First`] before the solver steps:
//!
//! 1. [`LanyardSet::KeepAlive`] samples the card, injects corrective
//!    impulses, and starts or expires flick pulses.
//! 2. [`LanyardSet::BodyType`] applies the hover rule, switching the card
//!    between dynamic and kinematic.
//!
//! After transform propagation, [`LanyardSet::Strap`] rebuilds each badge's
//! strap curve in [`PostUpdate`] from the freshly propagated poses. State
//! changed in one tick is therefore always fully applied before the next
//! tick begins.

pub mod interaction;
pub mod keep_alive;
pub mod rig;
pub mod strap;

/// Re-exports common components, events, plugins, and configuration types.
pub mod prelude {
    pub use crate::{
        LanyardPlugins, LanyardSet,
        interaction::{InteractionPlugin, InteractionState, InteractiveRegion, RegionActivated},
        keep_alive::{HoverPulse, KeepAliveConfig, KeepAliveMode, KeepAlivePlugin},
        rig::{
            Badge, BadgeAnchor, BadgeCard, BadgeConfig, BadgeConfigError, BadgeHinge, BadgeRig,
            BadgeRigPlugin, TetherKind,
        },
        strap::{StrapCurve, StrapOffsets, StrapPlugin},
    };
}

#[cfg(test)]
mod tests;

#[allow(unused_imports)]
use avian3d::prelude::*; // For doc comments
use bevy::{app::PluginGroupBuilder, prelude::*};

/// This plugin group will add the following badge plugins:
///
/// - [`BadgeRigPlugin`](rig::BadgeRigPlugin): builds and tears down rigs and
///   applies the hover body-type rule
/// - [`StrapPlugin`](strap::StrapPlugin): rebuilds strap curves after
///   transform propagation
/// - [`InteractionPlugin`](interaction::InteractionPlugin): pointer
///   observers, activation events, and the cursor hint
/// - [`KeepAlivePlugin`](keep_alive::KeepAlivePlugin): the idle keep-alive
///   heuristic
///
/// The group expects Avian's `PhysicsPlugins` to be added as well; without
/// them the rig's schedules never run.
pub struct LanyardPlugins;

impl PluginGroup for LanyardPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>()
            .add(rig::BadgeRigPlugin)
            .add(strap::StrapPlugin)
            .add(interaction::InteractionPlugin)
            .add(keep_alive::KeepAlivePlugin)
    }
}

/// System sets for the badge rig's per-frame work.
#[derive(SystemSet, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LanyardSet {
    /// Samples card motion and injects keep-alive impulses and flick
    /// pulses. Runs in the [`PhysicsSchedule`] in [`PhysicsStepSet::First`].
    KeepAlive,
    /// Applies the hover rule to the card's [`RigidBody`] type. Runs in the
    /// [`PhysicsSchedule`] after [`LanyardSet::KeepAlive`].
    BodyType,
    /// Rebuilds [`StrapCurve`](strap::StrapCurve)s. Runs in [`PostUpdate`]
    /// after transform propagation.
    Strap,
}
