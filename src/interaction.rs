//! Pointer-driven hover state, interactive regions, and activation events.
//!
//! Pointer events come from whatever `bevy_picking` backend the app runs,
//! for example Bevy's `MeshPickingPlugin` for the usual decal meshes. The
//! observers here resolve an event target to the badge owning it by walking
//! the hierarchy up to the card body, so regions may be nested arbitrarily
//! deep under the card.

use std::borrow::Cow;

use bevy::{
    picking::events::{Out, Over, Pointer, Pressed},
    prelude::*,
    window::{PrimaryWindow, SystemCursorIcon},
    winit::cursor::CursorIcon,
};

use crate::{keep_alive::HoverPulse, rig::BadgeCard};

/// Routes pointer events on [`InteractiveRegion`]s into badge hover state
/// and [`RegionActivated`] events, and maintains the window cursor hint.
pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<InteractionState>()
            .register_type::<InteractiveRegion>();

        app.add_event::<RegionActivated>();

        app.add_observer(on_region_over);
        app.add_observer(on_region_out);
        app.add_observer(on_region_pressed);

        app.add_systems(Update, update_cursor_hint);
    }
}

/// Hover state of a badge.
///
/// Mutated only by the pointer observers; the rig reads it to pick the
/// card's body type, and keep-alive reads it to gate impulse injection.
/// The transient flick response lives in a separate [`HoverPulse`] component
/// rather than this flag, so pointer bookkeeping and the time-boxed pulse
/// cannot clobber each other; whichever of the two is active keeps the card
/// held, and that union is the accepted resolution of the overlap.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct InteractionState {
    hovered: bool,
}

impl InteractionState {
    /// Whether a pointer is currently over one of the badge's regions.
    pub fn hovered(&self) -> bool {
        self.hovered
    }

    /// Records the pointer entering a region. Idempotent: re-entering while
    /// already hovered changes nothing.
    pub fn pointer_enter(&mut self) {
        self.hovered = true;
    }

    /// Records the pointer leaving. Idempotent.
    pub fn pointer_leave(&mut self) {
        self.hovered = false;
    }
}

/// A clickable region of a badge, usually a decal mesh parented to the card
/// body.
///
/// Hovering any region of a badge sets its [`InteractionState`]; pressing
/// one emits a [`RegionActivated`] event carrying the region's identifier.
#[derive(Component, Clone, Debug, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct InteractiveRegion {
    id: Cow<'static, str>,
}

impl InteractiveRegion {
    /// Creates a region with the given identifier.
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self { id: id.into() }
    }

    /// The region's identifier.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Emitted when a pointer press lands on an [`InteractiveRegion`].
///
/// What an activation means is entirely up to the application; the rig only
/// reports which region of which badge was pressed. Activation does not
/// depend on the hover state.
#[derive(Event, Clone, Debug, PartialEq, Eq)]
pub struct RegionActivated {
    /// The badge the pressed region belongs to.
    pub badge: Entity,
    /// The identifier of the pressed region.
    pub region: Cow<'static, str>,
}

/// Walks from a region entity up the hierarchy to the card body and returns
/// the owning badge, or `None` if the entity is not under any card.
fn owning_badge(
    target: Entity,
    parents: &Query<&ChildOf>,
    cards: &Query<&BadgeCard>,
) -> Option<Entity> {
    let mut current = target;
    loop {
        if let Ok(card) = cards.get(current) {
            return Some(card.badge);
        }
        current = parents.get(current).ok()?.parent();
    }
}

fn on_region_over(
    trigger: Trigger<Pointer<Over>>,
    regions: Query<(), With<InteractiveRegion>>,
    parents: Query<&ChildOf>,
    cards: Query<&BadgeCard>,
    mut states: Query<&mut InteractionState>,
) {
    let target = trigger.target();
    if !regions.contains(target) {
        return;
    }
    let Some(badge) = owning_badge(target, &parents, &cards) else {
        return;
    };
    if let Ok(mut state) = states.get_mut(badge) {
        if !state.hovered() {
            state.pointer_enter();
            debug!("pointer entered a region of badge {badge}");
        }
    }
}

fn on_region_out(
    trigger: Trigger<Pointer<Out>>,
    regions: Query<(), With<InteractiveRegion>>,
    parents: Query<&ChildOf>,
    cards: Query<&BadgeCard>,
    mut states: Query<&mut InteractionState>,
) {
    let target = trigger.target();
    if !regions.contains(target) {
        return;
    }
    let Some(badge) = owning_badge(target, &parents, &cards) else {
        return;
    };
    if let Ok(mut state) = states.get_mut(badge) {
        if state.hovered() {
            state.pointer_leave();
            debug!("pointer left a region of badge {badge}");
        }
    }
}

fn on_region_pressed(
    trigger: Trigger<Pointer<Pressed>>,
    regions: Query<&InteractiveRegion>,
    parents: Query<&ChildOf>,
    cards: Query<&BadgeCard>,
    mut activations: EventWriter<RegionActivated>,
) {
    let target = trigger.target();
    let Ok(region) = regions.get(target) else {
        return;
    };
    let Some(badge) = owning_badge(target, &parents, &cards) else {
        return;
    };
    activations.write(RegionActivated {
        badge,
        region: region.id.clone(),
    });
    debug!("region {:?} of badge {badge} activated", region.id());
}

/// Swaps the window cursor to a pointer while any badge is hover-held, and
/// puts back whatever icon the application had set when none is. Only acts
/// on the hold edge, so applications remain free to manage the cursor while
/// no badge is involved. Headless apps have no window to decorate and are
/// left alone.
fn update_cursor_hint(
    badges: Query<(&InteractionState, Option<&HoverPulse>)>,
    windows: Query<(Entity, Option<&CursorIcon>), With<PrimaryWindow>>,
    mut engaged: Local<bool>,
    mut previous_icon: Local<Option<CursorIcon>>,
    mut commands: Commands,
) {
    let hover_held = badges
        .iter()
        .any(|(state, pulse)| state.hovered() || pulse.is_some_and(HoverPulse::is_live));
    if hover_held == *engaged {
        return;
    }
    *engaged = hover_held;

    let Ok((window, current_icon)) = windows.single() else {
        return;
    };
    if hover_held {
        *previous_icon = current_icon.cloned();
        commands
            .entity(window)
            .insert(CursorIcon::from(SystemCursorIcon::Pointer));
    } else if let Some(icon) = previous_icon.take() {
        commands.entity(window).insert(icon);
    } else {
        commands.entity(window).remove::<CursorIcon>();
    }
}
