use crate::prelude::*;
use approx::assert_relative_eq;
use avian3d::{math::*, prelude::*};
use bevy::{asset::AssetPlugin, prelude::*, scene::ScenePlugin, time::TimeUpdateStrategy};
use core::time::Duration;

fn create_app() -> App {
    let mut app = App::new();

    // Collider initialization needs mesh and scene assets even headless.
    app.add_plugins((
        MinimalPlugins,
        AssetPlugin::default(),
        ScenePlugin,
        TransformPlugin,
        PhysicsPlugins::default(),
        LanyardPlugins,
    ))
    .init_resource::<Assets<Mesh>>()
    .insert_resource(Gravity(Vector::NEG_Y * 10.0))
    .insert_resource(Time::<Fixed>::from_hz(60.0))
    .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
        1.0 / 60.0,
    )));

    app.finish();

    app
}

/// Advances the app by whole frames. The manual time strategy matches the
/// fixed timestep, so every frame runs exactly one physics tick.
fn tick(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

fn spawn_badge(app: &mut App, config: BadgeConfig) -> Entity {
    let badge = app
        .world_mut()
        .spawn(Badge::new(config).expect("valid badge config"))
        .id();
    // The construction observer spawns the bodies through commands; flush so
    // they exist before the first update.
    app.world_mut().flush();
    badge
}

fn rig(app: &App, badge: Entity) -> BadgeRig {
    *app.world()
        .entity(badge)
        .get::<BadgeRig>()
        .expect("rig should be built on spawn")
}

fn hover(app: &mut App, badge: Entity, hovered: bool) {
    let mut entity = app.world_mut().entity_mut(badge);
    let mut state = entity.get_mut::<InteractionState>().unwrap();
    if hovered {
        state.pointer_enter();
    } else {
        state.pointer_leave();
    }
}

/// Keep-alive tuning that never fires, for tests that want an undisturbed card.
fn quiet_keep_alive() -> KeepAliveConfig {
    KeepAliveConfig {
        floor: 0.0,
        ceiling: Scalar::INFINITY,
        ..default()
    }
}

#[test]
fn plugins_build_without_errors() {
    let mut app = create_app();
    tick(&mut app, 120);
}

#[test]
fn rig_spawns_taut_below_the_anchor() {
    let mut app = create_app();
    let config = BadgeConfig::default()
        .with_anchor_position(Vector::new(0.0, 3.0, 0.0))
        .with_tether(TetherKind::Rope { rest_length: 1.0 });
    let badge = spawn_badge(&mut app, config);
    let rig = rig(&app, badge);

    let world = app.world();
    let translation =
        |entity: Entity| world.entity(entity).get::<Transform>().unwrap().translation;

    assert_eq!(translation(rig.anchor), Vec3::new(0.0, 3.0, 0.0));
    assert_eq!(translation(rig.hinge), Vec3::new(0.0, 2.0, 0.0));

    // The clasp hangs one rest length below the hinge, and the card's origin
    // sits at the clasp minus the local attachment offset.
    let card = translation(rig.card);
    assert_relative_eq!(card.x, -0.09);
    assert_relative_eq!(card.y, -1.0);
    assert_relative_eq!(card.z, -0.05);
}

#[test]
fn card_stays_attached_and_in_motion() {
    let mut app = create_app();
    let config = BadgeConfig::default()
        .with_anchor_position(Vector::ZERO)
        .with_rope_length(1.0)
        .with_tether(TetherKind::Rope { rest_length: 2.2 });
    let badge = spawn_badge(&mut app, config);
    let rig = rig(&app, badge);

    tick(&mut app, 60);

    let world = app.world();
    let hinge = world.entity(rig.hinge).get::<Position>().unwrap().0;
    let card_position = world.entity(rig.card).get::<Position>().unwrap().0;
    let card_rotation = world.entity(rig.card).get::<Rotation>().unwrap().0;

    // The tether constrains the clasp point on the card, not its center.
    let clasp = card_position + card_rotation * config.card_anchor;
    let separation = hinge.distance(clasp);
    assert!(
        separation <= 2.2 + 0.1,
        "tether overstretched after a second of simulation: {separation}"
    );

    let angular_speed = world
        .entity(rig.card)
        .get::<AngularVelocity>()
        .unwrap()
        .0
        .length();
    assert!(
        angular_speed > 0.0,
        "the keep-alive heuristic should keep the card moving"
    );
}

#[test]
fn hover_freezes_card_within_the_frame() {
    let mut app = create_app();
    let badge = spawn_badge(
        &mut app,
        BadgeConfig::default().with_keep_alive(quiet_keep_alive()),
    );
    let rig = rig(&app, badge);

    tick(&mut app, 5);
    hover(&mut app, badge, true);
    tick(&mut app, 1);

    let card = app.world().entity(rig.card);
    assert_eq!(card.get::<RigidBody>(), Some(&RigidBody::Kinematic));
    assert_eq!(card.get::<LinearVelocity>().unwrap().0, Vector::ZERO);
    assert_eq!(card.get::<AngularVelocity>().unwrap().0, Vector::ZERO);

    // While held, the card must not drift or pick up momentum.
    let frozen = card.get::<Position>().unwrap().0;
    tick(&mut app, 3);
    let card = app.world().entity(rig.card);
    assert_eq!(card.get::<Position>().unwrap().0, frozen);
    assert_eq!(card.get::<LinearVelocity>().unwrap().0, Vector::ZERO);
    assert_eq!(card.get::<AngularVelocity>().unwrap().0, Vector::ZERO);
    assert_eq!(card.get::<ExternalImpulse>().unwrap().impulse(), Vector::ZERO);

    hover(&mut app, badge, false);
    tick(&mut app, 1);
    assert_eq!(
        app.world().entity(rig.card).get::<RigidBody>(),
        Some(&RigidBody::Dynamic)
    );
}

#[test]
fn repeated_enter_is_a_no_op() {
    let mut app = create_app();
    let badge = spawn_badge(
        &mut app,
        BadgeConfig::default().with_keep_alive(quiet_keep_alive()),
    );
    let rig = rig(&app, badge);

    tick(&mut app, 3);
    hover(&mut app, badge, true);
    tick(&mut app, 1);

    let snapshot = |app: &App| {
        let card = app.world().entity(rig.card);
        (
            *card.get::<RigidBody>().unwrap(),
            card.get::<Position>().unwrap().0,
            card.get::<Rotation>().unwrap().0,
            card.get::<LinearVelocity>().unwrap().0,
        )
    };
    let before = snapshot(&app);

    // A second enter while already hovered must not disturb the frozen pose.
    hover(&mut app, badge, true);
    tick(&mut app, 2);

    assert_eq!(snapshot(&app), before);
}

#[test]
fn body_type_tracks_hover_every_frame() {
    let mut app = create_app();
    let badge = spawn_badge(
        &mut app,
        BadgeConfig::default().with_keep_alive(quiet_keep_alive()),
    );
    let rig = rig(&app, badge);

    for frame in 0..40 {
        if frame == 10 {
            hover(&mut app, badge, true);
        }
        if frame == 25 {
            hover(&mut app, badge, false);
        }
        tick(&mut app, 1);

        let expected = if (10..25).contains(&frame) {
            RigidBody::Kinematic
        } else {
            RigidBody::Dynamic
        };
        assert_eq!(
            app.world().entity(rig.card).get::<RigidBody>(),
            Some(&expected),
            "wrong body type on frame {frame}"
        );
    }
}

#[test]
fn flick_pulses_hover_exactly_once() {
    let mut app = create_app();
    let keep_alive = KeepAliveConfig {
        floor: 0.0,
        ceiling: 3.0,
        ..default()
    };
    let badge = spawn_badge(&mut app, BadgeConfig::default().with_keep_alive(keep_alive));
    let rig = rig(&app, badge);

    tick(&mut app, 2);

    // Throw the card into a spin well above the ceiling.
    app.world_mut()
        .entity_mut(rig.card)
        .insert(AngularVelocity(Vector::new(0.0, 8.0, 0.0)));
    tick(&mut app, 1);

    assert!(app.world().entity(badge).contains::<HoverPulse>());
    assert_eq!(
        app.world().entity(rig.card).get::<RigidBody>(),
        Some(&RigidBody::Kinematic)
    );

    // The default pulse lasts 50 ms: three ticks at 60 Hz.
    tick(&mut app, 4);
    assert!(!app.world().entity(badge).contains::<HoverPulse>());
    assert_eq!(
        app.world().entity(rig.card).get::<RigidBody>(),
        Some(&RigidBody::Dynamic)
    );

    // Freezing consumed the spin, so the pulse must not retrigger on its own.
    for _ in 0..30 {
        tick(&mut app, 1);
        assert!(!app.world().entity(badge).contains::<HoverPulse>());
    }
}

#[test]
fn card_impulses_are_single_shot() {
    let mut app = create_app();
    let badge = spawn_badge(&mut app, BadgeConfig::default());
    let rig = rig(&app, badge);

    // The accumulator starts zeroed and non-persistent, so a keep-alive
    // write is consumed by exactly one solver step.
    let impulse = app.world().entity(rig.card).get::<ExternalImpulse>().unwrap();
    assert!(!impulse.persistent);
    assert_eq!(impulse.impulse(), Vector::ZERO);
}

#[test]
fn idle_badge_receives_corrective_impulses() {
    let mut app = create_app();
    let keep_alive = KeepAliveConfig {
        floor: 0.5,
        ceiling: Scalar::INFINITY,
        ..default()
    };
    let badge = spawn_badge(&mut app, BadgeConfig::default().with_keep_alive(keep_alive));
    let rig = rig(&app, badge);

    tick(&mut app, 10);

    let angular_speed = app
        .world()
        .entity(rig.card)
        .get::<AngularVelocity>()
        .unwrap()
        .0
        .length();
    assert!(
        angular_speed > 0.0,
        "an idle card should be nudged back into motion"
    );
}

#[test]
fn gravity_scale_zero_leaves_the_card_at_rest() {
    let mut app = create_app();
    let mut config = BadgeConfig::default().with_keep_alive(quiet_keep_alive());
    config.gravity_scale = 0.0;
    let badge = spawn_badge(&mut app, config);
    let rig = rig(&app, badge);

    tick(&mut app, 10);

    // The chain spawns with every joint at rest, so without gravity there is
    // nothing to move the card off its initial pose.
    let card = app.world().entity(rig.card).get::<Position>().unwrap().0;
    assert_relative_eq!(card.x, -0.09);
    assert_relative_eq!(card.y, 0.0);
    assert_relative_eq!(card.z, -0.05);
}

#[test]
fn strap_curve_stays_finite() {
    let mut app = create_app();
    let badge = spawn_badge(&mut app, BadgeConfig::default());

    // Before the first update the curve still holds its placeholder value.
    let curve = *app.world().entity(badge).get::<StrapCurve>().unwrap();
    assert!(curve.is_degenerate());

    for _ in 0..120 {
        tick(&mut app, 1);
        let curve = *app.world().entity(badge).get::<StrapCurve>().unwrap();
        assert!(!curve.is_degenerate());
        assert!(
            curve.points().iter().all(|point| point.is_finite()),
            "strap control points must stay finite, got {:?}",
            curve.points()
        );
    }
}

#[test]
fn construction_is_deterministic() {
    use itertools::Itertools;

    fn strap_after(frames: usize) -> [Vec3; 4] {
        let mut app = create_app();
        let badge = spawn_badge(
            &mut app,
            BadgeConfig::default().with_tether(TetherKind::Rope { rest_length: 0.4 }),
        );
        tick(&mut app, frames);
        app.world()
            .entity(badge)
            .get::<StrapCurve>()
            .unwrap()
            .points()
    }

    // Identical configurations must evolve identically from construction.
    for (a, b) in (0..3).map(|_| strap_after(3)).tuple_windows() {
        assert_eq!(a, b);
    }
}

#[test]
fn recreating_a_badge_reproduces_the_initial_curve() {
    let mut app = create_app();
    let config = BadgeConfig::default().with_keep_alive(quiet_keep_alive());

    let badge = spawn_badge(&mut app, config);
    tick(&mut app, 1);
    let first = app
        .world()
        .entity(badge)
        .get::<StrapCurve>()
        .unwrap()
        .points();

    tick(&mut app, 20);
    app.world_mut().entity_mut(badge).despawn();
    tick(&mut app, 2);

    // Teardown leaves no rig bodies behind.
    let mut cards = app.world_mut().query::<&BadgeCard>();
    assert_eq!(cards.iter(app.world()).count(), 0);

    let badge = spawn_badge(&mut app, config);
    tick(&mut app, 1);
    let second = app
        .world()
        .entity(badge)
        .get::<StrapCurve>()
        .unwrap()
        .points();

    assert_eq!(first, second);
}
