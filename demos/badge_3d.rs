//! An interactive hanging badge. Hover the colored regions to freeze the
//! card, click one to activate it, and watch the keep-alive heuristic nudge
//! the badge whenever it starts to settle.

use avian3d::prelude::*;
use bevy::prelude::*;
use lanyard::prelude::*;

const REGIONS: [(&str, Vec3, Srgba); 4] = [
    ("linkedin", Vec3::new(-1.05, -1.2, 0.06), Srgba::new(0.0, 0.47, 0.71, 1.0)),
    ("github", Vec3::new(-0.35, -1.2, 0.06), Srgba::new(0.9, 0.9, 0.9, 1.0)),
    ("whatsapp", Vec3::new(0.35, -1.2, 0.06), Srgba::new(0.14, 0.83, 0.4, 1.0)),
    ("mail", Vec3::new(1.05, -1.2, 0.06), Srgba::new(0.9, 0.35, 0.2, 1.0)),
];

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            PhysicsPlugins::default(),
            MeshPickingPlugin,
            LanyardPlugins,
        ))
        .insert_resource(ClearColor(Color::srgb(0.05, 0.06, 0.09)))
        .add_systems(Startup, setup)
        .add_systems(Update, (dress_new_badges, draw_straps, follow_activations))
        .run();
}

fn setup(mut commands: Commands) -> Result {
    let config = BadgeConfig::default().with_tether(TetherKind::Rope { rest_length: 0.25 });
    commands.spawn((Name::new("badge"), Badge::new(config)?));

    // Light
    commands.spawn((
        PointLight {
            intensity: 2_000_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, 4.0),
    ));

    // Camera
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 0.5, 10.0).looking_at(Vec3::new(0.0, 0.5, 0.0), Vec3::Y),
    ));

    Ok(())
}

/// Gives freshly built rigs something to look at: meshes for the three bodies
/// and a row of clickable quads on the card face.
fn dress_new_badges(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    badges: Query<(&Badge, &BadgeRig), Added<BadgeRig>>,
) {
    for (badge, rig) in &badges {
        let config = badge.config();

        commands.entity(rig.anchor).insert((
            Mesh3d(meshes.add(Cuboid::from_length(0.2))),
            MeshMaterial3d(materials.add(Color::srgb(0.35, 0.35, 0.4))),
        ));

        commands.entity(rig.hinge).insert((
            Mesh3d(meshes.add(Sphere::new(config.hinge_radius))),
            MeshMaterial3d(materials.add(Color::srgb(0.6, 0.6, 0.65))),
        ));

        let card_size = 2.0 * config.card_half_extents;
        commands.entity(rig.card).insert((
            Mesh3d(meshes.add(Cuboid::new(card_size.x, card_size.y, card_size.z))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(0.12, 0.12, 0.14),
                perceptual_roughness: 0.6,
                ..default()
            })),
        ));

        for (id, offset, color) in REGIONS {
            commands.spawn((
                Name::new(format!("{id} region")),
                InteractiveRegion::new(id),
                ChildOf(rig.card),
                Mesh3d(meshes.add(Rectangle::new(0.45, 0.45))),
                MeshMaterial3d(materials.add(Color::Srgba(color))),
                Transform::from_translation(offset),
            ));
        }
    }
}

/// Draws each badge's strap as a polyline along its sampled curve.
fn draw_straps(badges: Query<&StrapCurve, With<Badge>>, mut gizmos: Gizmos) {
    for curve in &badges {
        gizmos.linestrip(curve.sample(32), Color::BLACK);
    }
}

/// Stands in for navigation: a real application would open the link.
fn follow_activations(mut activations: EventReader<RegionActivated>) {
    for activation in activations.read() {
        let destination = match activation.region.as_ref() {
            "linkedin" => "https://www.linkedin.com/",
            "github" => "https://github.com/",
            "whatsapp" => "https://web.whatsapp.com/",
            "mail" => "mailto:hello@example.com",
            other => {
                warn!("no destination configured for region `{other}`");
                continue;
            }
        };
        info!("opening {destination}");
    }
}
