use avian3d::prelude::LinearVelocity;
use bevy::prelude::*;

use crate::components::{Creature, Dead, Projectile, SceneryPiece};
use crate::resources::CombatConfig;

/// Draw debug gizmos for projectiles.
///
/// Draws positions and a short heading line for live projectiles.
pub fn draw_projectile_debug(
    mut gizmos: Gizmos,
    query: Query<(&Transform, &Projectile)>,
    config: Res<CombatConfig>,
) {
    if !config.debug_draw {
        return;
    }

    for (transform, projectile) in query.iter() {
        gizmos.sphere(transform.translation, projectile.radius.max(0.05), Color::srgb(1.0, 0.0, 0.0));

        // Scaled down for visibility
        let end = transform.translation + projectile.direction * projectile.speed * 0.1;
        gizmos.line(transform.translation, end, Color::srgb(0.0, 1.0, 0.0));
    }
}

/// Draw creature hit spheres, thrown-body velocity and scenery boxes.
pub fn draw_target_debug(
    mut gizmos: Gizmos,
    creatures: Query<(&Transform, &Creature, Option<&LinearVelocity>, Has<Dead>)>,
    scenery: Query<(&GlobalTransform, &SceneryPiece)>,
    config: Res<CombatConfig>,
) {
    if !config.debug_draw {
        return;
    }

    for (transform, creature, velocity, dead) in creatures.iter() {
        let color = if dead {
            Color::srgb(0.4, 0.4, 0.4)
        } else {
            Color::srgb(1.0, 0.8, 0.0)
        };
        let center = creature.center(transform.translation);
        gizmos.sphere(center, creature.hit_radius(), color);
        if let Some(velocity) = velocity {
            gizmos.line(center, center + velocity.0 * 0.1, Color::srgb(0.0, 0.6, 1.0));
        }
    }

    for (global, piece) in scenery.iter() {
        let color = if piece.destructible {
            Color::srgb(1.0, 0.5, 0.0)
        } else {
            Color::srgb(0.5, 0.5, 0.5)
        };
        // Unit cube scaled to the box, then placed by the piece's transform
        let local = Transform::from_scale(piece.half_extents * 2.0);
        gizmos.cube(global.mul_transform(local), color);
    }
}
