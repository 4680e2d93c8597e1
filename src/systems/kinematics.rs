//! Projectile spawning and straight-line motion.

use bevy::prelude::*;

use crate::components::{GuidedHeading, Projectile};
use crate::types::{ProjectileKind, ProjectileSpawnParams};

/// Spawns a projectile entity and returns its id.
///
/// Remote projectiles also receive a [`GuidedHeading`] seeded with the
/// launch direction.
pub fn spawn_projectile(commands: &mut Commands, params: &ProjectileSpawnParams) -> Entity {
    let transform = Transform::from_translation(params.origin).looking_to(params.direction, Vec3::Y);
    let mut entity = commands.spawn((
        Name::new("Projectile"),
        params.to_projectile(),
        transform,
    ));
    if let Some(explosive) = params.explosive {
        entity.insert(explosive);
    }
    if params.kind == ProjectileKind::Remote {
        entity.insert(GuidedHeading(params.direction));
    }
    let id = entity.id();
    debug!(
        "Spawned {:?} projectile {id} at {} heading {}",
        params.kind, params.origin, params.direction
    );
    id
}

/// Advances every projectile by one tick.
///
/// Ages the projectile and removes it once dead or past its lifespan;
/// otherwise records the previous position and moves it along its heading.
pub fn advance_projectiles(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Transform, &mut Projectile, Option<&GuidedHeading>)>,
) {
    let dt = time.delta_secs();

    for (entity, mut transform, mut projectile, heading) in query.iter_mut() {
        projectile.age += dt;
        if projectile.is_expired() {
            commands.entity(entity).despawn();
            continue;
        }

        if let Some(GuidedHeading(heading)) = heading {
            projectile.direction = heading.normalize_or(projectile.direction);
        }

        projectile.previous_position = transform.translation;
        transform.translation += projectile.direction * projectile.speed * dt;
        if projectile.direction != Vec3::ZERO {
            transform.look_to(projectile.direction, Vec3::Y);
        }
    }
}
