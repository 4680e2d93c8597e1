//! Area damage with distance falloff, knockback and camera shake.

use avian3d::prelude::{Collider, LinearDamping, LinearVelocity, LockedAxes, RigidBody};
use bevy::prelude::*;
use bevy::ecs::message::MessageReader;

use crate::components::{Creature, Dead, Explosive, Health, Knockback, Player, Projectile, SceneryPiece};
use crate::events::ExplosionEvent;
use crate::resources::CombatConfig;
use crate::systems::damage::{apply_damage_to_target, CombatFeedback, DamageRequest, TargetCategory};
use crate::types::SoundCue;

/// Fraction of full effect at `distance` from an explosion.
///
/// `(1 - distance / radius)^falloff`, zero at or beyond the radius. The
/// result is non-increasing in distance for any non-negative falloff.
pub fn explosion_falloff(distance: f32, radius: f32, falloff: f32) -> f32 {
    if radius <= 0.0 || distance >= radius {
        return 0.0;
    }
    let normalized_distance = distance.max(0.0) / radius;
    (1.0 - normalized_distance).powf(falloff.max(0.0))
}

/// Calculate explosion damage at a given distance.
///
/// # Arguments
/// * `base_damage` - Damage at the centre
/// * `distance` - Distance from the centre
/// * `radius` - Blast radius
/// * `falloff` - Falloff exponent (1.0 = linear)
pub fn calculate_explosion_damage(base_damage: f32, distance: f32, radius: f32, falloff: f32) -> f32 {
    base_damage * explosion_falloff(distance, radius, falloff)
}

/// Knockback impulse for a target at `target` from an explosion at `center`.
///
/// Pushes away from the centre with a fixed upward lift of 0.5 before
/// scaling.
pub fn knockback_impulse(center: Vec3, target: Vec3, force: f32, ratio: f32) -> Vec3 {
    let mut direction = (target - center).normalize_or(Vec3::Y);
    direction.y = 0.5;
    direction * force * ratio
}

/// Explosion message for a projectile detonating at `center`.
pub fn explosion_from(entity: Entity, projectile: &Projectile, explosive: &Explosive, center: Vec3) -> ExplosionEvent {
    ExplosionEvent::new(center, explosive.radius, projectile.damage)
        .with_force(explosive.force)
        .with_falloff(explosive.falloff)
        .with_source(entity)
}

/// Speed below which a falling thrown creature counts as landed.
const SETTLE_SPEED: f32 = 0.05;

/// Hands a creature to avian as a dynamic body moving at `velocity`.
///
/// The collider is a sphere over the creature's hit volume, expressed in
/// local units because avian scales colliders by the transform.
fn throw(commands: &mut Commands, entity: Entity, creature: &Creature, scale: Vec3, velocity: Vec3, damping: f32) {
    let scale = scale.abs().max_element();
    let inverse = if scale > f32::EPSILON { scale.recip() } else { 1.0 };
    let body = Collider::compound(vec![(
        creature.center_offset * inverse,
        Quat::IDENTITY,
        Collider::sphere(creature.hit_radius() * inverse),
    )]);
    commands.entity(entity).insert((
        Knockback,
        RigidBody::Dynamic,
        body,
        LockedAxes::ROTATION_LOCKED,
        LinearVelocity(velocity),
        LinearDamping(damping),
    ));
}

/// Applies explosion damage, knockback and camera shake.
///
/// Destructible scenery is measured from its centre, creatures from the
/// centre of their hit sphere. Damage lands first; only creatures that
/// survive it are thrown. The player never takes explosion damage.
pub fn apply_explosions(
    mut commands: Commands,
    config: Res<CombatConfig>,
    mut explosions: MessageReader<ExplosionEvent>,
    mut targets: Query<
        (
            Entity,
            &Transform,
            &GlobalTransform,
            Option<&mut Health>,
            Option<&SceneryPiece>,
            Option<&Creature>,
            Option<&mut LinearVelocity>,
            Has<Dead>,
        ),
        Without<Player>,
    >,
    players: Query<&Transform, With<Player>>,
    mut feedback: CombatFeedback,
) {
    for explosion in explosions.read() {
        debug!(
            "Explosion at {} radius {} damage {}",
            explosion.center, explosion.radius, explosion.damage
        );
        feedback.sound_at(SoundCue::Explosion, explosion.center);

        for (entity, transform, global, health, scenery, creature, velocity, dead) in targets.iter_mut() {
            let Some(category) = TargetCategory::of(scenery, creature, false) else {
                continue;
            };
            let anchor = if creature.is_some() {
                transform.translation
            } else {
                global.translation()
            };
            let position = creature.map_or(anchor, |c| c.center(anchor));
            let distance = position.distance(explosion.center);
            let ratio = explosion_falloff(distance, explosion.radius, explosion.falloff);
            if ratio <= 0.0 {
                continue;
            }

            let killed = match health {
                Some(mut health) => {
                    let outcome = apply_damage_to_target(
                        &mut commands,
                        &mut feedback,
                        &config,
                        &mut health,
                        DamageRequest {
                            entity,
                            category,
                            position: anchor,
                            amount: explosion.damage * ratio,
                            source: explosion.source,
                        },
                    );
                    outcome.is_kill() || health.is_dead()
                }
                None => false,
            };

            let Some(creature) = creature else {
                continue;
            };
            let impulse = knockback_impulse(explosion.center, position, explosion.force, ratio);
            if dead || killed || impulse.length_squared() < 1e-6 {
                continue;
            }
            match velocity {
                Some(mut velocity) => {
                    velocity.0 = (velocity.0 + impulse).clamp_length_max(config.max_knockback_speed);
                }
                None => throw(
                    &mut commands,
                    entity,
                    creature,
                    transform.scale,
                    impulse.clamp_length_max(config.max_knockback_speed),
                    config.knockback_damping,
                ),
            }
        }

        for player in players.iter() {
            let distance = player.translation.distance(explosion.center);
            let ratio = explosion_falloff(distance, explosion.radius * config.shake_radius_factor, 1.0);
            feedback.shake(&config, config.explosion_shake * ratio);
        }
    }
}

/// Returns thrown creatures to their own locomotion once they land.
///
/// A creature has landed when it is falling and either reached the ground
/// plane or came to rest on top of something. The avian body is removed
/// and the creature is left standing at `y >= 0`.
pub fn settle_knockback(
    mut commands: Commands,
    mut thrown: Query<(Entity, &mut Transform, &LinearVelocity), With<Knockback>>,
) {
    for (entity, mut transform, velocity) in thrown.iter_mut() {
        let falling = velocity.y <= 0.0;
        let grounded = transform.translation.y <= 0.0;
        let resting = velocity.length() < SETTLE_SPEED;
        if !(falling && (grounded || resting)) {
            continue;
        }

        transform.translation.y = transform.translation.y.max(0.0);
        commands
            .entity(entity)
            .remove::<(Knockback, RigidBody, Collider, LockedAxes, LinearVelocity, LinearDamping)>();
        debug!("Creature {entity} landed at {}", transform.translation);
    }
}
