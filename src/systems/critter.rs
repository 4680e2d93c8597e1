//! Decorative hopping critters.

use std::f32::consts::PI;

use bevy::prelude::*;
use bevy::ecs::message::MessageWriter;
use rand::Rng;

use crate::components::{random_ground_direction, Creature, Critter, Dead, Health, Knockback, SceneryPiece};
use crate::events::SoundEvent;
use crate::resources::{CombatConfig, CombatRng};
use crate::types::{HopPhase, SoundCue};

pub const CRITTER_HEALTH: f32 = 10.0;

/// Spawns a critter with randomized size and hop parameters.
pub fn spawn_critter(commands: &mut Commands, rng: &mut impl Rng, position: Vec3) -> Entity {
    let scale = rng.random_range(0.3..0.5);
    let critter = Critter {
        base_height: position.y,
        ..Critter::random(rng)
    };
    commands
        .spawn((
            Name::new("Critter"),
            Creature::critter(scale),
            Health::new(CRITTER_HEALTH),
            critter,
            Transform::from_translation(position).with_scale(Vec3::splat(scale)),
        ))
        .id()
}

/// Height above `base_height` at hop progress `progress`.
pub fn hop_height(critter: &Critter) -> f32 {
    match critter.phase {
        HopPhase::Resting => 0.0,
        HopPhase::Hopping => (critter.hop_progress * PI).sin() * critter.hop_height,
    }
}

/// Forward distance covered this tick; front-loaded around mid-hop.
pub fn hop_step(critter: &Critter, dt: f32) -> f32 {
    dt * critter.hop_speed * 2.0 * (1.0 - (critter.hop_progress - 0.5).abs() * 1.5)
}

/// Whether a sphere at `center` overlaps the scenery piece.
fn sphere_touches(piece: &SceneryPiece, wall: &GlobalTransform, center: Vec3, radius: f32) -> bool {
    piece.closest_point(wall, center).distance_squared(center) <= radius * radius
}

/// Whether a critter at `center` moving along `direction` runs into the piece.
///
/// Critters already heading away from a piece they touch are left alone so
/// they do not flip back and forth while clearing it.
fn heading_into(piece: &SceneryPiece, wall: &GlobalTransform, center: Vec3, radius: f32, direction: Vec3) -> bool {
    sphere_touches(piece, wall, center, radius) && direction.dot(center - piece.closest_point(wall, center)) <= 0.0
}

/// Advances every live critter by one tick.
///
/// Critters being thrown by an explosion pause until they land.
pub fn run_critters(
    time: Res<Time>,
    config: Res<CombatConfig>,
    mut rng: ResMut<CombatRng>,
    mut critters: Query<(&mut Transform, &mut Critter, &Creature, Has<Knockback>), Without<Dead>>,
    scenery: Query<(&GlobalTransform, &SceneryPiece), Without<Critter>>,
    mut sounds: MessageWriter<SoundEvent>,
) {
    let dt = time.delta_secs();
    let rng = &mut rng.0;

    for (mut transform, mut critter, creature, thrown) in critters.iter_mut() {
        if thrown {
            critter.base_height = transform.translation.y.max(0.0);
            continue;
        }

        match critter.phase {
            HopPhase::Resting => {
                critter.rest_elapsed += dt;
                if critter.rest_elapsed >= critter.rest_time {
                    critter.rest_elapsed = 0.0;
                    critter.phase = HopPhase::Hopping;
                    critter.hop_progress = 0.0;
                    if rng.random::<f32>() < 0.3 {
                        critter.direction = random_ground_direction(rng);
                    }
                    sounds.write(SoundEvent::at(SoundCue::Hop, transform.translation));
                }
            }
            HopPhase::Hopping => {
                critter.hop_progress += dt * critter.hop_speed;
                if critter.hop_progress >= 1.0 {
                    critter.phase = HopPhase::Resting;
                    critter.hop_progress = 0.0;
                    critter.rest_time = critter.hop_interval * (0.5 + rng.random::<f32>());
                } else {
                    let step = critter.direction * hop_step(&critter, dt);
                    transform.translation += step;
                }
            }
        }
        transform.translation.y = critter.base_height + hop_height(&critter);

        let radius = creature.hit_radius();
        let blocked = scenery
            .iter()
            .any(|(wall, piece)| heading_into(piece, wall, transform.translation, radius, critter.direction));
        if blocked {
            let reversed = -critter.direction
                + Vec3::new(rng.random_range(-0.2..0.2), 0.0, rng.random_range(-0.2..0.2));
            critter.direction = reversed.normalize_or(-critter.direction);
            let push = critter.direction * 0.2;
            transform.translation += push;
        }

        let bound = config.world_half_extent;
        let position = transform.translation;
        if position.x.abs() > bound || position.z.abs() > bound {
            critter.direction = Vec3::new(-position.x, 0.0, -position.z).normalize_or(critter.direction);
        }

        if critter.direction != Vec3::ZERO {
            transform.rotation = Quat::from_rotation_y(critter.direction.x.atan2(critter.direction.z));
        }
    }
}
