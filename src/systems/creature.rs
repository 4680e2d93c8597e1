//! Armed enemy behaviour: detect, turn, close in and shoot.

use std::f32::consts::{PI, TAU};

use bevy::prelude::*;

use crate::components::{Creature, Dead, EnemyBrain, Health, Knockback, Player, SceneryPiece};
use crate::resources::{CombatConfig, CombatRng, WeaponPresets};
use crate::systems::fire_control::{launch, FireEffects};
use crate::types::{AiState, Faction, ProjectileKind, SoundCue};
use crate::weapon::{ProjectileSpec, Weapon};

/// Preset looked up for enemy weapons.
pub const ENEMY_WEAPON_PRESET: &str = "enemy_rifle";

/// Health of a freshly spawned enemy.
pub const ENEMY_HEALTH: f32 = 50.0;

fn fallback_enemy_weapon() -> Weapon {
    Weapon::new(
        10.0,
        2.0,
        ProjectileSpec {
            kind: ProjectileKind::Physical,
            speed: 20.0,
            lifespan: 5.0,
            radius: 0.1,
            ..Default::default()
        },
    )
    .with_spread(0.04)
    .with_sound(SoundCue::EnemyShoot)
}

/// Spawns an armed enemy standing at `position`.
///
/// The weapon comes from the `enemy_rifle` preset when present.
pub fn spawn_enemy(commands: &mut Commands, presets: &WeaponPresets, position: Vec3) -> Entity {
    let weapon = presets
        .get(ENEMY_WEAPON_PRESET)
        .map(|preset| preset.weapon())
        .unwrap_or_else(fallback_enemy_weapon)
        .with_faction(Faction::Hostile);

    let id = commands
        .spawn((
            Name::new("Enemy"),
            Creature::hostile(),
            Health::new(ENEMY_HEALTH),
            EnemyBrain::default(),
            weapon,
            Transform::from_translation(position),
        ))
        .id();
    debug!("Spawned enemy {id} at {position}");
    id
}

/// Wraps an angle into `[-PI, PI)`.
fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Rotates `yaw` toward `target` by at most `max_step` radians, the short way round.
pub fn turn_towards(yaw: f32, target: f32, max_step: f32) -> f32 {
    let diff = wrap_angle(target - yaw);
    wrap_angle(yaw + diff.clamp(-max_step, max_step))
}

/// Clips a horizontal `step` of a body at `center` against scenery.
///
/// The part of the step that would carry the body further into a piece it
/// touches is removed, so the body slides along walls and stops dead when
/// walking straight into one.
pub fn clip_step<'a>(
    scenery: impl IntoIterator<Item = (&'a GlobalTransform, &'a SceneryPiece)>,
    center: Vec3,
    radius: f32,
    step: Vec3,
) -> Vec3 {
    let mut step = step;
    for (wall, piece) in scenery {
        let next = center + step;
        let mut away = next - piece.closest_point(wall, next);
        if away.length_squared() > radius * radius {
            continue;
        }
        away.y = 0.0;
        let Some(normal) = away.try_normalize() else {
            return Vec3::ZERO;
        };
        let into = step.dot(normal);
        if into < 0.0 {
            step -= normal * into;
        }
    }
    step
}

/// Runs every live enemy for one tick.
///
/// Enemies go idle when the player is out of detection range or dead.
/// Enemies thrown by an explosion sit out until they land.
#[allow(clippy::too_many_arguments)]
pub fn run_enemy_ai(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<CombatConfig>,
    mut rng: ResMut<CombatRng>,
    mut enemies: Query<
        (Entity, &mut Transform, &Creature, &mut EnemyBrain, &mut Weapon),
        (Without<Dead>, Without<Player>, Without<Knockback>),
    >,
    players: Query<(&Transform, Option<&Health>), (With<Player>, Without<EnemyBrain>)>,
    scenery: Query<(&GlobalTransform, &SceneryPiece), Without<EnemyBrain>>,
    mut effects: FireEffects,
) {
    let dt = time.delta_secs();
    let target = players
        .iter()
        .find(|(_, health)| !health.is_some_and(|h| h.is_dead()))
        .map(|(transform, _)| transform.translation);

    for (entity, mut transform, creature, mut brain, mut weapon) in enemies.iter_mut() {
        let Some(target) = target else {
            brain.state = AiState::Idle;
            continue;
        };

        let distance = transform.translation.distance(target);
        if distance > brain.detection_range {
            brain.state = AiState::Idle;
            continue;
        }

        let to_player = target - transform.translation;
        let desired_yaw = to_player.x.atan2(to_player.z);
        brain.yaw = turn_towards(brain.yaw, desired_yaw, brain.turn_speed * dt);
        transform.rotation = Quat::from_rotation_y(brain.yaw);

        if distance > brain.hold_distance() {
            if brain.state != AiState::Pursuing {
                debug!("Enemy {entity} pursuing at distance {distance:.1}");
            }
            brain.state = AiState::Pursuing;
            let heading = Vec3::new(to_player.x, 0.0, to_player.z).normalize_or_zero();
            let step = clip_step(
                scenery.iter(),
                creature.center(transform.translation),
                creature.hit_radius(),
                heading * brain.move_speed * dt,
            );
            transform.translation += step;
        } else {
            brain.state = AiState::Attacking;
        }

        if distance < brain.attack_range && weapon.try_fire() {
            let origin = transform.translation + Quat::from_rotation_y(brain.yaw) * brain.gun_offset;
            let aim = (target - origin).normalize_or(brain.facing());
            launch(&mut commands, &mut rng.0, &config, &mut effects, &weapon, entity, origin, aim);
        }
    }
}
