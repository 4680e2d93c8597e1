//! Core components for projectiles, damageable targets and creatures.

use avian3d::prelude::Collider;
use bevy::prelude::*;
use rand::Rng;
use serde::Deserialize;

use crate::types::{AiState, CreatureKind, DamageOutcome, Faction, HopPhase, ProjectileKind};

/// A projectile in flight.
///
/// Position lives in the entity's `Transform`. The projectile moves along
/// `direction` at `speed` each tick and is removed once it is no longer
/// `alive` or has outlived `lifespan`.
///
/// # Fields
/// * `kind` - Flight model
/// * `direction` - Unit heading
/// * `speed` - Meters per second
/// * `damage` - Damage applied on a direct hit (and explosion base damage)
/// * `radius` - Collision padding added to creature and player spheres
/// * `age` - Seconds since spawn
/// * `lifespan` - Seconds before the projectile expires
/// * `alive` - Cleared when the projectile is resolved
/// * `previous_position` - Position at the start of the last step, used by the per-tick ray cast
/// * `origin` - Spawn position, used by the out-of-bounds guard
/// * `max_distance` - Travel distance from `origin` after which the projectile is dropped
/// * `owner` - Weapon or creature that fired it
/// * `faction` - Decides which targets the projectile can hit
#[derive(Component, Reflect, Clone, Debug)]
#[reflect(Component)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub direction: Vec3,
    pub speed: f32,
    pub damage: f32,
    pub radius: f32,
    pub age: f32,
    pub lifespan: f32,
    pub alive: bool,
    pub previous_position: Vec3,
    pub origin: Vec3,
    pub max_distance: f32,
    pub owner: Entity,
    pub faction: Faction,
}

impl Projectile {
    /// True when the projectile should be removed this tick.
    pub fn is_expired(&self) -> bool {
        !self.alive || self.age > self.lifespan
    }

    /// Distance travelled from the spawn point.
    pub fn travelled(&self, position: Vec3) -> f32 {
        position.distance(self.origin)
    }
}

/// Explosive payload carried by a projectile.
///
/// `falloff` is the exponent of the damage curve; `1.0` gives the linear
/// `1 - distance / radius` ramp.
#[derive(Component, Reflect, Clone, Copy, Debug, PartialEq, Deserialize)]
#[reflect(Component)]
pub struct Explosive {
    pub radius: f32,
    pub force: f32,
    #[serde(default = "default_falloff")]
    pub falloff: f32,
}

fn default_falloff() -> f32 {
    1.0
}

impl Explosive {
    pub fn new(radius: f32, force: f32) -> Self {
        Self {
            radius,
            force,
            falloff: default_falloff(),
        }
    }

    pub fn with_falloff(mut self, falloff: f32) -> Self {
        self.falloff = falloff;
        self
    }
}

/// Heading handed to a remote projectile by its controlling weapon.
#[derive(Component, Reflect, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct GuidedHeading(pub Vec3);

/// Hit points of a damageable target.
///
/// A target whose `current` is at or below zero is dead. Dead targets ignore
/// further damage, so destruction effects fire exactly once.
///
/// # Example
/// ```
/// use bevy_fps_combat::components::Health;
/// use bevy_fps_combat::types::DamageOutcome;
///
/// let mut wall = Health::new(100.0);
/// assert_eq!(wall.apply_damage(40.0), DamageOutcome::Damaged { remaining: 60.0 });
/// ```
#[derive(Component, Reflect, Clone, Copy, Debug, PartialEq)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }

    /// Subtracts `amount` and reports what happened.
    ///
    /// Non-positive amounts and hits on dead targets are ignored. A killing
    /// blow clamps health to zero.
    pub fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.is_dead() || amount <= 0.0 || amount.is_nan() {
            return DamageOutcome::Ignored;
        }

        self.current -= amount;
        if self.current <= 0.0 {
            self.current = 0.0;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Damaged {
                remaining: self.current,
            }
        }
    }
}

/// Static scenery: a box of `half_extents` in the entity's local space.
///
/// The box follows the entity's `GlobalTransform`, so rotation, scale and
/// parenting all apply. A matching avian collider is attached on the first
/// tick. Indestructible pieces stop projectiles but never take damage.
#[derive(Component, Reflect, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct SceneryPiece {
    pub half_extents: Vec3,
    pub destructible: bool,
}

impl SceneryPiece {
    pub fn destructible(half_extents: Vec3) -> Self {
        Self {
            half_extents,
            destructible: true,
        }
    }

    pub fn solid(half_extents: Vec3) -> Self {
        Self {
            half_extents,
            destructible: false,
        }
    }

    /// Collider covering the box. Avian applies the transform's scale.
    pub fn collider(&self) -> Collider {
        let size = self.half_extents * 2.0;
        Collider::cuboid(size.x, size.y, size.z)
    }

    /// Point of the box nearest to `point`, in world space.
    ///
    /// Returns `point` itself when it lies inside the box.
    pub fn closest_point(&self, global: &GlobalTransform, point: Vec3) -> Vec3 {
        let local = global.affine().inverse().transform_point3(point);
        global.transform_point(local.clamp(-self.half_extents, self.half_extents))
    }
}

/// A living, hittable creature.
///
/// The hit volume is a sphere of radius `base_radius * scale` around
/// `translation + center_offset`.
#[derive(Component, Reflect, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct Creature {
    pub kind: CreatureKind,
    pub base_radius: f32,
    pub scale: f32,
    pub center_offset: Vec3,
}

impl Creature {
    /// A humanoid enemy whose torso sits 1.5 above its feet.
    pub fn hostile() -> Self {
        Self {
            kind: CreatureKind::Hostile,
            base_radius: 1.0,
            scale: 1.0,
            center_offset: Vec3::new(0.0, 1.5, 0.0),
        }
    }

    pub fn critter(scale: f32) -> Self {
        Self {
            kind: CreatureKind::Critter,
            base_radius: 1.0,
            scale,
            center_offset: Vec3::ZERO,
        }
    }

    pub fn hit_radius(&self) -> f32 {
        self.base_radius * self.scale
    }

    pub fn center(&self, translation: Vec3) -> Vec3 {
        translation + self.center_offset
    }
}

/// Marker for the player's viewpoint entity.
#[derive(Component, Reflect, Clone, Copy, Debug, Default)]
#[reflect(Component)]
pub struct Player;

/// Marker for a creature thrown by an explosion.
///
/// While present the creature is a dynamic avian body: its motion comes
/// from `LinearVelocity` and gravity, and its AI is paused until it lands.
#[derive(Component, Reflect, Clone, Copy, Debug, Default)]
#[reflect(Component)]
pub struct Knockback;

/// Marker for creatures that have been killed.
#[derive(Component, Reflect, Clone, Copy, Debug, Default)]
#[reflect(Component)]
pub struct Dead;

/// Seconds before a dead creature is removed from the world.
#[derive(Component, Reflect, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct CorpseTimer {
    pub remaining: f32,
}

/// Behaviour state of an armed enemy.
///
/// The enemy's own `Weapon` component gates its fire rate.
///
/// # Fields
/// * `state` - Current behaviour
/// * `detection_range` - Beyond this distance the enemy stays idle
/// * `attack_range` - Within this distance the enemy fires
/// * `move_speed` - Pursuit speed in meters per second
/// * `turn_speed` - Maximum yaw rate in radians per second
/// * `yaw` - Current facing around +Y, zero faces +Z
/// * `gun_offset` - Muzzle position relative to the feet in facing space
#[derive(Component, Reflect, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct EnemyBrain {
    pub state: AiState,
    pub detection_range: f32,
    pub attack_range: f32,
    pub move_speed: f32,
    pub turn_speed: f32,
    pub yaw: f32,
    pub gun_offset: Vec3,
}

impl Default for EnemyBrain {
    fn default() -> Self {
        Self {
            state: AiState::Idle,
            detection_range: 30.0,
            attack_range: 20.0,
            move_speed: 1.5,
            turn_speed: 2.0,
            yaw: 0.0,
            gun_offset: Vec3::new(0.6, 1.5, 0.4),
        }
    }
}

impl EnemyBrain {
    pub fn facing(&self) -> Vec3 {
        Quat::from_rotation_y(self.yaw) * Vec3::Z
    }

    /// Distance below which the enemy stops closing in.
    pub fn hold_distance(&self) -> f32 {
        self.attack_range * 0.5
    }
}

/// Hop locomotion of a critter.
#[derive(Component, Reflect, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct Critter {
    pub phase: HopPhase,
    pub direction: Vec3,
    pub hop_height: f32,
    pub hop_speed: f32,
    pub hop_interval: f32,
    pub hop_progress: f32,
    pub rest_time: f32,
    pub rest_elapsed: f32,
    pub base_height: f32,
}

impl Default for Critter {
    fn default() -> Self {
        Self {
            phase: HopPhase::Resting,
            direction: Vec3::Z,
            hop_height: 0.6,
            hop_speed: 2.5,
            hop_interval: 2.0,
            hop_progress: 0.0,
            rest_time: 1.0,
            rest_elapsed: 0.0,
            base_height: 0.0,
        }
    }
}

impl Critter {
    /// Rolls a critter with randomized hop parameters.
    pub fn random(rng: &mut impl Rng) -> Self {
        let hop_interval = rng.random_range(1.0..3.0);
        Self {
            direction: random_ground_direction(rng),
            hop_height: rng.random_range(0.5..0.8),
            hop_speed: rng.random_range(2.0..3.5),
            hop_interval,
            rest_time: hop_interval * rng.random_range(0.0..1.0),
            ..Default::default()
        }
    }
}

/// A random unit vector in the XZ plane.
pub fn random_ground_direction(rng: &mut impl Rng) -> Vec3 {
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    Vec3::new(angle.cos(), 0.0, angle.sin())
}
