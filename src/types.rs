//! Shared types and enums for the combat system.

use bevy::prelude::*;
use serde::Deserialize;

use crate::components::{Explosive, Projectile};

/// Flight model of a projectile.
///
/// # Variants
/// * `Instant` - Very fast bullet, still resolved by a ray cast each tick
/// * `Physical` - Regular bullet travelling in a straight line
/// * `Explosive` - Detonates on any hit, carries an [`Explosive`] payload
/// * `Remote` - Player-piloted projectile, steered each tick and detonated on command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    Instant,
    #[default]
    Physical,
    Explosive,
    Remote,
}

/// Side a projectile was fired for.
///
/// Player projectiles test against creatures; hostile projectiles test
/// against the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum Faction {
    #[default]
    Player,
    Hostile,
}

/// Kind of creature, selects AI and audio cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum CreatureKind {
    /// Armed enemy that pursues and shoots the player
    #[default]
    Hostile,
    /// Ambient wandering critter
    Critter,
}

/// Enemy behaviour state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum AiState {
    #[default]
    Idle,
    Pursuing,
    Attacking,
}

/// Critter locomotion phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum HopPhase {
    #[default]
    Resting,
    Hopping,
}

/// Barrel state of a spin-up weapon, derived from rotation speed and trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum SpinPhase {
    #[default]
    Idle,
    SpinningUp,
    Firing,
    SpinningDown,
}

/// Control state of a guided weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum GuidedPhase {
    #[default]
    Idle,
    Controlled,
}

/// Named audio cue handed to the audio collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    #[default]
    Shoot,
    ShootPistol,
    ShootAkimbo,
    ShootTranslocator,
    TranslocatorTransition,
    TranslocatorTeleport,
    EnemyShoot,
    Impact,
    Explosion,
    Hit,
    Scream,
    Death,
    Hop,
}

impl SoundCue {
    /// Event name understood by the audio layer.
    pub fn name(&self) -> &'static str {
        match self {
            SoundCue::Shoot => "shoot",
            SoundCue::ShootPistol => "shoot_pistol",
            SoundCue::ShootAkimbo => "shoot_akimbo",
            SoundCue::ShootTranslocator => "shoot_translocator",
            SoundCue::TranslocatorTransition => "translocator_transition",
            SoundCue::TranslocatorTeleport => "translocator_teleport",
            SoundCue::EnemyShoot => "enemy_shoot",
            SoundCue::Impact => "impact",
            SoundCue::Explosion => "explosion",
            SoundCue::Hit => "hit",
            SoundCue::Scream => "scream",
            SoundCue::Death => "death",
            SoundCue::Hop => "hop",
        }
    }
}

/// Result of applying damage to a [`crate::components::Health`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Target already dead or amount was not positive; nothing changed
    Ignored,
    /// Health decreased but the target survives
    Damaged { remaining: f32 },
    /// This hit brought health to zero
    Killed,
}

impl DamageOutcome {
    pub fn is_kill(&self) -> bool {
        matches!(self, DamageOutcome::Killed)
    }
}

/// What a projectile hit, as carried by [`crate::events::ProjectileHit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTargetKind {
    Scenery,
    Creature,
    Player,
}

/// First obstacle found along a projectile's path.
///
/// # Fields
/// * `entity` - The collider entity that was hit
/// * `point` - World-space point of intersection
/// * `normal` - Outward face normal at the intersection
/// * `distance` - Distance from the segment start to the intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleHit {
    pub entity: Entity,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// Ray queries against solid obstacles.
///
/// Collision resolution asks this for the first obstacle on the segment a
/// projectile covered during the tick. The plugin answers it with avian's
/// spatial query; tests and benches can plug in their own geometry.
pub trait ObstacleCaster {
    /// Nearest obstacle along the ray within `max_distance`.
    fn cast_obstacle(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> Option<ObstacleHit>;
}

/// Parameters for spawning a projectile.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_fps_combat::types::ProjectileSpawnParams;
///
/// let params = ProjectileSpawnParams::new(Vec3::new(0.0, 1.6, 0.0), Vec3::NEG_Z, 70.0)
///     .with_damage(25.0)
///     .with_lifespan(2.0)
///     .with_owner(Entity::PLACEHOLDER);
/// ```
#[derive(Debug, Clone)]
pub struct ProjectileSpawnParams {
    pub origin: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    pub damage: f32,
    pub lifespan: f32,
    pub radius: f32,
    pub max_distance: f32,
    pub kind: ProjectileKind,
    pub faction: Faction,
    pub owner: Entity,
    pub explosive: Option<Explosive>,
}

impl Default for ProjectileSpawnParams {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            speed: 70.0,
            damage: 25.0,
            lifespan: 2.0,
            radius: 0.0,
            max_distance: 1000.0,
            kind: ProjectileKind::Physical,
            faction: Faction::Player,
            owner: Entity::PLACEHOLDER,
            explosive: None,
        }
    }
}

impl ProjectileSpawnParams {
    /// Creates spawn parameters with a normalized direction and default payload.
    pub fn new(origin: Vec3, direction: Vec3, speed: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or(Vec3::NEG_Z),
            speed,
            ..Default::default()
        }
    }

    pub fn with_damage(mut self, damage: f32) -> Self {
        self.damage = damage;
        self
    }

    pub fn with_lifespan(mut self, lifespan: f32) -> Self {
        self.lifespan = lifespan;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_kind(mut self, kind: ProjectileKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_faction(mut self, faction: Faction) -> Self {
        self.faction = faction;
        self
    }

    pub fn with_owner(mut self, owner: Entity) -> Self {
        self.owner = owner;
        self
    }

    /// Attaches an explosive payload. Physical projectiles become explosive;
    /// remote ones keep their kind and detonate with the payload.
    pub fn with_explosive(mut self, explosive: Explosive) -> Self {
        if self.kind == ProjectileKind::Physical || self.kind == ProjectileKind::Instant {
            self.kind = ProjectileKind::Explosive;
        }
        self.explosive = Some(explosive);
        self
    }

    /// Builds the [`Projectile`] component described by these parameters.
    pub fn to_projectile(&self) -> Projectile {
        Projectile {
            kind: self.kind,
            direction: self.direction,
            speed: self.speed,
            damage: self.damage,
            radius: self.radius,
            age: 0.0,
            lifespan: self.lifespan,
            alive: true,
            previous_position: self.origin,
            origin: self.origin,
            max_distance: self.max_distance,
            owner: self.owner,
            faction: self.faction,
        }
    }
}
