//! Messages exchanged between the combat core and its collaborators.
//!
//! Input messages drive the fire-control state machines; effect messages
//! are the only way the core talks to rendering, audio, camera and HUD.
//!
//! Note: In Bevy 0.18, buffered events use the `Message` trait instead of `Event`.

use bevy::prelude::*;
use bevy::ecs::message::Message;

use crate::types::{HitTargetKind, SoundCue};

/// A player command addressed to one weapon.
///
/// Commands for weapons without [`crate::weapon::ActiveWeapon`] are ignored.
#[derive(Message, Clone, Copy, Debug)]
pub struct WeaponInput {
    pub weapon: Entity,
    pub action: WeaponAction,
}

impl WeaponInput {
    pub fn new(weapon: Entity, action: WeaponAction) -> Self {
        Self { weapon, action }
    }
}

/// Player command kinds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WeaponAction {
    TriggerPressed,
    TriggerReleased,
    ZoomPressed,
    ZoomReleased,
    /// Pointer movement, routed to a piloted projectile
    Steer(Vec2),
}

/// Makes `weapon` the active weapon, holstering the previous one.
#[derive(Message, Clone, Copy, Debug)]
pub struct EquipWeapon {
    pub weapon: Entity,
}

/// A projectile hit a damageable target; consumed by the damage systems.
///
/// # Fields
/// * `projectile` - The projectile that hit
/// * `owner` - Who fired it
/// * `target` - Entity that was hit
/// * `kind` - Target category
/// * `damage` - Damage to apply
/// * `point` - Impact position
/// * `normal` - Surface normal at the impact
#[derive(Message, Clone, Copy, Debug)]
pub struct ProjectileHit {
    pub projectile: Entity,
    pub owner: Entity,
    pub target: Entity,
    pub kind: HitTargetKind,
    pub damage: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

/// A remote projectile was detonated or lost; its weapon releases control.
#[derive(Message, Clone, Copy, Debug)]
pub struct RemoteDetonated {
    pub projectile: Entity,
    pub weapon: Entity,
    pub position: Vec3,
}

/// Shot fired, for muzzle flash rendering.
#[derive(Message, Clone, Copy, Debug)]
pub struct MuzzleFlashEvent {
    pub shooter: Entity,
    pub position: Vec3,
    pub direction: Vec3,
}

/// Projectile impact, for decals and sparks.
///
/// `target` is `None` for the ground plane.
#[derive(Message, Clone, Copy, Debug)]
pub struct ImpactEvent {
    pub position: Vec3,
    pub normal: Vec3,
    pub target: Option<Entity>,
}

/// Area damage centred on `center`.
///
/// Damage at distance `d` is `damage * (1 - d / radius)^falloff` and zero at
/// or beyond `radius`. Creatures inside the radius are knocked back by up
/// to `force`.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_fps_combat::events::ExplosionEvent;
///
/// let blast = ExplosionEvent::new(Vec3::ZERO, 5.0, 200.0).with_force(20.0);
/// assert_eq!(blast.falloff, 1.0);
/// ```
#[derive(Message, Clone, Copy, Debug)]
pub struct ExplosionEvent {
    pub center: Vec3,
    pub radius: f32,
    pub damage: f32,
    pub force: f32,
    pub falloff: f32,
    pub source: Option<Entity>,
}

impl ExplosionEvent {
    pub fn new(center: Vec3, radius: f32, damage: f32) -> Self {
        Self {
            center,
            radius,
            damage,
            force: 0.0,
            falloff: 1.0,
            source: None,
        }
    }

    pub fn with_force(mut self, force: f32) -> Self {
        self.force = force;
        self
    }

    pub fn with_falloff(mut self, falloff: f32) -> Self {
        self.falloff = falloff;
        self
    }

    pub fn with_source(mut self, source: Entity) -> Self {
        self.source = Some(source);
        self
    }
}

/// A scenery piece was destroyed and removed.
#[derive(Message, Clone, Copy, Debug)]
pub struct DestroyedEvent {
    pub entity: Entity,
    pub position: Vec3,
}

/// A creature died.
#[derive(Message, Clone, Copy, Debug)]
pub struct DeathEvent {
    pub entity: Entity,
    pub position: Vec3,
    pub killer: Option<Entity>,
}

/// Screen shake request.
#[derive(Message, Clone, Copy, Debug)]
pub struct CameraShakeEvent {
    pub intensity: f32,
}

/// Audio cue, positioned when the source has a location.
#[derive(Message, Clone, Copy, Debug)]
pub struct SoundEvent {
    pub cue: SoundCue,
    pub position: Option<Vec3>,
}

impl SoundEvent {
    pub fn at(cue: SoundCue, position: Vec3) -> Self {
        Self {
            cue,
            position: Some(position),
        }
    }

    pub fn global(cue: SoundCue) -> Self {
        Self {
            cue,
            position: None,
        }
    }
}

/// HUD updates.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub enum HudEvent {
    PlayerHealth { current: f32, max: f32 },
    PlayerDown,
    Crosshair { visible: bool },
    ScopeOverlay { visible: bool },
    FieldOfView { fov: f32 },
    RemoteFlight { time_left: f32, speed: f32 },
    RemoteFlightEnded,
}

/// A hostile creature died; the host may spawn replacements.
#[derive(Message, Clone, Copy, Debug)]
pub struct ReinforcementRequest {
    pub count: u32,
    pub near: Vec3,
}
