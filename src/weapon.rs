//! Weapon state and fire-control state machines.
//!
//! Every weapon shares the cooldown contract of [`Weapon`]: a shot is
//! allowed only while `can_shoot` is set, and firing arms a cooldown that
//! [`Weapon::tick`] counts down. [`FireMode`] decides *when* a shot is
//! attempted; [`Scope`] is an optional, independent zoom controller.

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;
use serde::Deserialize;

use crate::components::Explosive;
use crate::types::{Faction, GuidedPhase, ProjectileKind, ProjectileSpawnParams, SoundCue, SpinPhase};

/// Projectile a weapon launches.
#[derive(Reflect, Clone, Debug, PartialEq, Deserialize)]
pub struct ProjectileSpec {
    #[serde(default)]
    pub kind: ProjectileKind,
    pub speed: f32,
    pub lifespan: f32,
    #[serde(default)]
    pub radius: f32,
    /// Overrides the global out-of-bounds distance when set
    #[serde(default)]
    pub max_distance: Option<f32>,
    #[serde(default)]
    pub explosive: Option<Explosive>,
}

impl Default for ProjectileSpec {
    fn default() -> Self {
        Self {
            kind: ProjectileKind::Physical,
            speed: 70.0,
            lifespan: 2.0,
            radius: 0.0,
            max_distance: None,
            explosive: None,
        }
    }
}

/// Weapon state shared by every fire mode.
///
/// # Fields
/// * `damage` - Damage carried by each projectile
/// * `cooldown` - Seconds between shots
/// * `cooldown_remaining` - Seconds until `can_shoot` is restored
/// * `can_shoot` - Whether the next shot is allowed
/// * `trigger_held` - Trigger currently down
/// * `pending_pull` - Trigger pressed since the last fire-control step
/// * `projectile` - What each shot launches
/// * `muzzles` - Muzzle offsets in the weapon's local space, cycled per shot
/// * `next_muzzle` - Index of the muzzle used by the next shot
/// * `spread` - Cone angle in radians applied to each shot
/// * `faction` - Side the projectiles are fired for
/// * `fire_sound` - Cue played on each shot
/// * `shots_fired` - Total shots fired
#[derive(Component, Reflect, Clone, Debug)]
#[reflect(Component)]
pub struct Weapon {
    pub damage: f32,
    pub cooldown: f32,
    pub cooldown_remaining: f32,
    pub can_shoot: bool,
    pub trigger_held: bool,
    pub pending_pull: bool,
    pub projectile: ProjectileSpec,
    pub muzzles: Vec<Vec3>,
    pub next_muzzle: usize,
    pub spread: f32,
    pub faction: Faction,
    pub fire_sound: SoundCue,
    pub shots_fired: u32,
}

impl Default for Weapon {
    fn default() -> Self {
        Self {
            damage: 25.0,
            cooldown: 0.5,
            cooldown_remaining: 0.0,
            can_shoot: true,
            trigger_held: false,
            pending_pull: false,
            projectile: ProjectileSpec::default(),
            muzzles: vec![Vec3::ZERO],
            next_muzzle: 0,
            spread: 0.0,
            faction: Faction::Player,
            fire_sound: SoundCue::Shoot,
            shots_fired: 0,
        }
    }
}

impl Weapon {
    pub fn new(damage: f32, cooldown: f32, projectile: ProjectileSpec) -> Self {
        Self {
            damage,
            cooldown,
            projectile,
            ..Default::default()
        }
    }

    pub fn with_muzzles(mut self, muzzles: Vec<Vec3>) -> Self {
        self.muzzles = muzzles;
        self
    }

    pub fn with_spread(mut self, spread: f32) -> Self {
        self.spread = spread;
        self
    }

    pub fn with_faction(mut self, faction: Faction) -> Self {
        self.faction = faction;
        self
    }

    pub fn with_sound(mut self, cue: SoundCue) -> Self {
        self.fire_sound = cue;
        self
    }

    /// Counts the cooldown down and restores `can_shoot` once it elapses.
    pub fn tick(&mut self, dt: f32) {
        if self.can_shoot {
            return;
        }
        self.cooldown_remaining -= dt;
        if self.cooldown_remaining <= 0.0 {
            self.cooldown_remaining = 0.0;
            self.can_shoot = true;
        }
    }

    /// Attempts a shot with the weapon's own cooldown.
    ///
    /// Returns `false` without side effects while cooling down.
    pub fn try_fire(&mut self) -> bool {
        let cooldown = self.cooldown;
        self.try_fire_with_cooldown(cooldown)
    }

    /// Attempts a shot and arms the given cooldown on success.
    pub fn try_fire_with_cooldown(&mut self, cooldown: f32) -> bool {
        if !self.can_shoot {
            return false;
        }
        self.can_shoot = false;
        self.cooldown_remaining = cooldown.max(0.0);
        self.shots_fired += 1;
        true
    }

    pub fn press_trigger(&mut self) {
        self.trigger_held = true;
        self.pending_pull = true;
    }

    pub fn release_trigger(&mut self) {
        self.trigger_held = false;
    }

    /// Consumes the pending trigger pull.
    pub fn take_pull(&mut self) -> bool {
        std::mem::take(&mut self.pending_pull)
    }

    /// Returns the muzzle offset for the next shot and advances the cycle.
    pub fn cycle_muzzle(&mut self) -> Vec3 {
        if self.muzzles.is_empty() {
            return Vec3::ZERO;
        }
        let offset = self.muzzles[self.next_muzzle % self.muzzles.len()];
        self.next_muzzle = (self.next_muzzle + 1) % self.muzzles.len();
        offset
    }

    /// Clears trigger state; cooldowns keep running.
    pub fn holster(&mut self) {
        self.trigger_held = false;
        self.pending_pull = false;
    }

    /// Spawn parameters for one shot from `origin` along `direction`.
    pub fn spawn_params(
        &self,
        origin: Vec3,
        direction: Vec3,
        owner: Entity,
        default_max_distance: f32,
    ) -> ProjectileSpawnParams {
        let spec = &self.projectile;
        let mut params = ProjectileSpawnParams::new(origin, direction, spec.speed)
            .with_kind(spec.kind)
            .with_damage(self.damage)
            .with_lifespan(spec.lifespan)
            .with_radius(spec.radius)
            .with_max_distance(spec.max_distance.unwrap_or(default_max_distance))
            .with_faction(self.faction)
            .with_owner(owner);
        if let Some(explosive) = spec.explosive {
            params = params.with_explosive(explosive);
        }
        params
    }
}

/// Marker for the weapon currently wielded by the player.
///
/// Only the active weapon receives input and fires. Removing the marker
/// holsters the weapon.
#[derive(Component, Reflect, Clone, Copy, Debug, Default)]
#[reflect(Component)]
pub struct ActiveWeapon;

/// When a weapon attempts to fire.
#[derive(Component, Reflect, Clone, Debug, Default)]
#[reflect(Component)]
pub enum FireMode {
    /// One attempt per trigger press
    #[default]
    Single,
    /// Attempts every tick while the trigger is held
    Continuous,
    /// Rotating barrels that must spin up before firing
    SpinUp(SpinUp),
    /// Launches a remote projectile piloted by the player
    Guided(Guided),
}

impl FireMode {
    pub fn guided(&self) -> Option<&Guided> {
        match self {
            FireMode::Guided(guided) => Some(guided),
            _ => None,
        }
    }

    pub fn guided_mut(&mut self) -> Option<&mut Guided> {
        match self {
            FireMode::Guided(guided) => Some(guided),
            _ => None,
        }
    }
}

/// Spin-up controller for rotary weapons.
///
/// Rotation ramps linearly while the trigger is held and decays
/// exponentially after release. Shots are allowed at or above
/// `min_fire_speed`; the cooldown shrinks from `slow_cooldown` to
/// `fast_cooldown` as rotation approaches `optimal_fire_speed`.
#[derive(Reflect, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpinUp {
    pub rotation_speed: f32,
    pub max_rotation_speed: f32,
    pub spin_up_time: f32,
    pub min_fire_speed: f32,
    pub optimal_fire_speed: f32,
    /// Fraction of rotation speed kept after one second without trigger
    pub spin_down_per_sec: f32,
    pub slow_cooldown: f32,
    pub fast_cooldown: f32,
}

impl Default for SpinUp {
    fn default() -> Self {
        Self {
            rotation_speed: 0.0,
            max_rotation_speed: 15.0,
            spin_up_time: 3.0,
            min_fire_speed: 3.0,
            optimal_fire_speed: 10.0,
            spin_down_per_sec: 0.16,
            slow_cooldown: 0.2,
            fast_cooldown: 0.03,
        }
    }
}

const SPIN_STOP_THRESHOLD: f32 = 0.1;

impl SpinUp {
    pub fn advance(&mut self, trigger_held: bool, dt: f32) {
        if trigger_held {
            let rate = if self.spin_up_time > 0.0 {
                self.max_rotation_speed / self.spin_up_time
            } else {
                f32::INFINITY
            };
            self.rotation_speed = (self.rotation_speed + rate * dt).min(self.max_rotation_speed);
        } else if self.rotation_speed > 0.0 {
            self.rotation_speed *= self.spin_down_per_sec.clamp(0.0, 1.0).powf(dt);
            if self.rotation_speed < SPIN_STOP_THRESHOLD {
                self.rotation_speed = 0.0;
            }
        }
    }

    pub fn can_fire(&self) -> bool {
        self.rotation_speed >= self.min_fire_speed
    }

    /// How close the barrels are to optimal speed, in `[0, 1]`.
    pub fn speed_factor(&self) -> f32 {
        let span = self.optimal_fire_speed - self.min_fire_speed;
        if span <= 0.0 {
            return 1.0;
        }
        ((self.rotation_speed - self.min_fire_speed) / span).clamp(0.0, 1.0)
    }

    pub fn cooldown(&self) -> f32 {
        self.slow_cooldown + (self.fast_cooldown - self.slow_cooldown) * self.speed_factor()
    }

    pub fn phase(&self, trigger_held: bool) -> SpinPhase {
        match (trigger_held, self.rotation_speed > 0.0) {
            (true, _) if self.can_fire() => SpinPhase::Firing,
            (true, _) => SpinPhase::SpinningUp,
            (false, true) => SpinPhase::SpinningDown,
            (false, false) => SpinPhase::Idle,
        }
    }

    pub fn reset(&mut self) {
        self.rotation_speed = 0.0;
    }
}

/// Remote-guided projectile controller.
///
/// While `Controlled`, steering input rotates the heading pushed to the
/// projectile each tick. The flight ends on a second trigger press, on
/// `max_flight_time`, or when the projectile resolves a collision.
#[derive(Reflect, Clone, Debug, PartialEq)]
pub struct Guided {
    pub phase: GuidedPhase,
    pub projectile: Option<Entity>,
    pub flight_time: f32,
    pub max_flight_time: f32,
    pub yaw: f32,
    pub pitch: f32,
    /// Radians of rotation per unit of steering input
    pub sensitivity: f32,
}

impl Default for Guided {
    fn default() -> Self {
        Self {
            phase: GuidedPhase::Idle,
            projectile: None,
            flight_time: 0.0,
            max_flight_time: 10.0,
            yaw: 0.0,
            pitch: 0.0,
            sensitivity: 0.002,
        }
    }
}

impl Guided {
    pub fn is_controlled(&self) -> bool {
        self.phase == GuidedPhase::Controlled
    }

    /// Takes control of `projectile`, starting from the launch orientation.
    pub fn begin(&mut self, projectile: Entity, launch_rotation: Quat) {
        let (yaw, pitch, _) = launch_rotation.to_euler(EulerRot::YXZ);
        self.phase = GuidedPhase::Controlled;
        self.projectile = Some(projectile);
        self.flight_time = 0.0;
        self.yaw = yaw;
        self.pitch = pitch.clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    pub fn steer(&mut self, delta: Vec2) {
        if !self.is_controlled() {
            return;
        }
        self.yaw -= delta.x * self.sensitivity;
        self.pitch = (self.pitch - delta.y * self.sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    pub fn heading(&self) -> Vec3 {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0) * Vec3::NEG_Z
    }

    /// Advances the flight clock. Returns `true` once the flight has timed out.
    pub fn advance(&mut self, dt: f32) -> bool {
        if !self.is_controlled() {
            return false;
        }
        self.flight_time += dt;
        self.flight_time >= self.max_flight_time
    }

    pub fn time_left(&self) -> f32 {
        (self.max_flight_time - self.flight_time).max(0.0)
    }

    /// Returns control to the player, yielding the piloted projectile.
    pub fn release(&mut self) -> Option<Entity> {
        self.phase = GuidedPhase::Idle;
        self.flight_time = 0.0;
        self.projectile.take()
    }
}

/// Scope zoom controller.
///
/// Holding zoom narrows the field of view toward `zoomed_fov`; the value
/// eases toward its target at `transition_speed` and snaps once the step
/// is small.
#[derive(Component, Reflect, Clone, Debug, PartialEq, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct Scope {
    pub zoomed: bool,
    pub fov: f32,
    pub base_fov: f32,
    pub zoomed_fov: f32,
    pub transition_speed: f32,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            zoomed: false,
            fov: 75.0,
            base_fov: 75.0,
            zoomed_fov: 20.0,
            transition_speed: 5.0,
        }
    }
}

const FOV_SNAP: f32 = 0.1;

impl Scope {
    pub fn new(base_fov: f32, zoomed_fov: f32, transition_speed: f32) -> Self {
        Self {
            zoomed: false,
            fov: base_fov,
            base_fov,
            zoomed_fov,
            transition_speed,
        }
    }

    pub fn target_fov(&self) -> f32 {
        if self.zoomed {
            self.zoomed_fov
        } else {
            self.base_fov
        }
    }

    /// Moves `fov` toward the target. Returns `true` if it changed.
    pub fn advance(&mut self, dt: f32) -> bool {
        let target = self.target_fov();
        if self.fov == target {
            return false;
        }
        let step = (target - self.fov) * (self.transition_speed * dt).min(1.0);
        if step.abs() < FOV_SNAP {
            self.fov = target;
        } else {
            self.fov += step;
        }
        true
    }

    /// Drops zoom immediately.
    pub fn reset(&mut self) {
        self.zoomed = false;
        self.fov = self.base_fov;
    }
}
