//! Global resources: tuning, randomness and weapon presets.

use std::collections::HashSet;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::components::Explosive;
use crate::config::ConfigError;
use crate::types::{ProjectileKind, SoundCue};
use crate::weapon::{FireMode, Guided, ProjectileSpec, Scope, SpinUp, Weapon};

/// Combat tuning shared by all systems.
///
/// Every field has a default, so a TOML file only needs the values it
/// overrides.
///
/// # Fields
/// * `ground_epsilon` - Height at or below which a projectile hits the ground
/// * `player_hit_radius` - Radius of the player's hit sphere
/// * `max_projectile_distance` - Default out-of-bounds travel distance
/// * `corpse_display_secs` - Seconds a dead creature stays in the world
/// * `player_hit_shake` - Camera shake when the player is hit
/// * `remote_detonation_shake` - Camera shake when a piloted projectile detonates
/// * `explosion_shake` - Camera shake at the centre of an explosion
/// * `shake_radius_factor` - Explosion shake reaches this many radii
/// * `min_camera_shake` - Shake requests below this are dropped
/// * `knockback_damping` - Linear damping of a thrown creature's body
/// * `max_knockback_speed` - Knockback speed ceiling
/// * `reinforcements_per_kill` - Replacements requested per hostile death
/// * `world_half_extent` - Critters turn back beyond this distance
/// * `debug_draw` - Draw gizmos for projectiles and hit volumes
#[derive(Resource, Reflect, Clone, Debug, PartialEq, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct CombatConfig {
    pub ground_epsilon: f32,
    pub player_hit_radius: f32,
    pub max_projectile_distance: f32,
    pub corpse_display_secs: f32,
    pub player_hit_shake: f32,
    pub remote_detonation_shake: f32,
    pub explosion_shake: f32,
    pub shake_radius_factor: f32,
    pub min_camera_shake: f32,
    pub knockback_damping: f32,
    pub max_knockback_speed: f32,
    pub reinforcements_per_kill: u32,
    pub world_half_extent: f32,
    pub debug_draw: bool,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            ground_epsilon: 0.05,
            player_hit_radius: 0.5,
            max_projectile_distance: 1000.0,
            corpse_display_secs: 10.0,
            player_hit_shake: 0.5,
            remote_detonation_shake: 0.5,
            explosion_shake: 0.2,
            shake_radius_factor: 2.0,
            min_camera_shake: 0.01,
            knockback_damping: 3.0,
            max_knockback_speed: 40.0,
            reinforcements_per_kill: 2,
            world_half_extent: 100.0,
            debug_draw: false,
        }
    }
}

impl CombatConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("ground_epsilon", self.ground_epsilon),
            ("player_hit_radius", self.player_hit_radius),
            ("corpse_display_secs", self.corpse_display_secs),
            ("player_hit_shake", self.player_hit_shake),
            ("remote_detonation_shake", self.remote_detonation_shake),
            ("explosion_shake", self.explosion_shake),
            ("min_camera_shake", self.min_camera_shake),
            ("knockback_damping", self.knockback_damping),
            ("max_knockback_speed", self.max_knockback_speed),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::invalid(field, format!("must be >= 0, got {value}")));
            }
        }
        let positive = [
            ("max_projectile_distance", self.max_projectile_distance),
            ("shake_radius_factor", self.shake_radius_factor),
            ("world_half_extent", self.world_half_extent),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::invalid(field, format!("must be > 0, got {value}")));
            }
        }
        Ok(())
    }

    /// Camera shake intensity, or `None` when it is too weak to bother.
    pub fn shake(&self, intensity: f32) -> Option<f32> {
        (intensity >= self.min_camera_shake).then_some(intensity)
    }
}

/// Random source for spread, critter wandering and enemy inaccuracy.
#[derive(Resource)]
pub struct CombatRng(pub StdRng);

impl Default for CombatRng {
    fn default() -> Self {
        Self(StdRng::seed_from_u64(rand::random()))
    }
}

impl CombatRng {
    /// Deterministic generator for replays and tests.
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

/// Fire mode as written in a preset.
#[derive(Clone, Debug, PartialEq, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FireModeSpec {
    #[default]
    Single,
    Continuous,
    SpinUp(SpinUp),
    Guided(GuidedSpec),
}

/// Tuning of a guided weapon.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GuidedSpec {
    pub max_flight_time: f32,
    pub sensitivity: f32,
}

impl Default for GuidedSpec {
    fn default() -> Self {
        let guided = Guided::default();
        Self {
            max_flight_time: guided.max_flight_time,
            sensitivity: guided.sensitivity,
        }
    }
}

/// A named weapon definition.
///
/// # Fields
/// * `name` - Lookup key
/// * `damage` - Damage per projectile
/// * `cooldown` - Seconds between shots
/// * `projectile` - Launched projectile
/// * `mode` - Fire mode
/// * `muzzles` - Muzzle offsets in weapon space, alternated per shot
/// * `spread` - Cone angle in radians
/// * `scope` - Optional zoom
/// * `fire_sound` - Cue played per shot
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WeaponPreset {
    pub name: String,
    pub damage: f32,
    pub cooldown: f32,
    pub projectile: ProjectileSpec,
    #[serde(default)]
    pub mode: FireModeSpec,
    #[serde(default = "default_muzzles")]
    pub muzzles: Vec<[f32; 3]>,
    #[serde(default)]
    pub spread: f32,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub fire_sound: SoundCue,
}

fn default_muzzles() -> Vec<[f32; 3]> {
    vec![[0.0, 0.0, 0.0]]
}

impl WeaponPreset {
    fn base(name: &str, damage: f32, cooldown: f32, projectile: ProjectileSpec) -> Self {
        Self {
            name: name.to_string(),
            damage,
            cooldown,
            projectile,
            mode: FireModeSpec::Single,
            muzzles: default_muzzles(),
            spread: 0.0,
            scope: None,
            fire_sound: SoundCue::Shoot,
        }
    }

    pub fn weapon(&self) -> Weapon {
        Weapon::new(self.damage, self.cooldown, self.projectile.clone())
            .with_muzzles(self.muzzles.iter().copied().map(Vec3::from_array).collect())
            .with_spread(self.spread)
            .with_sound(self.fire_sound)
    }

    pub fn fire_mode(&self) -> FireMode {
        match &self.mode {
            FireModeSpec::Single => FireMode::Single,
            FireModeSpec::Continuous => FireMode::Continuous,
            FireModeSpec::SpinUp(spin) => FireMode::SpinUp(SpinUp {
                rotation_speed: 0.0,
                ..spin.clone()
            }),
            FireModeSpec::Guided(spec) => FireMode::Guided(Guided {
                max_flight_time: spec.max_flight_time,
                sensitivity: spec.sensitivity,
                ..Default::default()
            }),
        }
    }

    pub fn scope(&self) -> Option<Scope> {
        self.scope.clone().map(|scope| Scope {
            zoomed: false,
            fov: scope.base_fov,
            ..scope
        })
    }

    /// Spawns this weapon as an entity at `transform`.
    pub fn spawn(&self, commands: &mut Commands, transform: Transform) -> Entity {
        let mut entity = commands.spawn((
            Name::new(self.name.clone()),
            self.weapon(),
            self.fire_mode(),
            transform,
        ));
        if let Some(scope) = self.scope() {
            entity.insert(scope);
        }
        entity.id()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let field = |name: &str| format!("{}.{}", self.name, name);
        if self.name.is_empty() {
            return Err(ConfigError::invalid("name", "must not be empty"));
        }
        if !(self.damage >= 0.0) {
            return Err(ConfigError::invalid(field("damage"), "must be >= 0"));
        }
        if !(self.cooldown >= 0.0) {
            return Err(ConfigError::invalid(field("cooldown"), "must be >= 0"));
        }
        if !(self.projectile.speed > 0.0) {
            return Err(ConfigError::invalid(field("projectile.speed"), "must be > 0"));
        }
        if !(self.projectile.lifespan > 0.0) {
            return Err(ConfigError::invalid(field("projectile.lifespan"), "must be > 0"));
        }
        if let Some(explosive) = &self.projectile.explosive {
            if !(explosive.radius > 0.0) {
                return Err(ConfigError::invalid(field("projectile.explosive.radius"), "must be > 0"));
            }
        }
        if self.muzzles.is_empty() {
            return Err(ConfigError::invalid(field("muzzles"), "needs at least one muzzle"));
        }
        match &self.mode {
            FireModeSpec::SpinUp(spin) => {
                if !(spin.min_fire_speed < spin.optimal_fire_speed)
                    || spin.optimal_fire_speed > spin.max_rotation_speed
                {
                    return Err(ConfigError::invalid(
                        field("mode"),
                        "expected min_fire_speed < optimal_fire_speed <= max_rotation_speed",
                    ));
                }
            }
            FireModeSpec::Guided(spec) => {
                if self.projectile.kind != ProjectileKind::Remote {
                    return Err(ConfigError::invalid(field("projectile.kind"), "guided weapons fire remote projectiles"));
                }
                if !(spec.max_flight_time > 0.0) {
                    return Err(ConfigError::invalid(field("mode.max_flight_time"), "must be > 0"));
                }
            }
            FireModeSpec::Single | FireModeSpec::Continuous => {}
        }
        if let Some(scope) = &self.scope {
            if !(scope.base_fov > 0.0 && scope.zoomed_fov > 0.0) {
                return Err(ConfigError::invalid(field("scope"), "field of view must be > 0"));
            }
        }
        Ok(())
    }
}

/// Named weapon definitions.
#[derive(Resource, Clone, Debug)]
pub struct WeaponPresets {
    pub weapons: Vec<WeaponPreset>,
}

impl Default for WeaponPresets {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl WeaponPresets {
    /// The stock arsenal plus the rifle carried by hostile creatures.
    pub fn with_defaults() -> Self {
        let pistol = WeaponPreset {
            mode: FireModeSpec::Continuous,
            fire_sound: SoundCue::ShootPistol,
            ..WeaponPreset::base("pistol", 25.0, 0.5, ProjectileSpec {
                speed: 70.0,
                lifespan: 2.0,
                ..Default::default()
            })
        };

        let akimbo = WeaponPreset {
            mode: FireModeSpec::Continuous,
            muzzles: vec![[-0.3, 0.0, 0.0], [0.3, 0.0, 0.0]],
            fire_sound: SoundCue::ShootAkimbo,
            ..WeaponPreset::base("akimbo", 20.0, 0.25, ProjectileSpec {
                speed: 70.0,
                lifespan: 2.0,
                ..Default::default()
            })
        };

        let gatling = WeaponPreset {
            mode: FireModeSpec::SpinUp(SpinUp::default()),
            spread: 0.02,
            ..WeaponPreset::base("gatling", 10.0, 0.1, ProjectileSpec {
                speed: 100.0,
                lifespan: 2.0,
                ..Default::default()
            })
        };

        let sniper = WeaponPreset {
            scope: Some(Scope::default()),
            ..WeaponPreset::base("sniper", 500.0, 1.2, ProjectileSpec {
                kind: ProjectileKind::Instant,
                speed: 200.0,
                lifespan: 5.0,
                ..Default::default()
            })
        };

        let bazooka = WeaponPreset::base("bazooka", 200.0, 2.0, ProjectileSpec {
            kind: ProjectileKind::Explosive,
            speed: 40.0,
            lifespan: 10.0,
            explosive: Some(Explosive::new(5.0, 20.0)),
            ..Default::default()
        });

        let translocator = WeaponPreset {
            mode: FireModeSpec::Guided(GuidedSpec::default()),
            fire_sound: SoundCue::ShootTranslocator,
            ..WeaponPreset::base("translocator", 100.0, 2.0, ProjectileSpec {
                kind: ProjectileKind::Remote,
                speed: 50.0,
                lifespan: 11.0,
                radius: 0.2,
                max_distance: Some(100.0),
                explosive: Some(Explosive::new(10.0, 1000.0)),
            })
        };

        let enemy_rifle = WeaponPreset {
            spread: 0.04,
            fire_sound: SoundCue::EnemyShoot,
            ..WeaponPreset::base("enemy_rifle", 10.0, 2.0, ProjectileSpec {
                speed: 20.0,
                lifespan: 5.0,
                radius: 0.1,
                ..Default::default()
            })
        };

        Self {
            weapons: vec![pistol, akimbo, gatling, sniper, bazooka, translocator, enemy_rifle],
        }
    }

    pub fn get(&self, name: &str) -> Option<&WeaponPreset> {
        self.weapons.iter().find(|preset| preset.name == name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for preset in &self.weapons {
            if !seen.insert(preset.name.as_str()) {
                return Err(ConfigError::DuplicatePreset(preset.name.clone()));
            }
            preset.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_presets_valid() {
        let presets = WeaponPresets::with_defaults();
        presets.validate().unwrap();
        for name in ["pistol", "akimbo", "gatling", "sniper", "bazooka", "translocator", "enemy_rifle"] {
            assert!(presets.get(name).is_some(), "missing preset {name}");
        }
    }

    #[test]
    fn test_pistol_preset_values() {
        let presets = WeaponPresets::with_defaults();
        let pistol = presets.get("pistol").unwrap().weapon();
        assert_eq!(pistol.damage, 25.0);
        assert_eq!(pistol.cooldown, 0.5);
        assert_eq!(pistol.projectile.speed, 70.0);
        assert_eq!(pistol.projectile.lifespan, 2.0);
    }

    #[test]
    fn test_akimbo_has_two_muzzles() {
        let presets = WeaponPresets::with_defaults();
        assert_eq!(presets.get("akimbo").unwrap().weapon().muzzles.len(), 2);
    }

    #[test]
    fn test_guided_preset_requires_remote_projectile() {
        let mut preset = WeaponPresets::with_defaults().get("translocator").unwrap().clone();
        preset.projectile.kind = ProjectileKind::Physical;
        assert!(matches!(preset.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_sniper_has_scope() {
        let presets = WeaponPresets::with_defaults();
        let scope = presets.get("sniper").unwrap().scope().unwrap();
        assert_eq!(scope.zoomed_fov, 20.0);
        assert!(!scope.zoomed);
    }

    #[test]
    fn test_default_config_valid() {
        CombatConfig::default().validate().unwrap();
    }

    #[test]
    fn test_shake_threshold() {
        let config = CombatConfig::default();
        assert_eq!(config.shake(0.005), None);
        assert_eq!(config.shake(0.2), Some(0.2));
    }
}
