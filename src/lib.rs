//! # Bevy FPS Combat
//!
//! First-person combat core plugin for Bevy 0.18.
//!
//! ## Features
//! - Swept projectile collision: avian ray casts against scenery colliders,
//!   then creature spheres, the player and the ground plane
//! - Health, destructible scenery and idempotent death handling
//! - Explosions with distance falloff, avian-driven knockback and camera shake
//! - Per-weapon fire control: cooldown, continuous fire, spin-up barrels,
//!   scope zoom and a player-piloted remote projectile
//! - Armed enemies and hopping critters
//! - TOML configuration and weapon presets
//!
//! Rendering, audio and HUD are left to the host: the core only writes
//! effect messages ([`events`]). The host also adds avian's
//! `PhysicsPlugins`; collision resolution waits until its spatial query
//! pipeline exists.
//!
//! ## Quick Start
//! ```rust,no_run
//! use avian3d::prelude::*;
//! use bevy::prelude::*;
//! use bevy_fps_combat::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(PhysicsPlugins::default())
//!         .add_plugins(CombatPluginGroup)
//!         .run();
//! }
//! ```

pub mod components;
pub mod config;
pub mod events;
pub mod resources;
pub mod systems;
pub mod types;
pub mod weapon;

pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::{CombatConfigFile, ConfigError};
    pub use crate::events::*;
    pub use crate::resources::*;
    pub use crate::systems::creature::spawn_enemy;
    pub use crate::systems::critter::spawn_critter;
    pub use crate::systems::kinematics::spawn_projectile;
    pub use crate::types::*;
    pub use crate::weapon::*;
    pub use crate::CombatPluginGroup;
    pub use crate::CombatSet;
    pub use crate::{CombatCorePlugin, CombatDebugPlugin, CreatureAiPlugin, FireControlPlugin};
}

use bevy::prelude::*;

/// Phases of one combat tick, chained in this order in `FixedUpdate`.
///
/// Targets are read for collision only after every mover has run, and
/// all damage of a tick is applied before cleanup.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatSet {
    /// Player commands and weapon switching
    Input,
    /// Cooldowns and fire-mode state machines
    FireControl,
    /// Enemy and critter behaviour
    Ai,
    /// Projectile motion and expiry
    Movement,
    /// Projectile collision resolution
    Collision,
    /// Hits, explosions and remote detonations
    Damage,
    /// Corpse removal
    Cleanup,
}

/// Main plugin group that includes all combat subsystems.
///
/// The debug plugin needs gizmos and is added separately.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_fps_combat::prelude::*;
///
/// fn main() {
///     App::new()
///         .add_plugins(MinimalPlugins)
///         .add_plugins(CombatPluginGroup);
/// }
/// ```
#[derive(Default)]
pub struct CombatPluginGroup;

impl PluginGroup for CombatPluginGroup {
    fn build(self) -> bevy::app::PluginGroupBuilder {
        bevy::app::PluginGroupBuilder::start::<Self>()
            .add(CombatCorePlugin)
            .add(FireControlPlugin)
            .add(CreatureAiPlugin)
    }
}

/// Core combat plugin (projectiles, collision, damage, explosions).
///
/// Registers components and messages, initializes the configuration
/// resources, and schedules the tick phases.
///
/// # Systems
/// - `load_combat_config` - Reads [`config::CombatConfigFile`] at startup
/// - `attach_scenery_colliders` - Gives new scenery a static avian collider
/// - `tick_weapon_cooldowns` - Restores `can_shoot` on every weapon
/// - `advance_projectiles` - Ages, expires and moves projectiles
/// - `resolve_projectile_collisions` - First hit per projectile per tick
/// - `finish_remote_detonations` / `apply_projectile_hits` / `apply_explosions` - Damage
/// - `despawn_corpses` - Removes dead creatures after their display time
pub struct CombatCorePlugin;

impl Plugin for CombatCorePlugin {
    fn build(&self, app: &mut App) {
        use avian3d::prelude::SpatialQueryPipeline;

        app.register_type::<components::Projectile>()
            .register_type::<components::Explosive>()
            .register_type::<components::GuidedHeading>()
            .register_type::<components::Health>()
            .register_type::<components::SceneryPiece>()
            .register_type::<components::Creature>()
            .register_type::<components::Player>()
            .register_type::<components::Knockback>()
            .register_type::<components::Dead>()
            .register_type::<components::CorpseTimer>()
            .register_type::<weapon::Weapon>()
            .register_type::<resources::CombatConfig>()
            .init_resource::<resources::CombatConfig>()
            .init_resource::<resources::CombatRng>()
            .init_resource::<resources::WeaponPresets>()
            .add_message::<events::WeaponInput>()
            .add_message::<events::EquipWeapon>()
            .add_message::<events::ProjectileHit>()
            .add_message::<events::RemoteDetonated>()
            .add_message::<events::MuzzleFlashEvent>()
            .add_message::<events::ImpactEvent>()
            .add_message::<events::ExplosionEvent>()
            .add_message::<events::DestroyedEvent>()
            .add_message::<events::DeathEvent>()
            .add_message::<events::CameraShakeEvent>()
            .add_message::<events::SoundEvent>()
            .add_message::<events::HudEvent>()
            .add_message::<events::ReinforcementRequest>()
            .configure_sets(
                FixedUpdate,
                (
                    CombatSet::Input,
                    CombatSet::FireControl,
                    CombatSet::Ai,
                    CombatSet::Movement,
                    CombatSet::Collision,
                    CombatSet::Damage,
                    CombatSet::Cleanup,
                )
                    .chain(),
            )
            .add_systems(Startup, config::load_combat_config)
            .add_systems(
                FixedUpdate,
                (
                    systems::collision::attach_scenery_colliders.before(CombatSet::Input),
                    systems::fire_control::tick_weapon_cooldowns.in_set(CombatSet::FireControl),
                    systems::kinematics::advance_projectiles.in_set(CombatSet::Movement),
                    systems::collision::resolve_projectile_collisions
                        .run_if(resource_exists::<SpatialQueryPipeline>)
                        .in_set(CombatSet::Collision),
                    (
                        systems::fire_control::finish_remote_detonations,
                        systems::damage::apply_projectile_hits,
                        systems::explosion::apply_explosions,
                    )
                        .chain()
                        .in_set(CombatSet::Damage),
                    systems::damage::despawn_corpses.in_set(CombatSet::Cleanup),
                ),
            );
    }

    fn finish(&self, app: &mut App) {
        if !app.world().contains_resource::<avian3d::prelude::SpatialQueryPipeline>() {
            warn!("No avian spatial query pipeline; add `PhysicsPlugins` or projectiles will not collide");
        }
    }
}

/// Fire-control plugin (player weapons).
///
/// Routes [`events::WeaponInput`] and [`events::EquipWeapon`] to the
/// weapon carrying [`weapon::ActiveWeapon`] and runs its fire mode.
///
/// # Systems
/// - `equip_weapons` - Moves the active marker
/// - `holster_weapons` - Tears down state of weapons that lost it
/// - `detonate_orphaned_remotes` - Ends flights whose weapon was despawned
/// - `handle_weapon_input` - Trigger, zoom and steering commands
/// - `advance_fire_control` - Single, continuous, spin-up and guided fire
/// - `update_scopes` - Field-of-view easing
pub struct FireControlPlugin;

impl Plugin for FireControlPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<weapon::ActiveWeapon>()
            .register_type::<weapon::FireMode>()
            .register_type::<weapon::Scope>()
            .add_systems(
                FixedUpdate,
                (
                    (
                        systems::fire_control::equip_weapons,
                        systems::fire_control::holster_weapons,
                        systems::fire_control::detonate_orphaned_remotes,
                        systems::fire_control::handle_weapon_input,
                    )
                        .chain()
                        .in_set(CombatSet::Input),
                    (
                        systems::fire_control::advance_fire_control,
                        systems::fire_control::update_scopes,
                    )
                        .chain()
                        .after(systems::fire_control::tick_weapon_cooldowns)
                        .in_set(CombatSet::FireControl),
                ),
            );
    }
}

/// Creature behaviour plugin (armed enemies, critters, landing after knockback).
pub struct CreatureAiPlugin;

impl Plugin for CreatureAiPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<components::EnemyBrain>()
            .register_type::<components::Critter>()
            .add_systems(
                FixedUpdate,
                (
                    systems::creature::run_enemy_ai,
                    systems::critter::run_critters,
                    systems::explosion::settle_knockback,
                )
                    .chain()
                    .in_set(CombatSet::Ai),
            );
    }
}

/// Debug plugin for combat visualization.
pub struct CombatDebugPlugin;

impl Plugin for CombatDebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                systems::debug::draw_projectile_debug,
                systems::debug::draw_target_debug,
            ),
        );
    }
}
