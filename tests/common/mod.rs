//! Headless app harness shared by the integration tests.

#![allow(dead_code)]

use std::time::Duration;

use avian3d::prelude::PhysicsPlugins;
use bevy::ecs::message::{Message, MessageReader, Messages};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_fps_combat::prelude::*;

/// One simulation tick. A power of two so accumulated time stays exact.
pub const DT: f32 = 1.0 / 64.0;

/// Every message of type `M` written since the app was built.
#[derive(Resource)]
pub struct Recorded<M: Message>(pub Vec<M>);

impl<M: Message> Default for Recorded<M> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

fn record<M: Message + Clone>(mut reader: MessageReader<M>, mut recorded: ResMut<Recorded<M>>) {
    recorded.0.extend(reader.read().cloned());
}

fn record_messages<M: Message + Clone>(app: &mut App) {
    app.init_resource::<Recorded<M>>()
        .add_systems(FixedUpdate, record::<M>.after(CombatSet::Cleanup));
}

/// Headless combat app on avian physics, with a seeded random source and
/// recorders for every effect.
///
/// Each `app.update()` advances time by exactly one fixed tick.
pub fn app() -> App {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        TransformPlugin,
        AssetPlugin::default(),
        bevy::scene::ScenePlugin,
        PhysicsPlugins::default(),
    ))
    .init_asset::<Mesh>()
    .insert_resource(Time::<Fixed>::from_hz(1.0 / DT as f64))
    .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(DT)))
    .add_plugins(CombatPluginGroup)
    .insert_resource(CombatRng::seeded(7));

    record_messages::<ProjectileHit>(&mut app);
    record_messages::<RemoteDetonated>(&mut app);
    record_messages::<MuzzleFlashEvent>(&mut app);
    record_messages::<ImpactEvent>(&mut app);
    record_messages::<ExplosionEvent>(&mut app);
    record_messages::<DestroyedEvent>(&mut app);
    record_messages::<DeathEvent>(&mut app);
    record_messages::<CameraShakeEvent>(&mut app);
    record_messages::<SoundEvent>(&mut app);
    record_messages::<HudEvent>(&mut app);
    record_messages::<ReinforcementRequest>(&mut app);

    app.finish();
    app.cleanup();
    // The first update only starts the clock
    app.update();
    app
}

/// Runs `ticks` fixed ticks of [`DT`] seconds.
pub fn step(app: &mut App, ticks: u32) {
    for _ in 0..ticks {
        app.update();
    }
}

/// Number of ticks covering `secs` seconds.
pub fn ticks(secs: f32) -> u32 {
    (secs / DT).round() as u32
}

pub fn recorded<M: Message + Clone>(app: &App) -> Vec<M> {
    app.world().resource::<Recorded<M>>().0.clone()
}

pub fn count<M: Message + Clone>(app: &App) -> usize {
    app.world().resource::<Recorded<M>>().0.len()
}

pub fn send<M: Message>(app: &mut App, message: M) {
    app.world_mut().resource_mut::<Messages<M>>().write(message);
}

/// Spawns the named preset at `transform` and makes it the active weapon.
pub fn equip_preset(app: &mut App, name: &str, transform: Transform) -> Entity {
    let preset = app
        .world()
        .resource::<WeaponPresets>()
        .get(name)
        .cloned()
        .unwrap_or_else(|| panic!("missing preset {name}"));
    let world = app.world_mut();
    let weapon = {
        let mut commands = world.commands();
        preset.spawn(&mut commands, transform)
    };
    world.flush();
    world.entity_mut(weapon).insert(ActiveWeapon);
    weapon
}

pub fn fire(app: &mut App, projectile: ProjectileSpawnParams) -> Entity {
    let world = app.world_mut();
    let id = {
        let mut commands = world.commands();
        spawn_projectile(&mut commands, &projectile)
    };
    world.flush();
    id
}

pub fn spawn_player(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((Player, Health::new(100.0), Transform::from_translation(position)))
        .id()
}

/// Spawns scenery whose global transform is already resolved, as if it had
/// been part of the level since load.
pub fn spawn_scenery(app: &mut App, piece: SceneryPiece, health: f32, transform: Transform) -> Entity {
    app.world_mut()
        .spawn((piece, Health::new(health), transform, GlobalTransform::from(transform)))
        .id()
}

pub fn is_alive(app: &App, entity: Entity) -> bool {
    app.world().get_entity(entity).is_ok()
}

/// Player view height above the ground.
pub const EYE: Vec3 = Vec3::new(0.0, 1.6, 0.0);
