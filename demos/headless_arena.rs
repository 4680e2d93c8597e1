//! Headless arena: a scripted player fights enemies among destructible walls.
//!
//! Prints combat messages as they happen and exits after 20 seconds.

use avian3d::prelude::PhysicsPlugins;
use bevy::app::ScheduleRunnerPlugin;
use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;
use bevy_fps_combat::prelude::*;
use std::time::Duration;

const RUN_SECONDS: f32 = 20.0;

fn main() {
    println!("Starting headless combat arena...");

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / 60.0))))
        .add_plugins((
            TransformPlugin,
            AssetPlugin::default(),
            bevy::scene::ScenePlugin,
            PhysicsPlugins::default(),
        ))
        .init_asset::<Mesh>()
        .add_plugins(CombatPluginGroup)
        .insert_resource(CombatConfigFile {
            config: Some("combat.toml".into()),
            presets: None,
        })
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .add_systems(Startup, setup_arena)
        .add_systems(FixedUpdate, drive_player.in_set(CombatSet::Input))
        .add_systems(
            FixedUpdate,
            (spawn_reinforcements, print_combat_log).after(CombatSet::Cleanup),
        )
        .add_systems(Update, stop_after_timeout)
        .run();
}

#[derive(Resource)]
struct Arsenal {
    pistol: Entity,
    bazooka: Entity,
}

fn setup_arena(mut commands: Commands, presets: Res<WeaponPresets>, mut rng: ResMut<CombatRng>) {
    let eye = Transform::from_xyz(0.0, 1.6, 0.0);
    commands.spawn((Name::new("Player"), Player, Health::new(100.0), eye));

    let pistol = presets.get("pistol").map(|p| p.spawn(&mut commands, eye));
    let bazooka = presets.get("bazooka").map(|p| p.spawn(&mut commands, eye));
    if let (Some(pistol), Some(bazooka)) = (pistol, bazooka) {
        commands.entity(pistol).insert(ActiveWeapon);
        commands.insert_resource(Arsenal { pistol, bazooka });
    }

    for i in 0..5 {
        let x = i as f32 * 3.0 - 6.0;
        commands.spawn((
            Name::new("Crate wall"),
            SceneryPiece::destructible(Vec3::new(1.0, 1.5, 0.25)),
            Health::new(100.0),
            Transform::from_xyz(x, 1.5, -12.0),
        ));
    }
    commands.spawn((
        Name::new("Bunker"),
        SceneryPiece::solid(Vec3::new(4.0, 2.0, 1.0)),
        Health::new(100.0),
        Transform::from_xyz(10.0, 2.0, 5.0),
    ));

    spawn_enemy(&mut commands, &presets, Vec3::new(0.0, 0.0, -20.0));
    spawn_enemy(&mut commands, &presets, Vec3::new(-15.0, 0.0, -18.0));
    for i in 0..4 {
        let position = Vec3::new(i as f32 * 2.0 - 4.0, 0.0, 6.0);
        spawn_critter(&mut commands, &mut rng.0, position);
    }
    println!("[SETUP] Arena ready: 5 walls, 2 enemies, 4 critters");
}

/// Holds the pistol trigger, then switches to the bazooka for the last stretch.
fn drive_player(
    time: Res<Time>,
    arsenal: Option<Res<Arsenal>>,
    mut elapsed: Local<f32>,
    mut switched: Local<bool>,
    mut inputs: MessageWriter<WeaponInput>,
    mut equip: MessageWriter<EquipWeapon>,
) {
    let Some(arsenal) = arsenal else {
        return;
    };
    if *elapsed == 0.0 {
        inputs.write(WeaponInput::new(arsenal.pistol, WeaponAction::TriggerPressed));
    }
    *elapsed += time.delta_secs();

    if *elapsed > RUN_SECONDS * 0.5 && !*switched {
        *switched = true;
        equip.write(EquipWeapon {
            weapon: arsenal.bazooka,
        });
        println!("[INPUT] Switching to bazooka");
    } else if *switched {
        inputs.write(WeaponInput::new(arsenal.bazooka, WeaponAction::TriggerReleased));
        inputs.write(WeaponInput::new(arsenal.bazooka, WeaponAction::TriggerPressed));
    }
}

fn spawn_reinforcements(
    mut commands: Commands,
    presets: Res<WeaponPresets>,
    mut requests: MessageReader<ReinforcementRequest>,
) {
    for request in requests.read() {
        for i in 0..request.count {
            let offset = Vec3::new(i as f32 * 4.0 - 2.0, 0.0, -8.0);
            spawn_enemy(&mut commands, &presets, request.near + offset);
        }
        println!("[SPAWN] {} reinforcements near {}", request.count, request.near);
    }
}

fn print_combat_log(
    mut hits: MessageReader<ProjectileHit>,
    mut destroyed: MessageReader<DestroyedEvent>,
    mut deaths: MessageReader<DeathEvent>,
    mut explosions: MessageReader<ExplosionEvent>,
    mut hud: MessageReader<HudEvent>,
) {
    for hit in hits.read() {
        println!("[HIT] {:?} {} for {:.0}", hit.kind, hit.target, hit.damage);
    }
    for event in destroyed.read() {
        println!("[DESTROYED] {} at {:.1}", event.entity, event.position);
    }
    for event in deaths.read() {
        println!("[DEATH] {} at {:.1}", event.entity, event.position);
    }
    for event in explosions.read() {
        println!("[EXPLOSION] radius {} at {:.1}", event.radius, event.center);
    }
    for event in hud.read() {
        if let HudEvent::PlayerHealth { current, max } = event {
            println!("[HUD] Player health {current:.0}/{max:.0}");
        }
    }
}

fn stop_after_timeout(time: Res<Time>, mut exit: MessageWriter<AppExit>) {
    if time.elapsed_secs() > RUN_SECONDS {
        println!("[FINISHED] Arena run complete.");
        exit.write(AppExit::Success);
    }
}
