//! Projectile flight, collision and damage through the full tick.

mod common;

use std::f32::consts::FRAC_PI_2;

use approx::assert_relative_eq;
use avian3d::prelude::LinearVelocity;
use bevy::ecs::message::Messages;
use bevy::prelude::*;
use bevy_fps_combat::prelude::*;
use common::*;

fn bullet(damage: f32) -> ProjectileSpawnParams {
    ProjectileSpawnParams::new(EYE, Vec3::NEG_Z, 70.0).with_damage(damage)
}

#[test]
fn test_wall_destroyed_by_third_hit() {
    let mut app = app();
    let wall = spawn_scenery(
        &mut app,
        SceneryPiece::destructible(Vec3::ONE),
        100.0,
        Transform::from_xyz(0.0, 1.6, -10.0),
    );

    for expected in [60.0, 20.0] {
        let shot = fire(&mut app, bullet(40.0));
        step(&mut app, ticks(0.5));
        assert!(!is_alive(&app, shot));
        assert_relative_eq!(app.world().get::<Health>(wall).unwrap().current, expected);
    }
    assert_eq!(count::<DestroyedEvent>(&app), 0);

    fire(&mut app, bullet(40.0));
    step(&mut app, ticks(0.5));
    assert!(!is_alive(&app, wall));
    assert_eq!(count::<DestroyedEvent>(&app), 1);
    assert_eq!(count::<ProjectileHit>(&app), 3);

    let hit = recorded::<ProjectileHit>(&app)[0];
    assert_eq!(hit.kind, HitTargetKind::Scenery);
    assert_relative_eq!(hit.point.z, -9.0, epsilon = 1e-3);
    assert_relative_eq!(hit.normal.z, 1.0, epsilon = 1e-3);
}

#[test]
fn test_indestructible_wall_stops_bullet() {
    let mut app = app();
    let wall = spawn_scenery(
        &mut app,
        SceneryPiece::solid(Vec3::ONE),
        100.0,
        Transform::from_xyz(0.0, 1.6, -5.0),
    );
    let creature_behind = app
        .world_mut()
        .spawn((Creature::critter(1.0), Health::new(10.0), Transform::from_xyz(0.0, 1.6, -8.0)))
        .id();

    let shot = fire(&mut app, bullet(500.0));
    step(&mut app, ticks(0.5));

    assert!(!is_alive(&app, shot));
    assert_eq!(app.world().get::<Health>(wall).unwrap().current, 100.0);
    assert_eq!(app.world().get::<Health>(creature_behind).unwrap().current, 10.0);
    assert_eq!(count::<ImpactEvent>(&app), 1);
}

#[test]
fn test_one_hit_per_projectile_per_tick() {
    let mut app = app();
    let first = app
        .world_mut()
        .spawn((Creature::critter(1.0), Health::new(100.0), Transform::from_xyz(1.0, 1.0, 0.0)))
        .id();
    let second = app
        .world_mut()
        .spawn((Creature::critter(1.0), Health::new(100.0), Transform::from_xyz(1.2, 1.0, 0.0)))
        .id();

    let shot = fire(
        &mut app,
        ProjectileSpawnParams::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 64.0).with_damage(10.0),
    );
    step(&mut app, 1);

    assert!(!is_alive(&app, shot));
    let hits = recorded::<ProjectileHit>(&app);
    assert_eq!(hits.len(), 1);
    let total: f32 = [first, second]
        .iter()
        .map(|e| app.world().get::<Health>(*e).unwrap().current)
        .sum();
    assert_relative_eq!(total, 190.0);

    step(&mut app, 10);
    assert_eq!(count::<ProjectileHit>(&app), 1);
}

#[test]
fn test_projectile_expires_without_hitting() {
    let mut app = app();
    let shot = fire(
        &mut app,
        ProjectileSpawnParams::new(EYE, Vec3::Y, 1.0).with_lifespan(0.5),
    );

    step(&mut app, ticks(0.25));
    assert!(is_alive(&app, shot));

    step(&mut app, ticks(0.5));
    assert!(!is_alive(&app, shot));
    assert_eq!(count::<ProjectileHit>(&app), 0);
    assert_eq!(count::<ImpactEvent>(&app), 0);
}

#[test]
fn test_bullet_into_ground_reports_impact() {
    let mut app = app();
    let shot = fire(
        &mut app,
        ProjectileSpawnParams::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, -1.0, -1.0), 40.0),
    );
    step(&mut app, ticks(0.5));

    assert!(!is_alive(&app, shot));
    let impacts = recorded::<ImpactEvent>(&app);
    assert_eq!(impacts.len(), 1);
    assert_eq!(impacts[0].normal, Vec3::Y);
    assert_eq!(impacts[0].target, None);
    assert_eq!(count::<ProjectileHit>(&app), 0);
}

#[test]
fn test_enemy_bullet_damages_player() {
    let mut app = app();
    let player = spawn_player(&mut app, EYE);
    let shot = fire(
        &mut app,
        ProjectileSpawnParams::new(Vec3::new(0.0, 1.6, -10.0), Vec3::Z, 20.0)
            .with_damage(10.0)
            .with_radius(0.1)
            .with_faction(Faction::Hostile),
    );
    step(&mut app, ticks(1.0));

    assert!(!is_alive(&app, shot));
    assert_relative_eq!(app.world().get::<Health>(player).unwrap().current, 90.0);
    assert!(recorded::<HudEvent>(&app).contains(&HudEvent::PlayerHealth {
        current: 90.0,
        max: 100.0
    }));
    let shakes = recorded::<CameraShakeEvent>(&app);
    assert_eq!(shakes.len(), 1);
    assert_relative_eq!(shakes[0].intensity, 0.5);
}

#[test]
fn test_player_bullet_ignores_player() {
    let mut app = app();
    let player = spawn_player(&mut app, EYE);
    fire(&mut app, bullet(25.0));
    step(&mut app, ticks(0.5));
    assert_eq!(app.world().get::<Health>(player).unwrap().current, 100.0);
}

#[test]
fn test_explosion_falloff_damage() {
    let mut app = app();
    let crate_piece = spawn_scenery(
        &mut app,
        SceneryPiece::destructible(Vec3::splat(0.5)),
        500.0,
        Transform::from_xyz(2.0, 0.0, 0.0),
    );
    let out_of_range = spawn_scenery(
        &mut app,
        SceneryPiece::destructible(Vec3::splat(0.5)),
        500.0,
        Transform::from_xyz(6.0, 0.0, 0.0),
    );
    let player = spawn_player(&mut app, Vec3::new(-1.0, 0.0, 0.0));

    send(&mut app, ExplosionEvent::new(Vec3::ZERO, 5.0, 200.0));
    step(&mut app, 1);

    assert_relative_eq!(app.world().get::<Health>(crate_piece).unwrap().current, 380.0, epsilon = 1e-3);
    assert_eq!(app.world().get::<Health>(out_of_range).unwrap().current, 500.0);
    assert_eq!(app.world().get::<Health>(player).unwrap().current, 100.0);
    assert_eq!(count::<CameraShakeEvent>(&app), 1);
}

fn critter_at(app: &mut App, position: Vec3, health: f32) -> Entity {
    app.world_mut()
        .spawn((Creature::critter(1.0), Health::new(health), Transform::from_translation(position)))
        .id()
}

#[test]
fn test_explosion_damages_creature_by_distance() {
    let mut app = app();
    let critter = critter_at(&mut app, Vec3::new(2.0, 0.0, 0.0), 1000.0);

    send(&mut app, ExplosionEvent::new(Vec3::ZERO, 5.0, 200.0).with_force(20.0));
    step(&mut app, 1);

    // 200 * (1 - 2 / 5)
    assert_relative_eq!(app.world().get::<Health>(critter).unwrap().current, 880.0, epsilon = 1e-3);
    assert!(app.world().get::<Knockback>(critter).is_some());
    assert_eq!(count::<DeathEvent>(&app), 0);
}

#[test]
fn test_explosion_knocks_creature_away() {
    let mut app = app();
    let critter = critter_at(&mut app, Vec3::new(2.0, 0.0, 0.0), 1000.0);

    send(&mut app, ExplosionEvent::new(Vec3::ZERO, 5.0, 10.0).with_force(20.0));
    step(&mut app, 1);
    let velocity = app.world().get::<LinearVelocity>(critter).unwrap().0;
    assert!(velocity.x > 0.0);
    assert!(velocity.y > 0.0);

    step(&mut app, ticks(3.0));
    let landed = app.world().get::<Transform>(critter).unwrap().translation;
    assert!(landed.x > 2.0);
    assert_eq!(landed.y, 0.0);
    assert!(app.world().get::<Knockback>(critter).is_none());
    assert!(app.world().get::<LinearVelocity>(critter).is_none());
}

#[test]
fn test_creature_killed_by_blast_is_not_thrown() {
    let mut app = app();
    let critter = critter_at(&mut app, Vec3::new(2.0, 0.0, 0.0), 100.0);

    send(&mut app, ExplosionEvent::new(Vec3::ZERO, 5.0, 200.0).with_force(20.0));
    step(&mut app, 1);

    assert!(app.world().get::<Dead>(critter).is_some());
    assert_eq!(count::<DeathEvent>(&app), 1);
    assert!(app.world().get::<Knockback>(critter).is_none());
    assert!(app.world().get::<LinearVelocity>(critter).is_none());

    step(&mut app, ticks(0.5));
    assert_eq!(app.world().get::<Transform>(critter).unwrap().translation, Vec3::new(2.0, 0.0, 0.0));
}

#[test]
fn test_bazooka_rocket_explodes_on_wall() {
    let mut app = app();
    let wall = spawn_scenery(
        &mut app,
        SceneryPiece::destructible(Vec3::ONE),
        1000.0,
        Transform::from_xyz(0.0, 1.6, -10.0),
    );

    let rocket = fire(
        &mut app,
        bullet(200.0).with_explosive(Explosive::new(5.0, 20.0)),
    );
    step(&mut app, ticks(1.0));

    assert!(!is_alive(&app, rocket));
    assert_eq!(count::<ProjectileHit>(&app), 0);
    let explosions = recorded::<ExplosionEvent>(&app);
    assert_eq!(explosions.len(), 1);
    assert_eq!(explosions[0].source, Some(rocket));
    // Wall centre is 1 from the blast on its front face
    assert_relative_eq!(app.world().get::<Health>(wall).unwrap().current, 840.0, epsilon = 1e-2);
}

#[test]
fn test_rotated_wall_blocks_along_its_long_side() {
    let mut app = app();
    // Long side along X once turned a quarter round
    let wall = spawn_scenery(
        &mut app,
        SceneryPiece::destructible(Vec3::new(0.25, 1.5, 3.0)),
        100.0,
        Transform::from_xyz(0.0, 1.5, -10.0).with_rotation(Quat::from_rotation_y(FRAC_PI_2)),
    );

    let shot = fire(
        &mut app,
        ProjectileSpawnParams::new(Vec3::new(2.0, 1.6, 0.0), Vec3::NEG_Z, 70.0).with_damage(40.0),
    );
    step(&mut app, ticks(0.5));

    assert!(!is_alive(&app, shot));
    let hits = recorded::<ProjectileHit>(&app);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].target, wall);
    assert_relative_eq!(hits[0].point.z, -9.75, epsilon = 1e-3);
    assert_relative_eq!(hits[0].normal.z, 1.0, epsilon = 1e-3);
    assert_relative_eq!(app.world().get::<Health>(wall).unwrap().current, 60.0);
}

#[test]
fn test_parented_wall_uses_world_placement() {
    let mut app = app();
    let parent = app
        .world_mut()
        .spawn(Transform::from_xyz(0.0, 0.0, -10.0).with_rotation(Quat::from_rotation_y(FRAC_PI_2)))
        .id();
    // Locally a wide, thin wall; the parent's turn makes it long in Z
    let wall = app
        .world_mut()
        .spawn((
            SceneryPiece::destructible(Vec3::new(3.0, 1.5, 0.25)),
            Health::new(100.0),
            Transform::from_xyz(0.0, 1.5, 0.0),
            ChildOf(parent),
        ))
        .id();
    step(&mut app, 2);

    let shot = fire(&mut app, bullet(40.0));
    step(&mut app, ticks(0.5));

    assert!(!is_alive(&app, shot));
    let hits = recorded::<ProjectileHit>(&app);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].target, wall);
    assert_relative_eq!(hits[0].point.z, -7.0, epsilon = 1e-3);
    assert_relative_eq!(hits[0].normal.z, 1.0, epsilon = 1e-3);
}

#[test]
fn test_explosive_out_of_range_expires_without_blast() {
    let mut app = app();
    let rocket = fire(
        &mut app,
        ProjectileSpawnParams::new(EYE, Vec3::Y, 40.0)
            .with_damage(200.0)
            .with_max_distance(5.0)
            .with_explosive(Explosive::new(5.0, 20.0)),
    );
    step(&mut app, ticks(0.5));

    assert!(!is_alive(&app, rocket));
    assert_eq!(count::<ExplosionEvent>(&app), 0);
    assert_eq!(count::<ImpactEvent>(&app), 0);
}

#[test]
fn test_remote_out_of_range_detonates() {
    let mut app = app();
    let launcher = app
        .world_mut()
        .spawn(Weapon::new(100.0, 2.0, ProjectileSpec::default()))
        .id();
    let remote = fire(
        &mut app,
        ProjectileSpawnParams::new(EYE, Vec3::Y, 40.0)
            .with_kind(ProjectileKind::Remote)
            .with_owner(launcher)
            .with_max_distance(5.0)
            .with_explosive(Explosive::new(10.0, 1000.0)),
    );
    step(&mut app, ticks(0.5));

    assert!(!is_alive(&app, remote));
    assert_eq!(count::<RemoteDetonated>(&app), 1);
    let explosions = recorded::<ExplosionEvent>(&app);
    assert_eq!(explosions.len(), 1);
    assert!(explosions[0].center.distance(EYE) > 5.0);
}

#[test]
fn test_messages_are_registered() {
    let app = app();
    assert!(app.world().contains_resource::<Messages<WeaponInput>>());
    assert!(app.world().contains_resource::<Messages<HudEvent>>());
}
