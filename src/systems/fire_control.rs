//! Fire-control systems: input routing, weapon switching, shooting and
//! remote-guided flight.

use bevy::prelude::*;
use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::ecs::system::SystemParam;
use rand::Rng;

use crate::components::{Explosive, GuidedHeading, Projectile};
use crate::events::{
    CameraShakeEvent, EquipWeapon, ExplosionEvent, HudEvent, MuzzleFlashEvent, RemoteDetonated, SoundEvent,
    WeaponAction, WeaponInput,
};
use crate::resources::{CombatConfig, CombatRng};
use crate::systems::accuracy::apply_spread;
use crate::systems::explosion::explosion_from;
use crate::systems::kinematics::spawn_projectile;
use crate::types::{ProjectileKind, SoundCue};
use crate::weapon::{ActiveWeapon, FireMode, Guided, Scope, Weapon};

/// Remote projectiles as seen by the fire-control systems.
pub type RemoteQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static mut Projectile,
        &'static Transform,
        Option<&'static Explosive>,
        Option<&'static mut GuidedHeading>,
    ),
    Without<Weapon>,
>;

/// Feedback emitted when control of a remote projectile changes hands.
#[derive(SystemParam)]
pub struct ControlFeedback<'w> {
    pub hud: MessageWriter<'w, HudEvent>,
    pub sounds: MessageWriter<'w, SoundEvent>,
    pub shakes: MessageWriter<'w, CameraShakeEvent>,
}

/// Everything a shooting system may emit.
#[derive(SystemParam)]
pub struct FireEffects<'w> {
    pub control: ControlFeedback<'w>,
    pub flashes: MessageWriter<'w, MuzzleFlashEvent>,
    pub explosions: MessageWriter<'w, ExplosionEvent>,
    pub detonations: MessageWriter<'w, RemoteDetonated>,
}

/// Launches one projectile from `origin` toward `aim`, with spread,
/// muzzle flash and fire sound.
#[allow(clippy::too_many_arguments)]
pub fn launch(
    commands: &mut Commands,
    rng: &mut impl Rng,
    config: &CombatConfig,
    effects: &mut FireEffects,
    weapon: &Weapon,
    shooter: Entity,
    origin: Vec3,
    aim: Vec3,
) -> Entity {
    let direction = apply_spread(aim, weapon.spread, rng);
    let params = weapon.spawn_params(origin, direction, shooter, config.max_projectile_distance);
    let projectile = spawn_projectile(commands, &params);
    effects.flashes.write(MuzzleFlashEvent {
        shooter,
        position: origin,
        direction,
    });
    effects.control.sounds.write(SoundEvent::at(weapon.fire_sound, origin));
    projectile
}

/// Fires from the weapon's next muzzle along its forward axis.
fn shoot(
    commands: &mut Commands,
    rng: &mut CombatRng,
    config: &CombatConfig,
    effects: &mut FireEffects,
    weapon: &mut Weapon,
    shooter: Entity,
    transform: &Transform,
) -> Entity {
    let offset = weapon.cycle_muzzle();
    let origin = transform.translation + transform.rotation * offset;
    let aim = transform.forward().as_vec3();
    launch(commands, &mut rng.0, config, effects, weapon, shooter, origin, aim)
}

/// Marks a remote projectile dead and detonates its payload.
///
/// Returns `false` if the projectile was already resolved.
fn detonate_remote(projectile: Entity, weapon: Entity, remotes: &mut RemoteQuery, effects: &mut FireEffects) -> bool {
    let Ok((_, mut state, transform, explosive, _)) = remotes.get_mut(projectile) else {
        return false;
    };
    if !state.alive {
        return false;
    }
    state.alive = false;

    let position = transform.translation;
    if let Some(explosive) = explosive {
        effects.explosions.write(explosion_from(projectile, &state, explosive, position));
    }
    effects.detonations.write(RemoteDetonated {
        projectile,
        weapon,
        position,
    });
    debug!("Remote projectile {projectile} detonated at {position}");
    true
}

/// Returns control to the player after a guided flight.
pub fn end_remote_flight(guided: &mut Guided, config: &CombatConfig, feedback: &mut ControlFeedback) {
    guided.release();
    feedback.hud.write(HudEvent::RemoteFlightEnded);
    feedback.hud.write(HudEvent::Crosshair { visible: true });
    feedback.sounds.write(SoundEvent::global(SoundCue::TranslocatorTeleport));
    if let Some(intensity) = config.shake(config.remote_detonation_shake) {
        feedback.shakes.write(CameraShakeEvent { intensity });
    }
}

/// Moves the [`ActiveWeapon`] marker to the requested weapon.
pub fn equip_weapons(
    mut commands: Commands,
    mut requests: MessageReader<EquipWeapon>,
    active: Query<Entity, With<ActiveWeapon>>,
    weapons: Query<(), With<Weapon>>,
) {
    let Some(request) = requests.read().last().copied() else {
        return;
    };
    if weapons.get(request.weapon).is_err() {
        warn!("Cannot equip {}: not a weapon", request.weapon);
        return;
    }

    for entity in active.iter() {
        if entity != request.weapon {
            commands.entity(entity).remove::<ActiveWeapon>();
        }
    }
    commands.entity(request.weapon).insert(ActiveWeapon);
}

/// Tears down weapons that lost the [`ActiveWeapon`] marker.
///
/// Releases the trigger, stops the barrels, drops zoom and detonates a
/// piloted projectile so no input handler outlives the weapon.
pub fn holster_weapons(
    config: Res<CombatConfig>,
    mut removed: RemovedComponents<ActiveWeapon>,
    mut weapons: Query<(&mut Weapon, &mut FireMode, Option<&mut Scope>), Without<ActiveWeapon>>,
    mut remotes: RemoteQuery,
    mut effects: FireEffects,
) {
    for entity in removed.read() {
        let Ok((mut weapon, mut mode, scope)) = weapons.get_mut(entity) else {
            continue;
        };

        weapon.holster();
        match &mut *mode {
            FireMode::SpinUp(spin) => spin.reset(),
            FireMode::Guided(guided) if guided.is_controlled() => {
                if let Some(projectile) = guided.projectile {
                    detonate_remote(projectile, entity, &mut remotes, &mut effects);
                }
                end_remote_flight(guided, &config, &mut effects.control);
            }
            _ => {}
        }

        if let Some(mut scope) = scope {
            if scope.zoomed || scope.fov != scope.base_fov {
                scope.reset();
                effects.control.hud.write(HudEvent::ScopeOverlay { visible: false });
                effects.control.hud.write(HudEvent::FieldOfView { fov: scope.fov });
            }
        }
        debug!("Holstered weapon {entity}");
    }
}

/// Detonates piloted projectiles whose weapon no longer exists.
///
/// A despawned weapon is never holstered, so nothing else would end the
/// flight it started.
pub fn detonate_orphaned_remotes(
    weapons: Query<(), With<Weapon>>,
    mut remotes: RemoteQuery,
    mut effects: FireEffects,
) {
    let orphans: Vec<(Entity, Entity)> = remotes
        .iter()
        .filter(|(_, projectile, ..)| {
            projectile.alive && projectile.kind == ProjectileKind::Remote && !weapons.contains(projectile.owner)
        })
        .map(|(entity, projectile, ..)| (entity, projectile.owner))
        .collect();

    for (projectile, weapon) in orphans {
        if detonate_remote(projectile, weapon, &mut remotes, &mut effects) {
            effects.control.hud.write(HudEvent::RemoteFlightEnded);
            effects.control.hud.write(HudEvent::Crosshair { visible: true });
            info!("Weapon {weapon} is gone; detonated its remote projectile {projectile}");
        }
    }
}

/// Routes player commands to the active weapon.
pub fn handle_weapon_input(
    mut inputs: MessageReader<WeaponInput>,
    mut weapons: Query<(&mut Weapon, &mut FireMode, Option<&mut Scope>), With<ActiveWeapon>>,
    mut hud: MessageWriter<HudEvent>,
) {
    for input in inputs.read() {
        let Ok((mut weapon, mut mode, scope)) = weapons.get_mut(input.weapon) else {
            continue;
        };

        match input.action {
            WeaponAction::TriggerPressed => weapon.press_trigger(),
            WeaponAction::TriggerReleased => weapon.release_trigger(),
            WeaponAction::ZoomPressed | WeaponAction::ZoomReleased => {
                let zoomed = input.action == WeaponAction::ZoomPressed;
                if let Some(mut scope) = scope {
                    if scope.zoomed != zoomed {
                        scope.zoomed = zoomed;
                        hud.write(HudEvent::ScopeOverlay { visible: zoomed });
                    }
                }
            }
            WeaponAction::Steer(delta) => {
                if let Some(guided) = mode.guided_mut() {
                    guided.steer(delta);
                }
            }
        }
    }
}

/// Counts down every weapon's cooldown, active or not.
pub fn tick_weapon_cooldowns(time: Res<Time>, mut weapons: Query<&mut Weapon>) {
    let dt = time.delta_secs();
    for mut weapon in weapons.iter_mut() {
        weapon.tick(dt);
    }
}

/// Runs each active weapon's fire mode for one tick.
pub fn advance_fire_control(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<CombatConfig>,
    mut rng: ResMut<CombatRng>,
    mut weapons: Query<(Entity, &mut Weapon, &mut FireMode, &Transform), With<ActiveWeapon>>,
    mut remotes: RemoteQuery,
    mut effects: FireEffects,
) {
    let dt = time.delta_secs();

    for (entity, mut weapon, mut mode, transform) in weapons.iter_mut() {
        let pulled = weapon.take_pull();

        match &mut *mode {
            FireMode::Single => {
                if pulled && weapon.try_fire() {
                    shoot(&mut commands, &mut rng, &config, &mut effects, &mut weapon, entity, transform);
                }
            }
            FireMode::Continuous => {
                if (pulled || weapon.trigger_held) && weapon.try_fire() {
                    shoot(&mut commands, &mut rng, &config, &mut effects, &mut weapon, entity, transform);
                }
            }
            FireMode::SpinUp(spin) => {
                spin.advance(weapon.trigger_held, dt);
                if weapon.trigger_held && spin.can_fire() && weapon.try_fire_with_cooldown(spin.cooldown()) {
                    shoot(&mut commands, &mut rng, &config, &mut effects, &mut weapon, entity, transform);
                }
            }
            FireMode::Guided(guided) if guided.is_controlled() => {
                let timed_out = guided.advance(dt);
                let Some(projectile) = guided.projectile else {
                    end_remote_flight(guided, &config, &mut effects.control);
                    continue;
                };

                let speed = match remotes.get_mut(projectile) {
                    Ok((_, state, _, _, heading)) if state.alive => {
                        if let Some(mut heading) = heading {
                            heading.0 = guided.heading();
                        }
                        Some(state.speed)
                    }
                    _ => None,
                };

                match speed {
                    Some(_) if pulled || timed_out => {
                        detonate_remote(projectile, entity, &mut remotes, &mut effects);
                        end_remote_flight(guided, &config, &mut effects.control);
                    }
                    Some(speed) => {
                        effects.control.hud.write(HudEvent::RemoteFlight {
                            time_left: guided.time_left(),
                            speed,
                        });
                    }
                    // Resolved elsewhere or removed by the host
                    None => end_remote_flight(guided, &config, &mut effects.control),
                }
            }
            FireMode::Guided(guided) => {
                if pulled && weapon.try_fire() {
                    let origin = transform.translation + transform.rotation * weapon.cycle_muzzle();
                    let aim = transform.forward().as_vec3();
                    let projectile = launch(
                        &mut commands,
                        &mut rng.0,
                        &config,
                        &mut effects,
                        &weapon,
                        entity,
                        origin,
                        aim,
                    );
                    guided.begin(projectile, transform.rotation);
                    effects.control.hud.write(HudEvent::Crosshair { visible: false });
                    effects
                        .control
                        .sounds
                        .write(SoundEvent::global(SoundCue::TranslocatorTransition));
                    info!("Remote flight started with projectile {projectile}");
                }
            }
        }
    }
}

/// Eases every scope's field of view toward its target.
pub fn update_scopes(
    time: Res<Time>,
    mut scopes: Query<(&mut Scope, Has<ActiveWeapon>)>,
    mut hud: MessageWriter<HudEvent>,
) {
    let dt = time.delta_secs();
    for (mut scope, active) in scopes.iter_mut() {
        if scope.advance(dt) && active {
            hud.write(HudEvent::FieldOfView { fov: scope.fov });
        }
    }
}

/// Releases guided weapons whose projectile was resolved by collision.
pub fn finish_remote_detonations(
    config: Res<CombatConfig>,
    mut detonations: MessageReader<RemoteDetonated>,
    mut weapons: Query<&mut FireMode>,
    mut feedback: ControlFeedback,
) {
    for detonation in detonations.read() {
        let Ok(mut mode) = weapons.get_mut(detonation.weapon) else {
            continue;
        };
        let Some(guided) = mode.guided_mut() else {
            continue;
        };
        if guided.projectile == Some(detonation.projectile) {
            end_remote_flight(guided, &config, &mut feedback);
        }
    }
}
