//! Damage application, destruction and death handling.

use bevy::prelude::*;
use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::ecs::system::SystemParam;

use crate::components::{CorpseTimer, Creature, Dead, Health, Player, SceneryPiece};
use crate::events::{
    CameraShakeEvent, DeathEvent, DestroyedEvent, HudEvent, ProjectileHit, ReinforcementRequest, SoundEvent,
};
use crate::resources::CombatConfig;
use crate::types::{CreatureKind, DamageOutcome, SoundCue};

/// Effect channels written when targets are damaged.
#[derive(SystemParam)]
pub struct CombatFeedback<'w> {
    pub destroyed: MessageWriter<'w, DestroyedEvent>,
    pub deaths: MessageWriter<'w, DeathEvent>,
    pub sounds: MessageWriter<'w, SoundEvent>,
    pub shakes: MessageWriter<'w, CameraShakeEvent>,
    pub hud: MessageWriter<'w, HudEvent>,
    pub reinforcements: MessageWriter<'w, ReinforcementRequest>,
}

impl CombatFeedback<'_> {
    pub fn sound_at(&mut self, cue: SoundCue, position: Vec3) {
        self.sounds.write(SoundEvent::at(cue, position));
    }

    /// Requests camera shake unless it is below the configured threshold.
    pub fn shake(&mut self, config: &CombatConfig, intensity: f32) {
        if let Some(intensity) = config.shake(intensity) {
            self.shakes.write(CameraShakeEvent { intensity });
        }
    }
}

/// What kind of damageable thing an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetCategory {
    Scenery { destructible: bool },
    Creature(CreatureKind),
    Player,
}

impl TargetCategory {
    pub fn of(scenery: Option<&SceneryPiece>, creature: Option<&Creature>, is_player: bool) -> Option<Self> {
        if is_player {
            Some(TargetCategory::Player)
        } else if let Some(creature) = creature {
            Some(TargetCategory::Creature(creature.kind))
        } else {
            scenery.map(|piece| TargetCategory::Scenery {
                destructible: piece.destructible,
            })
        }
    }
}

/// A damage request against one entity.
#[derive(Debug, Clone, Copy)]
pub struct DamageRequest {
    pub entity: Entity,
    pub category: TargetCategory,
    pub position: Vec3,
    pub amount: f32,
    pub source: Option<Entity>,
}

/// Applies damage and runs the destruction or death consequences once.
///
/// Indestructible scenery and dead targets are left untouched.
pub fn apply_damage_to_target(
    commands: &mut Commands,
    feedback: &mut CombatFeedback,
    config: &CombatConfig,
    health: &mut Health,
    request: DamageRequest,
) -> DamageOutcome {
    if let TargetCategory::Scenery { destructible: false } = request.category {
        return DamageOutcome::Ignored;
    }

    let outcome = health.apply_damage(request.amount);
    if outcome == DamageOutcome::Ignored {
        return outcome;
    }

    let DamageRequest {
        entity,
        category,
        position,
        source,
        ..
    } = request;

    match (category, outcome.is_kill()) {
        (TargetCategory::Scenery { .. }, false) => {
            feedback.sound_at(SoundCue::Impact, position);
        }
        (TargetCategory::Scenery { .. }, true) => {
            info!("Scenery {entity} destroyed at {position}");
            feedback.destroyed.write(DestroyedEvent { entity, position });
            feedback.sound_at(SoundCue::Explosion, position);
            commands.entity(entity).despawn();
        }
        (TargetCategory::Creature(kind), false) => {
            let cue = match kind {
                CreatureKind::Hostile => SoundCue::Hit,
                CreatureKind::Critter => SoundCue::Scream,
            };
            feedback.sound_at(cue, position);
        }
        (TargetCategory::Creature(kind), true) => {
            info!("{kind:?} creature {entity} died at {position}");
            feedback.deaths.write(DeathEvent {
                entity,
                position,
                killer: source,
            });
            let cue = match kind {
                CreatureKind::Hostile => SoundCue::Death,
                CreatureKind::Critter => SoundCue::Scream,
            };
            feedback.sound_at(cue, position);
            commands.entity(entity).insert((
                Dead,
                CorpseTimer {
                    remaining: config.corpse_display_secs,
                },
            ));
            if kind == CreatureKind::Hostile && config.reinforcements_per_kill > 0 {
                feedback.reinforcements.write(ReinforcementRequest {
                    count: config.reinforcements_per_kill,
                    near: position,
                });
            }
        }
        (TargetCategory::Player, killed) => {
            feedback.hud.write(HudEvent::PlayerHealth {
                current: health.current,
                max: health.max,
            });
            feedback.sound_at(SoundCue::Hit, position);
            feedback.shake(config, config.player_hit_shake);
            if killed {
                info!("Player killed");
                feedback.hud.write(HudEvent::PlayerDown);
            }
        }
    }

    outcome
}

/// Applies direct projectile hits.
pub fn apply_projectile_hits(
    mut commands: Commands,
    config: Res<CombatConfig>,
    mut hits: MessageReader<ProjectileHit>,
    mut targets: Query<(
        &Transform,
        Option<&mut Health>,
        Option<&SceneryPiece>,
        Option<&Creature>,
        Has<Player>,
    )>,
    mut feedback: CombatFeedback,
) {
    for hit in hits.read() {
        let Ok((transform, health, scenery, creature, is_player)) = targets.get_mut(hit.target) else {
            continue;
        };
        let Some(mut health) = health else {
            continue;
        };
        let Some(category) = TargetCategory::of(scenery, creature, is_player) else {
            continue;
        };

        let outcome = apply_damage_to_target(
            &mut commands,
            &mut feedback,
            &config,
            &mut health,
            DamageRequest {
                entity: hit.target,
                category,
                position: transform.translation,
                amount: hit.damage,
                source: Some(hit.owner),
            },
        );
        debug!("Hit on {} for {}: {outcome:?}", hit.target, hit.damage);
    }
}

/// Removes dead creatures once their corpse timer runs out.
pub fn despawn_corpses(
    mut commands: Commands,
    time: Res<Time>,
    mut corpses: Query<(Entity, &mut CorpseTimer), With<Dead>>,
) {
    let dt = time.delta_secs();
    for (entity, mut timer) in corpses.iter_mut() {
        timer.remaining -= dt;
        if timer.remaining <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::message::{Message, Messages};
    use bevy::ecs::system::RunSystemOnce;

    fn world() -> World {
        let mut world = World::new();
        world.insert_resource(CombatConfig::default());
        world.init_resource::<Messages<DestroyedEvent>>();
        world.init_resource::<Messages<DeathEvent>>();
        world.init_resource::<Messages<SoundEvent>>();
        world.init_resource::<Messages<CameraShakeEvent>>();
        world.init_resource::<Messages<HudEvent>>();
        world.init_resource::<Messages<ReinforcementRequest>>();
        world
    }

    fn damage(world: &mut World, entity: Entity, category: TargetCategory, amount: f32) -> DamageOutcome {
        world
            .run_system_once(
                move |mut commands: Commands,
                      config: Res<CombatConfig>,
                      mut healths: Query<&mut Health>,
                      mut feedback: CombatFeedback| {
                    let mut health = healths.get_mut(entity).unwrap();
                    apply_damage_to_target(
                        &mut commands,
                        &mut feedback,
                        &config,
                        &mut health,
                        DamageRequest {
                            entity,
                            category,
                            position: Vec3::ZERO,
                            amount,
                            source: None,
                        },
                    )
                },
            )
            .unwrap()
    }

    fn read_all<M: Message + Clone>(world: &mut World) -> Vec<M> {
        world
            .run_system_once(|mut reader: MessageReader<M>| reader.read().cloned().collect::<Vec<M>>())
            .unwrap()
    }

    fn count<M: Message + Clone>(world: &mut World) -> usize {
        read_all::<M>(world).len()
    }

    #[test]
    fn test_scenery_destroyed_once() {
        let mut world = world();
        let wall = world.spawn(Health::new(100.0)).id();
        let category = TargetCategory::Scenery { destructible: true };

        assert_eq!(damage(&mut world, wall, category, 40.0), DamageOutcome::Damaged { remaining: 60.0 });
        assert_eq!(damage(&mut world, wall, category, 40.0), DamageOutcome::Damaged { remaining: 20.0 });
        assert_eq!(damage(&mut world, wall, category, 40.0), DamageOutcome::Killed);

        assert_eq!(count::<DestroyedEvent>(&mut world), 1);
        assert!(world.get_entity(wall).is_err());
    }

    #[test]
    fn test_indestructible_scenery_untouched() {
        let mut world = world();
        let wall = world.spawn(Health::new(100.0)).id();
        let outcome = damage(&mut world, wall, TargetCategory::Scenery { destructible: false }, 500.0);
        assert_eq!(outcome, DamageOutcome::Ignored);
        assert_eq!(world.get::<Health>(wall).unwrap().current, 100.0);
    }

    #[test]
    fn test_hostile_death_requests_reinforcements() {
        let mut world = world();
        let enemy = world.spawn(Health::new(50.0)).id();
        let category = TargetCategory::Creature(CreatureKind::Hostile);

        assert_eq!(damage(&mut world, enemy, category, 60.0), DamageOutcome::Killed);
        assert_eq!(damage(&mut world, enemy, category, 60.0), DamageOutcome::Ignored);

        assert!(world.get::<Dead>(enemy).is_some());
        assert_eq!(count::<DeathEvent>(&mut world), 1);
        let requests: Vec<_> = read_all::<ReinforcementRequest>(&mut world);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].count, 2);
    }

    #[test]
    fn test_critter_death_requests_nothing() {
        let mut world = world();
        let critter = world.spawn(Health::new(10.0)).id();
        damage(&mut world, critter, TargetCategory::Creature(CreatureKind::Critter), 25.0);
        assert_eq!(count::<DeathEvent>(&mut world), 1);
        assert_eq!(count::<ReinforcementRequest>(&mut world), 0);
    }

    #[test]
    fn test_player_hit_updates_hud_and_shakes() {
        let mut world = world();
        let player = world.spawn(Health::new(100.0)).id();
        damage(&mut world, player, TargetCategory::Player, 10.0);

        let hud: Vec<_> = read_all::<HudEvent>(&mut world);
        assert_eq!(
            hud,
            vec![HudEvent::PlayerHealth {
                current: 90.0,
                max: 100.0
            }]
        );
        let shakes: Vec<_> = read_all::<CameraShakeEvent>(&mut world);
        assert_eq!(shakes.len(), 1);
        assert_eq!(shakes[0].intensity, 0.5);
    }

    #[test]
    fn test_category_prefers_player_then_creature() {
        let creature = Creature::critter(0.4);
        let piece = SceneryPiece::solid(Vec3::ONE);
        assert_eq!(TargetCategory::of(Some(&piece), Some(&creature), true), Some(TargetCategory::Player));
        assert_eq!(
            TargetCategory::of(Some(&piece), Some(&creature), false),
            Some(TargetCategory::Creature(CreatureKind::Critter))
        );
        assert_eq!(TargetCategory::of(None, None, false), None);
    }
}
