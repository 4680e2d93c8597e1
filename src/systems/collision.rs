//! Projectile collision resolution.
//!
//! Scenery and any other collider are found with an avian ray cast along
//! the segment a projectile covered this tick. Creatures and the player are
//! spheres snapshotted once per tick from read-only queries. Each live
//! projectile is tested in a fixed order (obstacles, creatures, player,
//! ground, out-of-bounds) and resolved by the first match, so it can hit at
//! most one thing per tick. Damage is applied later by the damage systems.

use avian3d::prelude::{Collider, RigidBody, SpatialQuery, SpatialQueryFilter};
use bevy::ecs::entity::EntityHashSet;
use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;

use crate::components::{Creature, Dead, Explosive, Health, Player, Projectile, SceneryPiece};
use crate::events::{ExplosionEvent, ImpactEvent, ProjectileHit, RemoteDetonated};
use crate::resources::CombatConfig;
use crate::systems::explosion::explosion_from;
use crate::types::{Faction, HitTargetKind, ObstacleCaster, ObstacleHit, ProjectileKind};

/// Creature hit sphere in world space.
#[derive(Debug, Clone, Copy)]
pub struct CreatureBounds {
    pub entity: Entity,
    pub center: Vec3,
    pub radius: f32,
}

/// The player's position.
#[derive(Debug, Clone, Copy)]
pub struct PlayerBounds {
    pub entity: Entity,
    pub position: Vec3,
}

/// Read-only view of everything a projectile can hit this tick.
///
/// `scenery` only classifies obstacle hits; the boxes themselves live in
/// the physics world.
#[derive(Debug, Clone, Default)]
pub struct TargetSnapshot {
    pub scenery: EntityHashSet,
    pub creatures: Vec<CreatureBounds>,
    pub player: Option<PlayerBounds>,
}

/// How a projectile was resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collision {
    Scenery(ObstacleHit),
    /// A collider that is not scenery; stops the projectile without damage
    Obstacle(ObstacleHit),
    Creature { entity: Entity, point: Vec3 },
    Player { entity: Entity, point: Vec3 },
    Ground { point: Vec3 },
    /// Travelled past its maximum distance; not a hit
    OutOfBounds { point: Vec3 },
}

impl Collision {
    pub fn point(&self) -> Vec3 {
        match *self {
            Collision::Scenery(hit) | Collision::Obstacle(hit) => hit.point,
            Collision::Creature { point, .. }
            | Collision::Player { point, .. }
            | Collision::Ground { point }
            | Collision::OutOfBounds { point } => point,
        }
    }
}

/// Avian ray cast with the entities that must not stop a projectile
/// filtered out.
pub struct PhysicsCaster<'a, 'w, 's> {
    pub spatial_query: &'a SpatialQuery<'w, 's>,
    pub filter: SpatialQueryFilter,
}

impl ObstacleCaster for PhysicsCaster<'_, '_, '_> {
    fn cast_obstacle(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> Option<ObstacleHit> {
        self.spatial_query
            .cast_ray(origin, direction, max_distance, true, &self.filter)
            .map(|hit| ObstacleHit {
                entity: hit.entity,
                point: origin + *direction * hit.distance,
                normal: hit.normal,
                distance: hit.distance,
            })
    }
}

/// Segment covered by a projectile this tick, as `(origin, direction, length)`.
///
/// `None` when the projectile has not moved.
pub fn travel_ray(projectile: &Projectile, position: Vec3) -> Option<(Vec3, Dir3, f32)> {
    let travel = position - projectile.previous_position;
    let length = travel.length();
    if length < 1e-4 {
        return None;
    }
    let direction = Dir3::new(travel).ok()?;
    Some((projectile.previous_position, direction, length))
}

impl TargetSnapshot {
    /// Resolves one projectile that moved from `previous_position` to `position`.
    pub fn resolve(
        &self,
        projectile: &Projectile,
        position: Vec3,
        obstacles: &impl ObstacleCaster,
        config: &CombatConfig,
    ) -> Option<Collision> {
        if let Some((origin, direction, length)) = travel_ray(projectile, position) {
            if let Some(hit) = obstacles.cast_obstacle(origin, direction, length) {
                return Some(if self.scenery.contains(&hit.entity) {
                    Collision::Scenery(hit)
                } else {
                    Collision::Obstacle(hit)
                });
            }
        }

        match projectile.faction {
            Faction::Player => {
                let hit = self.creatures.iter().find(|creature| {
                    position.distance(creature.center) <= creature.radius + projectile.radius
                });
                if let Some(creature) = hit {
                    return Some(Collision::Creature {
                        entity: creature.entity,
                        point: position,
                    });
                }
            }
            Faction::Hostile => {
                if let Some(player) = self.player {
                    if position.distance(player.position) < config.player_hit_radius + projectile.radius {
                        return Some(Collision::Player {
                            entity: player.entity,
                            point: position,
                        });
                    }
                }
            }
        }

        if position.y <= config.ground_epsilon + projectile.radius {
            return Some(Collision::Ground {
                point: Vec3::new(position.x, 0.0, position.z),
            });
        }

        if projectile.travelled(position) > projectile.max_distance {
            return Some(Collision::OutOfBounds { point: position });
        }

        None
    }
}

/// Gives every new scenery piece a static collider matching its box.
pub fn attach_scenery_colliders(
    mut commands: Commands,
    pieces: Query<(Entity, &SceneryPiece), Without<Collider>>,
) {
    for (entity, piece) in pieces.iter() {
        commands.entity(entity).insert((RigidBody::Static, piece.collider()));
        debug!("Attached {:?} collider to scenery {entity}", piece.half_extents);
    }
}

/// Builds this tick's target snapshot.
pub fn snapshot_targets(
    scenery: &Query<Entity, (With<SceneryPiece>, Without<Projectile>)>,
    creatures: &Query<(Entity, &Transform, &Creature, &Health, Has<Dead>), Without<Projectile>>,
    players: &Query<(Entity, &Transform), (With<Player>, Without<Projectile>)>,
) -> TargetSnapshot {
    TargetSnapshot {
        scenery: scenery.iter().collect(),
        creatures: creatures
            .iter()
            .filter(|(_, _, _, health, dead)| !dead && !health.is_dead())
            .map(|(entity, transform, creature, _, _)| CreatureBounds {
                entity,
                center: creature.center(transform.translation),
                radius: creature.hit_radius(),
            })
            .collect(),
        player: players.iter().next().map(|(entity, transform)| PlayerBounds {
            entity,
            position: transform.translation,
        }),
    }
}

/// Resolves collisions for every live projectile.
///
/// A resolved projectile is marked dead and despawned in the same tick.
/// Bullets report a [`ProjectileHit`] and an [`ImpactEvent`]; projectiles
/// carrying an [`Explosive`] detonate instead. Remote projectiles also
/// report [`RemoteDetonated`] so their weapon releases control. Out of
/// range, only remote projectiles detonate; everything else just expires.
///
/// Creature and player colliders (thrown bodies, a host's character
/// controller) are left out of the ray cast: they are hit as spheres.
#[allow(clippy::too_many_arguments)]
pub fn resolve_projectile_collisions(
    mut commands: Commands,
    config: Res<CombatConfig>,
    spatial_query: SpatialQuery,
    mut projectiles: Query<(Entity, &Transform, &mut Projectile, Option<&Explosive>)>,
    scenery: Query<Entity, (With<SceneryPiece>, Without<Projectile>)>,
    creatures: Query<(Entity, &Transform, &Creature, &Health, Has<Dead>), Without<Projectile>>,
    players: Query<(Entity, &Transform), (With<Player>, Without<Projectile>)>,
    mut hits: MessageWriter<ProjectileHit>,
    mut impacts: MessageWriter<ImpactEvent>,
    mut explosions: MessageWriter<ExplosionEvent>,
    mut detonations: MessageWriter<RemoteDetonated>,
) {
    let snapshot = snapshot_targets(&scenery, &creatures, &players);
    let caster = PhysicsCaster {
        spatial_query: &spatial_query,
        filter: SpatialQueryFilter::default().with_excluded_entities(
            creatures
                .iter()
                .map(|(entity, ..)| entity)
                .chain(players.iter().map(|(entity, _)| entity)),
        ),
    };

    for (entity, transform, mut projectile, explosive) in projectiles.iter_mut() {
        if !projectile.alive {
            continue;
        }

        let Some(collision) = snapshot.resolve(&projectile, transform.translation, &caster, &config) else {
            continue;
        };

        projectile.alive = false;
        commands.entity(entity).despawn();

        let point = collision.point();
        let is_remote = projectile.kind == ProjectileKind::Remote;
        let out_of_bounds = matches!(collision, Collision::OutOfBounds { .. });
        debug!("Projectile {entity} resolved: {collision:?}");

        if is_remote {
            detonations.write(RemoteDetonated {
                projectile: entity,
                weapon: projectile.owner,
                position: point,
            });
        }

        if let Some(explosive) = explosive {
            if is_remote || !out_of_bounds {
                explosions.write(explosion_from(entity, &projectile, explosive, point));
            }
            continue;
        }
        if is_remote {
            continue;
        }

        let target = match collision {
            Collision::Scenery(hit) => Some((hit.entity, HitTargetKind::Scenery, hit.normal)),
            Collision::Creature { entity, .. } => Some((entity, HitTargetKind::Creature, -projectile.direction)),
            Collision::Player { entity, .. } => Some((entity, HitTargetKind::Player, -projectile.direction)),
            Collision::Obstacle(hit) => {
                impacts.write(ImpactEvent {
                    position: point,
                    normal: hit.normal,
                    target: Some(hit.entity),
                });
                None
            }
            Collision::Ground { .. } => {
                impacts.write(ImpactEvent {
                    position: point,
                    normal: Vec3::Y,
                    target: None,
                });
                None
            }
            Collision::OutOfBounds { .. } => None,
        };

        if let Some((target, kind, normal)) = target {
            impacts.write(ImpactEvent {
                position: point,
                normal,
                target: Some(target),
            });
            hits.write(ProjectileHit {
                projectile: entity,
                owner: projectile.owner,
                target,
                kind,
                damage: projectile.damage,
                point,
                normal,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProjectileSpawnParams;

    fn entity(index: u32) -> Entity {
        let mut world = World::new();
        let mut last = world.spawn_empty().id();
        for _ in 0..index {
            last = world.spawn_empty().id();
        }
        last
    }

    /// Walls as planes `x = c`, facing back toward the origin.
    struct Walls(Vec<(Entity, f32)>);

    impl ObstacleCaster for Walls {
        fn cast_obstacle(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> Option<ObstacleHit> {
            self.0
                .iter()
                .filter_map(|&(entity, x)| {
                    let distance = (x - origin.x) / direction.x;
                    (distance >= 0.0 && distance <= max_distance).then(|| ObstacleHit {
                        entity,
                        point: origin + *direction * distance,
                        normal: Vec3::NEG_X,
                        distance,
                    })
                })
                .min_by(|a, b| a.distance.total_cmp(&b.distance))
        }
    }

    fn open_field() -> Walls {
        Walls(Vec::new())
    }

    fn projectile_from(previous: Vec3, direction: Vec3) -> Projectile {
        ProjectileSpawnParams::new(previous, direction, 10.0).to_projectile()
    }

    fn scenery(entities: &[Entity]) -> TargetSnapshot {
        TargetSnapshot {
            scenery: entities.iter().copied().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_travel_ray_skips_resting_projectile() {
        let projectile = projectile_from(Vec3::ONE, Vec3::X);
        assert!(travel_ray(&projectile, Vec3::ONE).is_none());
        let (origin, direction, length) = travel_ray(&projectile, Vec3::new(3.0, 1.0, 1.0)).unwrap();
        assert_eq!(origin, Vec3::ONE);
        assert_eq!(*direction, Vec3::X);
        assert!((length - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_wall_wins() {
        let walls = Walls(vec![(entity(1), 3.5), (entity(2), 1.5)]);
        let snapshot = scenery(&[entity(1), entity(2)]);
        let projectile = projectile_from(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        let collision = snapshot.resolve(&projectile, Vec3::new(5.0, 1.0, 0.0), &walls, &CombatConfig::default());
        match collision {
            Some(Collision::Scenery(hit)) => {
                assert_eq!(hit.entity, entity(2));
                assert!((hit.point.x - 1.5).abs() < 1e-5);
            }
            other => panic!("expected scenery hit, got {other:?}"),
        }
    }

    #[test]
    fn test_wall_out_of_reach_is_ignored() {
        let walls = Walls(vec![(entity(1), 2.0)]);
        let projectile = projectile_from(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        let collision = scenery(&[entity(1)]).resolve(
            &projectile,
            Vec3::new(1.5, 1.0, 0.0),
            &walls,
            &CombatConfig::default(),
        );
        assert_eq!(collision, None);
    }

    #[test]
    fn test_unknown_collider_is_an_obstacle() {
        let walls = Walls(vec![(entity(4), 1.0)]);
        let projectile = projectile_from(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        let collision = TargetSnapshot::default().resolve(
            &projectile,
            Vec3::new(2.0, 1.0, 0.0),
            &walls,
            &CombatConfig::default(),
        );
        assert!(matches!(collision, Some(Collision::Obstacle(hit)) if hit.entity == entity(4)));
    }

    #[test]
    fn test_scenery_takes_priority_over_creature() {
        let walls = Walls(vec![(entity(1), 0.5)]);
        let snapshot = TargetSnapshot {
            creatures: vec![CreatureBounds {
                entity: entity(2),
                center: Vec3::new(2.0, 1.0, 0.0),
                radius: 1.0,
            }],
            ..scenery(&[entity(1)])
        };
        let projectile = projectile_from(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        let collision = snapshot.resolve(&projectile, Vec3::new(2.0, 1.0, 0.0), &walls, &CombatConfig::default());
        assert!(matches!(collision, Some(Collision::Scenery(_))));
    }

    #[test]
    fn test_player_projectile_ignores_player() {
        let snapshot = TargetSnapshot {
            player: Some(PlayerBounds {
                entity: entity(3),
                position: Vec3::new(1.0, 1.6, 0.0),
            }),
            ..Default::default()
        };
        let projectile = projectile_from(Vec3::new(0.0, 1.6, 0.0), Vec3::X);
        assert_eq!(
            snapshot.resolve(&projectile, Vec3::new(1.0, 1.6, 0.0), &open_field(), &CombatConfig::default()),
            None
        );
    }

    #[test]
    fn test_hostile_projectile_hits_player_within_padding() {
        let snapshot = TargetSnapshot {
            creatures: vec![CreatureBounds {
                entity: entity(2),
                center: Vec3::new(1.0, 1.6, 0.0),
                radius: 1.0,
            }],
            player: Some(PlayerBounds {
                entity: entity(3),
                position: Vec3::new(1.0, 1.6, 0.0),
            }),
            ..Default::default()
        };
        let mut projectile = projectile_from(Vec3::new(0.0, 1.6, 0.0), Vec3::X);
        projectile.faction = Faction::Hostile;
        projectile.radius = 0.1;
        let collision = snapshot.resolve(&projectile, Vec3::new(0.45, 1.6, 0.0), &open_field(), &CombatConfig::default());
        assert!(matches!(collision, Some(Collision::Player { .. })));
    }

    #[test]
    fn test_ground_hit() {
        let projectile = projectile_from(Vec3::new(0.0, 0.5, 0.0), Vec3::NEG_Y);
        let collision = TargetSnapshot::default().resolve(
            &projectile,
            Vec3::new(0.0, 0.04, 0.0),
            &open_field(),
            &CombatConfig::default(),
        );
        assert_eq!(
            collision,
            Some(Collision::Ground {
                point: Vec3::ZERO
            })
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let mut projectile = projectile_from(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        projectile.origin = Vec3::new(0.0, 1.0, 0.0);
        projectile.max_distance = 100.0;
        projectile.previous_position = Vec3::new(100.0, 1.0, 0.0);
        let collision = TargetSnapshot::default().resolve(
            &projectile,
            Vec3::new(101.0, 1.0, 0.0),
            &open_field(),
            &CombatConfig::default(),
        );
        assert!(matches!(collision, Some(Collision::OutOfBounds { .. })));
    }
}
