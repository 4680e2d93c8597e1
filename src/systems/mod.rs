//! Systems module - all ECS systems for the combat simulation.

pub mod accuracy;
pub mod collision;
pub mod creature;
pub mod critter;
pub mod damage;
pub mod debug;
pub mod explosion;
pub mod fire_control;
pub mod kinematics;
