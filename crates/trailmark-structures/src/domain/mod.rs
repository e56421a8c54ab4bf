//! Domain layer for the Structures context.

pub mod events;
pub mod portal;
pub mod registry;
pub mod triangulation;
pub mod village;
