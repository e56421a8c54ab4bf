//! Domain layer for the Progression context.

pub mod definitions;
pub mod engine;
pub mod events;
pub mod materials;
pub mod model;
pub mod scaling;
