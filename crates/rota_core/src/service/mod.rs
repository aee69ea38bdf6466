//! Use-case services orchestrating the engine over the repositories.

pub mod roster_service;
pub mod rotation_service;
