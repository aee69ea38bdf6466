//! Domain models shared by the engine, repositories and services.

pub mod chore;
pub mod participant;
pub mod rota;
