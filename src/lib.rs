pub mod cli;
pub mod config;
pub mod pathfinding;
pub mod simulation;
pub mod structures;
pub mod world;
