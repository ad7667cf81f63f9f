pub mod ai;
pub mod ai_creature;
pub mod body;
pub mod combat;
pub mod config;
pub mod creature;
pub mod effect;
pub mod geometry;
pub mod grid;
pub mod manager;
pub mod notification;
pub mod player;
pub mod room;
pub mod server;
pub mod visibility;
