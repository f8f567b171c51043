pub mod directory;
pub mod events;
pub mod models;
pub mod tasks;
