pub mod directory;
pub mod events;
pub mod identity;
pub mod session_hub;
pub mod sessions;
pub mod tasks;
