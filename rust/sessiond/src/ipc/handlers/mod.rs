pub mod core;
pub mod roster;
pub mod session;
pub mod setup;
