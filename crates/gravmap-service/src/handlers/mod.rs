//! Request handlers.

pub mod earthquakes;
pub mod gravity;
pub mod health;
pub mod users;
