// Core module - Session management and the event bridge
pub mod communication;
pub mod session;
