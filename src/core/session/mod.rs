// Session module - Session management
pub mod manager;
pub mod registry;
pub mod session;
pub mod state;

pub use manager::SessionManager;
pub use registry::{HandlerRegistry, SessionHandler};
pub use session::Session;
pub use state::ConnectionState;
