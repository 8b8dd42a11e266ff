pub mod api;
pub mod bootstrap;
pub mod router;
pub mod server;
pub mod state;

pub use bootstrap::{build_provider, build_state, engine_config, open_repository};
pub use router::build_router;
pub use server::GatewayServer;
pub use state::{AppState, SharedState};
