//! HTTP front end of the mindmap service.

pub mod api;
pub mod pipeline;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
