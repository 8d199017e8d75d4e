// Infrastructure layer - External dependencies and adapters
pub mod chart_store;
pub mod config;
pub mod session_store;
