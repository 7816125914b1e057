pub mod app_state;
pub mod dtos;
pub mod entities;

// Re-export commonly used types
pub use app_state::AppState;
