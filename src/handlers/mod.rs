pub mod health;
pub mod interfaces;

pub use health::health;
pub use interfaces::{AppState, handle_interfaces};
