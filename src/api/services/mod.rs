pub mod health;
pub mod redirect;

pub use health::{HealthService, health_routes};
pub use redirect::{RedirectHandler, redirect_routes};
