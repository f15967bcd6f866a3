pub mod models;
pub mod repository;
pub mod services;
pub mod store;

pub use models::*;
pub use repository::AppointmentRepository;
