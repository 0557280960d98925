pub mod errors;
pub mod filters;
pub mod models;
pub mod params;
pub mod repo;
pub mod scheduler;

pub use errors::*;
pub use filters::*;
pub use models::*;
pub use params::*;
pub use repo::*;
pub use scheduler::*;
