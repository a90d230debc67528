pub mod handlers;
pub mod icon;
pub mod routes;
pub mod state;

pub use icon::IconUrlFetcher;
pub use routes::create_router;
