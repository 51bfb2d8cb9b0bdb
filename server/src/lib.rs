//! HTTP transport for the MotionGen generation engine.

pub mod routes;

pub use routes::router;
