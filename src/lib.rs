pub mod fetch;
pub mod loader;
pub mod marker;
pub mod model;
pub mod output;
pub mod scale;
pub mod server;
pub mod traffic;
