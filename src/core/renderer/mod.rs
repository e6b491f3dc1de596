pub mod api;
pub mod backend;
pub mod factory;
pub mod native;
