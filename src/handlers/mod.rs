pub mod dir_handlers;
pub mod file_handlers;
pub mod health_handlers;
