pub mod config;
pub mod logging;
pub mod page;
pub mod render;
pub mod status;
pub mod timeline;
pub mod version;
pub mod web;
