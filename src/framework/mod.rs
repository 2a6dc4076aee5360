pub mod config;
pub use config::AppConfig;

pub mod data;
pub use data::AppData;

pub mod logging;
