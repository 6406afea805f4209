pub mod cli;
pub mod toml_config;

pub use cli::LocalStorage;
pub use toml_config::ScraperConfig;
