pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{LocalStorage, ScraperConfig};

pub use crate::core::{etl::EtlEngine, pipeline::CrawlPipeline};
pub use utils::error::{EtlError, Result};
