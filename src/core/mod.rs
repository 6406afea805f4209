pub mod context;
pub mod discovery;
pub mod district;
pub mod enrichment;
pub mod etl;
pub mod http;
pub mod pipeline;
pub mod rate_limiter;
pub mod report;

pub use crate::domain::model::{ContractDetail, ReportRow};
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
