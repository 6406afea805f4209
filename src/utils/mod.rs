pub mod error;
pub mod logger;
pub mod parse;
pub mod text;
pub mod validation;
