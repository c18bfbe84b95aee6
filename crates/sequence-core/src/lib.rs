pub mod config;
pub mod db;
pub mod error;
pub mod sequence;
pub mod step;
pub mod types;
pub mod validate;

pub use db::Db;
pub use error::{Result, SequenceError};
pub use sequence::SequenceRegistry;
pub use step::StepRegistry;
