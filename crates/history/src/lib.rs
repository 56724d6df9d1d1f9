pub mod amount;
pub mod assembler;
pub mod classifier;
pub mod day_bucketer;
pub mod enrichment;
pub mod error;
pub mod imitation;
pub mod metrics;

pub use assembler::{HistoryAssembler, HistoryQuery};
pub use error::HistoryError;
