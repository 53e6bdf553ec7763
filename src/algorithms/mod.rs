mod builder;
mod repair;

pub use builder::{RepairDriverBuilder, RepairDriverBuilderError};
pub use repair::{GeneticRepairDriver, IterationData};
