mod resolver;
mod types;

pub use resolver::TableResolver;
pub use types::{IndexDescriptor, TableDescriptor, DEFAULT_PARTITION_KEY};
