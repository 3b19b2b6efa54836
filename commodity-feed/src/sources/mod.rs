pub mod registry;

pub use registry::{Source, SourceRegistry};
