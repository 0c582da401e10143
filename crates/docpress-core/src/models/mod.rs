pub mod document;
pub mod outcome;
pub mod profile;
pub mod task;

pub use document::{DocumentFormat, SourceDocument};
pub use outcome::{compression_ratio, CompressionOutcome, ProfileOutcomes};
pub use profile::{ChromaSubsampling, ProfileSettings, QualityProfile};
pub use task::{format_file_size, TaskDescriptor, TaskStatus, VariantReport};
