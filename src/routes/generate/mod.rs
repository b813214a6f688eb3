mod handler;
mod model;

pub use handler::generate;
pub use model::{Counts, GenerateRequest, GenerateResponse, GenerationMeta, SourceInfo, STUB_MODEL};
