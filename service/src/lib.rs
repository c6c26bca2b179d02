pub mod bounded;
pub mod engine;
pub mod providers;

pub use engine::{Engine, IngestFailure, IngestReport};
pub use providers::{
    ChangeEvent, EmbeddingProvider, PlainTextExtractor, SemanticIndex, TextExtractor,
};
