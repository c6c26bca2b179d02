pub mod categorizer;
pub mod classifier;
pub mod filter;
pub mod fuse;
pub mod index;
pub mod model;
pub mod preview;
pub mod store;
pub mod taxonomy;
pub mod tokenizer;

pub use filter::SearchFilters;
pub use fuse::{reciprocal_rank_fusion, FusedHit};
pub use index::{InvertedIndex, LexicalHit};
pub use model::{doc_id_for_path, CorpusStats, DocumentRecord, FilterOptions, SearchResult};
pub use store::{DocumentStore, SledStore};
