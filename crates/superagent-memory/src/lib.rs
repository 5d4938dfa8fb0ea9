//! Three-tier adaptive memory (spec §4.5): a bounded working-tier ring, a
//! persistent vector-indexed episodic tier, a write-through procedural
//! store, periodic compression of the pending buffer into episodic
//! summaries, and hybrid dense+sparse+temporal retrieval.

pub mod compression;
pub mod episodic;
pub mod error;
pub mod procedural;
pub mod retrieval;
pub mod store;
pub mod vector_store;
pub mod working;

pub use compression::{compress, Summary};
pub use episodic::EpisodicTier;
pub use error::MemoryError;
pub use procedural::ProceduralStore;
pub use retrieval::{retrieve_relevant_context, RetrievedContext, DEFAULT_TEMPORAL_WEIGHT};
pub use store::{AdaptiveMemory, MemoryConfig, DEFAULT_COMPRESSION_THRESHOLD};
pub use vector_store::{Embedder, HashingEmbedder, InMemoryVectorStore, VectorStore};
pub use working::WorkingTier;
