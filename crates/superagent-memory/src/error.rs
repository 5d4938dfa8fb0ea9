/// Error surface for the memory subsystem (spec §7). Most operations here
/// are infallible in-memory arithmetic; this exists for the embedding/
/// vector-store boundary, which a real backend (e.g. a persistent vector
/// database) can fail against.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MemoryError {
    #[error("vector store error: {0}")]
    VectorStore(String),
}
