//! The data integration platform a step reads resources from and writes graphs to.

use crate::error::PlatformError;
use oxrdf::NamedNodeRef;
use std::path::Path;

pub mod http;
pub mod memory;

/// Operations a step needs from the platform.
#[async_trait::async_trait]
pub trait Platform: Send + Sync {
    /// Copies the content of a project resource into `target`.
    ///
    /// Fails with [`PlatformError::ResourceNotFound`] if the project has no such resource.
    async fn read_resource(
        &self,
        project: &str,
        resource: &str,
        target: &Path,
    ) -> Result<(), PlatformError>;

    /// Removes every triple of `graph`. Clearing a graph that does not exist is a no-op.
    async fn clear_graph(&self, graph: NamedNodeRef<'_>) -> Result<(), PlatformError>;

    /// Adds the triples of the N-Triples file `ntriples` to `graph`.
    async fn write_graph(
        &self,
        graph: NamedNodeRef<'_>,
        ntriples: &Path,
    ) -> Result<(), PlatformError>;

    /// Creates or replaces a knowledge graph dataset in `project` backed by `graph`.
    async fn upsert_dataset(
        &self,
        project: &str,
        dataset: &str,
        graph: NamedNodeRef<'_>,
    ) -> Result<(), PlatformError>;
}
