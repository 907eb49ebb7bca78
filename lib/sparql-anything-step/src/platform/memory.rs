use crate::error::PlatformError;
use crate::platform::Platform;
use oxrdf::{Graph, NamedNode, NamedNodeRef, Triple};
use oxttl::NTriplesParser;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A platform call, as recorded by [`MemoryPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ReadResource { project: String, resource: String },
    ClearGraph(NamedNode),
    WriteGraph(NamedNode),
    UpsertDataset { project: String, dataset: String },
}

#[derive(Default)]
struct State {
    resources: HashMap<(String, String), Vec<u8>>,
    graphs: HashMap<NamedNode, Graph>,
    datasets: HashMap<(String, String), NamedNode>,
    operations: Vec<Operation>,
}

/// A platform that keeps resources, graphs and datasets in memory.
#[derive(Default)]
pub struct MemoryPlatform {
    state: Mutex<State>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_resource(&self, project: &str, resource: &str, content: impl Into<Vec<u8>>) {
        self.state()
            .resources
            .insert((project.to_owned(), resource.to_owned()), content.into());
    }

    pub fn insert_triples(&self, graph: NamedNodeRef<'_>, triples: impl IntoIterator<Item = Triple>) {
        let mut state = self.state();
        let target = state.graphs.entry(graph.into_owned()).or_default();
        for triple in triples {
            target.insert(&triple);
        }
    }

    /// A copy of `graph`, `None` if nothing was ever written to it.
    pub fn graph(&self, graph: NamedNodeRef<'_>) -> Option<Graph> {
        self.state().graphs.get(&graph.into_owned()).cloned()
    }

    /// The number of triples in `graph`.
    pub fn triple_count(&self, graph: NamedNodeRef<'_>) -> usize {
        self.state()
            .graphs
            .get(&graph.into_owned())
            .map_or(0, Graph::len)
    }

    /// The graph backing a dataset.
    pub fn dataset(&self, project: &str, dataset: &str) -> Option<NamedNode> {
        self.state()
            .datasets
            .get(&(project.to_owned(), dataset.to_owned()))
            .cloned()
    }

    /// Every call made so far, oldest first.
    pub fn operations(&self) -> Vec<Operation> {
        self.state().operations.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl Platform for MemoryPlatform {
    async fn read_resource(
        &self,
        project: &str,
        resource: &str,
        target: &Path,
    ) -> Result<(), PlatformError> {
        let content = {
            let mut state = self.state();
            state.operations.push(Operation::ReadResource {
                project: project.to_owned(),
                resource: resource.to_owned(),
            });
            state
                .resources
                .get(&(project.to_owned(), resource.to_owned()))
                .cloned()
        };
        let content = content.ok_or_else(|| PlatformError::ResourceNotFound {
            project: project.to_owned(),
            resource: resource.to_owned(),
        })?;
        tokio::fs::write(target, content).await?;
        Ok(())
    }

    async fn clear_graph(&self, graph: NamedNodeRef<'_>) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.operations.push(Operation::ClearGraph(graph.into_owned()));
        if let Some(graph) = state.graphs.get_mut(&graph.into_owned()) {
            graph.clear();
        }
        Ok(())
    }

    async fn write_graph(
        &self,
        graph: NamedNodeRef<'_>,
        ntriples: &Path,
    ) -> Result<(), PlatformError> {
        let content = tokio::fs::read(ntriples).await?;
        let triples = NTriplesParser::new()
            .for_reader(content.as_slice())
            .collect::<Result<Vec<_>, _>>()?;
        let mut state = self.state();
        state.operations.push(Operation::WriteGraph(graph.into_owned()));
        let target = state.graphs.entry(graph.into_owned()).or_default();
        for triple in &triples {
            target.insert(triple);
        }
        Ok(())
    }

    async fn upsert_dataset(
        &self,
        project: &str,
        dataset: &str,
        graph: NamedNodeRef<'_>,
    ) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.operations.push(Operation::UpsertDataset {
            project: project.to_owned(),
            dataset: dataset.to_owned(),
        });
        state
            .datasets
            .insert((project.to_owned(), dataset.to_owned()), graph.into_owned());
        Ok(())
    }
}
