use crate::error::StepError;
use crate::query::{QueryTemplate, RESOURCE_FILE_PLACEHOLDER};
use oxrdf::NamedNode;
use std::path::Path;
use tracing::warn;

/// The validated parameters of one step invocation.
#[derive(Debug, Clone)]
pub struct StepParameters {
    project: String,
    resource: String,
    query: QueryTemplate,
    graph: NamedNode,
    replace: bool,
    dataset: Option<String>,
}

impl StepParameters {
    /// Validates the step parameters.
    ///
    /// The graph is written with `replace` disabled and no output dataset unless
    /// [`with_replace`](Self::with_replace) and [`with_dataset`](Self::with_dataset) say otherwise.
    pub fn new(
        project: impl Into<String>,
        resource: impl Into<String>,
        query: impl Into<QueryTemplate>,
        graph: &str,
    ) -> Result<Self, StepError> {
        let project = project.into();
        if project.trim().is_empty() {
            return Err(StepError::InvalidParameter(
                "The project must not be empty".to_owned(),
            ));
        }
        let resource = resource.into();
        if Path::new(&resource).file_name().is_none() {
            return Err(StepError::InvalidParameter(format!(
                "The resource '{resource}' does not name a file"
            )));
        }
        let query = query.into();
        if query.is_blank() {
            return Err(StepError::InvalidParameter(
                "The query must not be empty".to_owned(),
            ));
        }
        if !query.references_resource() {
            warn!(
                "The query does not reference {RESOURCE_FILE_PLACEHOLDER}, the resource {resource} will not be read"
            );
        }
        let graph = NamedNode::new(graph).map_err(|source| StepError::InvalidGraph {
            iri: graph.to_owned(),
            source,
        })?;
        Ok(Self {
            project,
            resource,
            query,
            graph,
            replace: false,
            dataset: None,
        })
    }

    /// Clears the graph before the new triples are written.
    #[must_use]
    pub fn with_replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    /// Registers the graph as a dataset of the project once it is written.
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Result<Self, StepError> {
        let dataset = dataset.into();
        if dataset.trim().is_empty() {
            return Err(StepError::InvalidParameter(
                "The dataset name must not be empty".to_owned(),
            ));
        }
        self.dataset = Some(dataset);
        Ok(self)
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn query(&self) -> &QueryTemplate {
        &self.query
    }

    pub fn graph(&self) -> &NamedNode {
        &self.graph
    }

    pub fn replace(&self) -> bool {
        self.replace
    }

    pub fn dataset(&self) -> Option<&str> {
        self.dataset.as_deref()
    }
}
