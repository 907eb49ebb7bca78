use crate::engine::Engine;
use crate::error::StepError;
use crate::params::StepParameters;
use crate::platform::Platform;
use crate::staging::Staging;
use oxrdf::NamedNode;
use oxttl::NTriplesParser;
use std::path::Path;
use tracing::{debug, info, warn};

/// What a successful invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// The graph the triples were written to.
    pub graph: NamedNode,
    /// The number of triples the engine produced.
    pub triples: usize,
    /// Whether the graph was cleared before the write.
    pub replaced: bool,
    /// The dataset registered for the graph, if any.
    pub dataset: Option<String>,
    /// Whatever the engine printed on stderr, usually logging noise.
    pub diagnostics: String,
}

/// Runs sparql-anything steps against a platform.
pub struct InvocationAdapter<P> {
    platform: P,
    engine: Engine,
}

impl<P: Platform> InvocationAdapter<P> {
    pub fn new(platform: P, engine: Engine) -> Self {
        Self { platform, engine }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Runs one step to completion.
    ///
    /// The target graph is only touched once the engine succeeded and its output parsed, a
    /// failed invocation leaves the graph as it was.
    pub async fn execute(&self, params: &StepParameters) -> Result<ExecutionReport, StepError> {
        let graph = params.graph();
        info!(
            "Running sparql-anything on {} of project {} into {graph}",
            params.resource(),
            params.project()
        );

        let staging = Staging::new(params.resource())?;
        self.platform
            .read_resource(params.project(), params.resource(), staging.resource_file())
            .await?;
        let query = staging.prepare(params.query()).await?;
        debug!("Rendered query:\n{query}");

        let result = self.engine.run(&staging).await?;
        result.check()?;
        if !result.diagnostics.trim().is_empty() {
            debug!("sparql-anything stderr:\n{}", result.diagnostics);
        }
        let triples = count_triples(&result.output).await?;
        if triples == 0 {
            warn!("The query produced no triples");
        }

        if params.replace() {
            self.platform.clear_graph(graph.as_ref()).await?;
        }
        self.platform
            .write_graph(graph.as_ref(), &result.output)
            .await?;
        info!("Wrote {triples} triples to {graph}");

        if let Some(dataset) = params.dataset() {
            self.platform
                .upsert_dataset(params.project(), dataset, graph.as_ref())
                .await?;
        }

        Ok(ExecutionReport {
            graph: graph.clone(),
            triples,
            replaced: params.replace(),
            dataset: params.dataset().map(ToOwned::to_owned),
            diagnostics: result.diagnostics,
        })
    }
}

/// Counts the triples of an N-Triples file, failing on the first syntax error.
pub async fn count_triples(path: &Path) -> Result<usize, StepError> {
    let file = tokio::fs::File::open(path).await?;
    let mut parser = NTriplesParser::new().for_tokio_async_reader(file);
    let mut count = 0;
    while let Some(triple) = parser.next().await {
        triple.map_err(StepError::Output)?;
        count += 1;
    }
    Ok(count)
}
