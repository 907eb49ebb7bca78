//! Platform client for eccenca Corporate Memory style deployments.
//!
//! Resources and datasets are served by the DataIntegration API, graphs are written through the
//! SPARQL 1.1 Graph Store HTTP Protocol endpoint of the DataPlatform.

use crate::error::PlatformError;
use crate::platform::Platform;
use oxrdf::NamedNodeRef;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::json;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

const NTRIPLES: &str = "application/n-triples";
const KNOWLEDGE_GRAPH_DATASET: &str = "eccencaDataPlatform";

/// Endpoints and credentials of the platform.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// DataIntegration API root, `{base}/dataintegration` by default.
    pub dataintegration: Url,
    /// DataPlatform API root, `{base}/dataplatform` by default.
    pub dataplatform: Url,
    /// The SPARQL endpoint id used for graph writes.
    pub endpoint_id: String,
    /// Bearer token sent with every request.
    pub access_token: Option<String>,
}

impl PlatformConfig {
    /// Derives both API roots from the base URI of the deployment.
    pub fn new(base_uri: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(base_uri.trim_end_matches('/'))?;
        Ok(Self {
            dataintegration: child_url(&base, "dataintegration")?,
            dataplatform: child_url(&base, "dataplatform")?,
            endpoint_id: "default".to_owned(),
            access_token: None,
        })
    }

    #[must_use]
    pub fn with_dataintegration(mut self, url: Url) -> Self {
        self.dataintegration = url;
        self
    }

    #[must_use]
    pub fn with_dataplatform(mut self, url: Url) -> Self {
        self.dataplatform = url;
        self
    }

    #[must_use]
    pub fn with_endpoint_id(mut self, endpoint_id: impl Into<String>) -> Self {
        self.endpoint_id = endpoint_id.into();
        self
    }

    #[must_use]
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }
}

fn child_url(base: &Url, segment: &str) -> Result<Url, url::ParseError> {
    if base.cannot_be_a_base() {
        return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
    }
    Url::parse(&format!("{}/{segment}", base.as_str().trim_end_matches('/')))
}

/// [`Platform`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPlatform {
    client: Client,
    config: PlatformConfig,
}

impl HttpPlatform {
    /// Fails if one of the API roots cannot carry path segments, e.g. `mailto:` URLs.
    pub fn new(config: PlatformConfig) -> Result<Self, PlatformError> {
        for root in [&config.dataintegration, &config.dataplatform] {
            if root.cannot_be_a_base() {
                return Err(PlatformError::InvalidApiRoot(root.to_string()));
            }
        }
        let client = Client::builder()
            .user_agent(concat!("sparql-anything-step/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    fn api_url(root: &Url, segments: &[&str]) -> Result<Url, PlatformError> {
        let mut url = root.clone();
        url.path_segments_mut()
            .map_err(|()| PlatformError::InvalidApiRoot(root.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn graph_store_url(&self, graph: NamedNodeRef<'_>) -> Result<Url, PlatformError> {
        let mut url = Self::api_url(
            &self.config.dataplatform,
            &["proxy", self.config.endpoint_id.as_str(), "graph"],
        )?;
        url.query_pairs_mut().append_pair("graph", graph.as_str());
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(
        &self,
        method: &'static str,
        url: &Url,
        request: RequestBuilder,
    ) -> Result<Response, PlatformError> {
        debug!("{method} {url}");
        Ok(self.authorized(request).send().await?)
    }
}

/// Turns a non-successful response into a [`PlatformError::Status`].
async fn ensure_success(
    method: &'static str,
    url: &Url,
    response: Response,
) -> Result<Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PlatformError::Status {
        method,
        url: url.to_string(),
        status,
        body,
    })
}

#[async_trait::async_trait]
impl Platform for HttpPlatform {
    async fn read_resource(
        &self,
        project: &str,
        resource: &str,
        target: &Path,
    ) -> Result<(), PlatformError> {
        let mut url = Self::api_url(
            &self.config.dataintegration,
            &["workspace", "projects", project, "files"],
        )?;
        url.query_pairs_mut().append_pair("path", resource);
        let response = self.send("GET", &url, self.client.get(url.clone())).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(PlatformError::ResourceNotFound {
                project: project.to_owned(),
                resource: resource.to_owned(),
            });
        }
        let mut response = ensure_success("GET", &url, response).await?;

        let mut file = tokio::fs::File::create(target).await?;
        let mut size = 0;
        while let Some(chunk) = response.chunk().await? {
            size += chunk.len();
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        debug!("Downloaded {size} bytes of {resource} from project {project}");
        Ok(())
    }

    async fn clear_graph(&self, graph: NamedNodeRef<'_>) -> Result<(), PlatformError> {
        let url = self.graph_store_url(graph)?;
        let response = self
            .send("DELETE", &url, self.client.delete(url.clone()))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Graph {graph} does not exist, nothing to clear");
            return Ok(());
        }
        ensure_success("DELETE", &url, response).await?;
        info!("Cleared graph {graph}");
        Ok(())
    }

    async fn write_graph(
        &self,
        graph: NamedNodeRef<'_>,
        ntriples: &Path,
    ) -> Result<(), PlatformError> {
        let url = self.graph_store_url(graph)?;
        let file = tokio::fs::File::open(ntriples).await?;
        let request = self
            .client
            .post(url.clone())
            .header(reqwest::header::CONTENT_TYPE, NTRIPLES)
            .body(file);
        let response = self.send("POST", &url, request).await?;
        ensure_success("POST", &url, response).await?;
        Ok(())
    }

    async fn upsert_dataset(
        &self,
        project: &str,
        dataset: &str,
        graph: NamedNodeRef<'_>,
    ) -> Result<(), PlatformError> {
        let url = Self::api_url(
            &self.config.dataintegration,
            &["workspace", "projects", project, "datasets", dataset],
        )?;
        let body = json!({
            "id": dataset,
            "metadata": { "label": dataset },
            "data": {
                "type": KNOWLEDGE_GRAPH_DATASET,
                "parameters": { "graph": graph.as_str() }
            }
        });
        let response = self
            .send("PUT", &url, self.client.put(url.clone()).json(&body))
            .await?;
        ensure_success("PUT", &url, response).await?;
        info!("Dataset {dataset} of project {project} now points to {graph}");
        Ok(())
    }
}
