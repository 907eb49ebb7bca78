#![allow(clippy::panic_in_result_fn)]

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::Router;
use oxrdf::NamedNodeRef;
use sparql_anything_step::error::PlatformError;
use sparql_anything_step::platform::http::{HttpPlatform, PlatformConfig};
use sparql_anything_step::platform::Platform;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

const GRAPH: NamedNodeRef<'static> = NamedNodeRef::new_unchecked("https://example.org/graph/");
const TOKEN: &str = "secret-token";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Request {
    method: &'static str,
    path: String,
    query: HashMap<String, String>,
    content_type: Option<String>,
    authorization: Option<String>,
    body: String,
}

type Requests = Arc<Mutex<Vec<Request>>>;

fn record(
    requests: &Requests,
    method: &'static str,
    path: String,
    query: HashMap<String, String>,
    headers: &HeaderMap,
    body: &Bytes,
) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned)
    };
    let request = Request {
        method,
        path,
        query,
        content_type: header("content-type"),
        authorization: header("authorization"),
        body: String::from_utf8_lossy(body).into_owned(),
    };
    requests
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .push(request);
}

async fn files(
    State(requests): State<Requests>,
    Path(project): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<&'static str, StatusCode> {
    let path = format!("/dataintegration/workspace/projects/{project}/files");
    let resource = query.get("path").cloned().unwrap_or_default();
    record(&requests, "GET", path, query, &headers, &Bytes::new());
    match (project.as_str(), resource.as_str()) {
        ("project", "people.csv") => Ok("name,age\nAlice,42\n"),
        ("project", "locked.csv") => Err(StatusCode::FORBIDDEN),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn graph_delete(
    State(requests): State<Requests>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> StatusCode {
    let missing = query.get("graph").map(String::as_str) == Some("https://example.org/missing");
    record(
        &requests,
        "DELETE",
        "/dataplatform/proxy/default/graph".to_owned(),
        query,
        &headers,
        &Bytes::new(),
    );
    if missing {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn graph_post(
    State(requests): State<Requests>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let status = if body.starts_with(b"<") {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::BAD_REQUEST
    };
    record(
        &requests,
        "POST",
        "/dataplatform/proxy/default/graph".to_owned(),
        query,
        &headers,
        &body,
    );
    status
}

async fn dataset_put(
    State(requests): State<Requests>,
    Path((project, dataset)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let path = format!("/dataintegration/workspace/projects/{project}/datasets/{dataset}");
    record(&requests, "PUT", path, HashMap::new(), &headers, &body);
    StatusCode::NO_CONTENT
}

async fn mock_platform() -> Result<(PlatformConfig, Requests), Box<dyn Error>> {
    let requests = Requests::default();
    let app = Router::new()
        .route(
            "/dataintegration/workspace/projects/{project}/files",
            get(files),
        )
        .route(
            "/dataintegration/workspace/projects/{project}/datasets/{dataset}",
            put(dataset_put),
        )
        .route(
            "/dataplatform/proxy/default/graph",
            axum::routing::delete(graph_delete).post(graph_post),
        )
        .with_state(Arc::clone(&requests));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    tokio::spawn(async move { axum::serve(listener, app).await });

    let config = PlatformConfig::new(&format!("http://{address}"))?.with_access_token(TOKEN);
    Ok((config, requests))
}

fn recorded(requests: &Requests) -> Vec<Request> {
    requests
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone()
}

#[tokio::test]
async fn read_resource_downloads_the_file() -> Result<(), Box<dyn Error>> {
    let (config, requests) = mock_platform().await?;
    let platform = HttpPlatform::new(config)?;
    let target = tempfile::NamedTempFile::new()?;

    platform
        .read_resource("project", "people.csv", target.path())
        .await?;

    assert_eq!(std::fs::read_to_string(target.path())?, "name,age\nAlice,42\n");
    let requests = recorded(&requests);
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Bearer secret-token")
    );
    Ok(())
}

#[tokio::test]
async fn read_missing_resource() -> Result<(), Box<dyn Error>> {
    let (config, _) = mock_platform().await?;
    let platform = HttpPlatform::new(config)?;
    let target = tempfile::NamedTempFile::new()?;

    let result = platform
        .read_resource("project", "missing.csv", target.path())
        .await;

    assert!(matches!(
        result,
        Err(PlatformError::ResourceNotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn forbidden_resource_reports_the_status() -> Result<(), Box<dyn Error>> {
    let (config, _) = mock_platform().await?;
    let platform = HttpPlatform::new(config)?;
    let target = tempfile::NamedTempFile::new()?;

    let result = platform
        .read_resource("project", "locked.csv", target.path())
        .await;

    match result {
        Err(PlatformError::Status {
            method, status, url, ..
        }) => {
            assert_eq!(method, "GET");
            assert_eq!(status, StatusCode::FORBIDDEN);
            assert!(url.ends_with("files?path=locked.csv"), "{url}");
        }
        other => panic!("unexpected result {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn write_graph_posts_ntriples() -> Result<(), Box<dyn Error>> {
    let (config, requests) = mock_platform().await?;
    let platform = HttpPlatform::new(config)?;
    let file = tempfile::NamedTempFile::new()?;
    let data = "<http://example.com/s> <http://example.com/p> \"o\" .\n";
    std::fs::write(file.path(), data)?;

    platform.clear_graph(GRAPH).await?;
    platform.write_graph(GRAPH, file.path()).await?;

    let requests = recorded(&requests);
    assert_eq!(
        requests
            .iter()
            .map(|request| request.method)
            .collect::<Vec<_>>(),
        vec!["DELETE", "POST"]
    );
    let post = &requests[1];
    assert_eq!(
        post.query.get("graph").map(String::as_str),
        Some(GRAPH.as_str())
    );
    assert_eq!(post.content_type.as_deref(), Some("application/n-triples"));
    assert_eq!(post.body, data);
    Ok(())
}

#[tokio::test]
async fn clearing_a_missing_graph_succeeds() -> Result<(), Box<dyn Error>> {
    let (config, _) = mock_platform().await?;
    let platform = HttpPlatform::new(config)?;

    platform
        .clear_graph(NamedNodeRef::new("https://example.org/missing")?)
        .await?;
    Ok(())
}

#[tokio::test]
async fn rejected_write_reports_the_status() -> Result<(), Box<dyn Error>> {
    let (config, _) = mock_platform().await?;
    let platform = HttpPlatform::new(config)?;
    let file = tempfile::NamedTempFile::new()?;
    std::fs::write(file.path(), "not n-triples")?;

    let result = platform.write_graph(GRAPH, file.path()).await;

    match result {
        Err(PlatformError::Status { method, status, .. }) => {
            assert_eq!(method, "POST");
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
        other => panic!("unexpected result {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn upsert_dataset_puts_a_knowledge_graph_dataset() -> Result<(), Box<dyn Error>> {
    let (config, requests) = mock_platform().await?;
    let platform = HttpPlatform::new(config)?;

    platform
        .upsert_dataset("project", "people_graph", GRAPH)
        .await?;

    let requests = recorded(&requests);
    let put = &requests[0];
    assert_eq!(
        put.path,
        "/dataintegration/workspace/projects/project/datasets/people_graph"
    );
    assert_eq!(put.content_type.as_deref(), Some("application/json"));
    let body: serde_json::Value = serde_json::from_str(&put.body)?;
    assert_eq!(body["data"]["type"], "eccencaDataPlatform");
    assert_eq!(body["data"]["parameters"]["graph"], GRAPH.as_str());
    Ok(())
}
