use oxrdf::IriParseError;
use oxttl::TurtleParseError;
use reqwest::StatusCode;
use std::io;
use std::path::PathBuf;

/// An error raised while running a sparql-anything step.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StepError {
    /// A step parameter is missing or malformed.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// The target graph is not a valid IRI.
    #[error("The graph name {iri} is not a valid IRI")]
    InvalidGraph {
        iri: String,
        #[source]
        source: IriParseError,
    },
    /// The engine rejected the query or its configuration.
    ///
    /// This is something the user can fix by changing the query.
    #[error("sparql-anything rejected the query:\n{diagnostics}")]
    Query { diagnostics: String },
    /// The engine process failed for any other reason.
    #[error("sparql-anything failed ({}):\n{diagnostics}", describe_exit(.exit_code))]
    Execution {
        exit_code: Option<i32>,
        diagnostics: String,
    },
    /// The engine process could not be started.
    #[error("Unable to start {}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The engine produced output that is not valid N-Triples.
    #[error("The engine output is not valid N-Triples")]
    Output(#[source] TurtleParseError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl StepError {
    /// Whether the error is caused by the step configuration rather than the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter(_) | Self::InvalidGraph { .. } | Self::Query { .. }
        )
    }
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_owned(),
    }
}

/// An error returned by a [`Platform`](crate::platform::Platform) implementation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PlatformError {
    #[error("The resource {resource} does not exist in project {project}")]
    ResourceNotFound { project: String, resource: String },
    #[error("The API root {0} cannot carry a path")]
    InvalidApiRoot(String),
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parse(#[from] TurtleParseError),
}
