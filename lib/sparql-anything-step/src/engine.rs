use crate::error::StepError;
use crate::staging::Staging;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Substring of the engine's stack traces when it rejects a query or its configuration.
pub const ERROR_MARKER: &str = "io.github.sparqlanything.cli.SPARQLAnything";

/// How the engine process is started.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The Java executable.
    pub java: PathBuf,
    /// The sparql-anything CLI jar.
    pub jar: PathBuf,
    /// Extra JVM arguments passed before `-jar`, e.g. `-Xmx2g`.
    pub jvm_args: Vec<String>,
    /// Whether the JVM runs under a security manager with the staged policy.
    pub sandbox: bool,
}

impl EngineConfig {
    pub fn new(jar: impl Into<PathBuf>) -> Self {
        Self {
            java: PathBuf::from("java"),
            jar: jar.into(),
            jvm_args: Vec::new(),
            sandbox: true,
        }
    }

    #[must_use]
    pub fn with_java(mut self, java: impl Into<PathBuf>) -> Self {
        self.java = java.into();
        self
    }

    #[must_use]
    pub fn with_jvm_args(mut self, jvm_args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.jvm_args = jvm_args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }
}

/// The outcome of an engine run.
///
/// The triples are in the `output` file, which lives as long as the [`Staging`] the engine ran in.
#[derive(Debug)]
pub struct ExecutionResult {
    pub exit_code: Option<i32>,
    pub output: PathBuf,
    pub diagnostics: String,
}

impl ExecutionResult {
    /// Fails if the process exited abnormally or reported a query error.
    pub fn check(&self) -> Result<(), StepError> {
        classify(self.exit_code, &self.diagnostics)
    }
}

/// Classifies the exit of an engine process.
///
/// The engine reports some query errors with a successful exit code, so the error marker is
/// checked first.
pub fn classify(exit_code: Option<i32>, stderr: &str) -> Result<(), StepError> {
    if stderr.contains(ERROR_MARKER) {
        return Err(StepError::Query {
            diagnostics: stderr.trim().to_owned(),
        });
    }
    match exit_code {
        Some(0) => Ok(()),
        exit_code => Err(StepError::Execution {
            exit_code,
            diagnostics: stderr.trim().to_owned(),
        }),
    }
}

/// Runs the sparql-anything CLI.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The arguments for a run over `staging`, without the Java executable.
    pub fn arguments(&self, staging: &Staging) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.config.jvm_args.iter().map(OsString::from).collect();
        if self.config.sandbox {
            args.push("-Djava.security.manager".into());
            let mut policy = OsString::from("-Djava.security.policy=");
            policy.push(staging.policy_file());
            args.push(policy);
        }
        args.push("-jar".into());
        args.push(self.config.jar.clone().into());
        args.push("-q".into());
        args.push(staging.query_file().into());
        args.push("-f".into());
        args.push("NT".into());
        args
    }

    /// Runs the query staged in `staging` and waits for the process to exit.
    ///
    /// Standard output goes straight to the staging output file, standard error is captured.
    pub async fn run(&self, staging: &Staging) -> Result<ExecutionResult, StepError> {
        let output = staging.output_file();
        let stdout = tokio::fs::File::create(&output).await?.into_std().await;
        let args = self.arguments(staging);
        debug!("Running {} {:?}", self.config.java.display(), args);

        let child = Command::new(&self.config.java)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| StepError::Spawn {
                program: self.config.java.clone(),
                source,
            })?;
        let finished = child.wait_with_output().await?;

        let diagnostics = String::from_utf8_lossy(&finished.stderr).into_owned();
        let exit_code = finished.status.code();
        if exit_code == Some(0) {
            info!("sparql-anything finished");
        } else {
            warn!("sparql-anything exited with {}", finished.status);
        }
        Ok(ExecutionResult {
            exit_code,
            output,
            diagnostics,
        })
    }
}
