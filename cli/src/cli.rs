use anyhow::Context;
use clap::{Parser, Subcommand, ValueHint};
use sparql_anything_step::engine::EngineConfig;
use sparql_anything_step::platform::http::PlatformConfig;
use sparql_anything_step::query::QueryTemplate;
use std::path::PathBuf;
use url::Url;

#[derive(Parser)]
#[command(about, version, name = "sparql-anything-step")]
/// Runs sparql-anything queries over platform resources and loads the triples into a named graph
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a step: fetch the resource, query it and write the triples to the graph
    Run {
        /// Identifier of the project owning the resource
        #[arg(short, long)]
        project: String,
        /// Name of the project resource to query
        #[arg(short, long)]
        resource: String,
        /// IRI of the graph the triples are written to
        #[arg(short, long, value_hint = ValueHint::Url)]
        graph: String,
        /// Clear the graph before the triples are written
        #[arg(long)]
        replace: bool,
        /// Register the graph as a knowledge graph dataset with this name in the project
        #[arg(long)]
        dataset: Option<String>,
        #[command(flatten)]
        query: QueryArgs,
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        platform: PlatformArgs,
    },
    /// Run a query over a local file and write the triples as N-Triples
    Query {
        /// The file the query reads through the {{resource_file}} placeholder
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// File to write the triples to
        ///
        /// If no file is given, stdout is written.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
        #[command(flatten)]
        query: QueryArgs,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Print the query used when none is given
    DefaultQuery,
    /// Print the security policy granted to the engine for the given files
    Policy {
        /// The resource file the engine may read
        #[arg(long, value_hint = ValueHint::FilePath)]
        resource_file: PathBuf,
        /// The query file the engine may read
        #[arg(long, value_hint = ValueHint::FilePath)]
        query_file: PathBuf,
    },
}

#[derive(clap::Args)]
pub struct QueryArgs {
    /// The query, use {{resource_file}} to reference the resource
    ///
    /// By default the query lifting the whole resource is used.
    #[arg(short, long, conflicts_with = "query_file")]
    query: Option<String>,
    /// File containing the query
    #[arg(long, value_hint = ValueHint::FilePath)]
    query_file: Option<PathBuf>,
}

impl QueryArgs {
    pub fn load(self) -> anyhow::Result<QueryTemplate> {
        if let Some(query) = self.query {
            return Ok(QueryTemplate::new(query));
        }
        if let Some(file) = self.query_file {
            let query = std::fs::read_to_string(&file)
                .with_context(|| format!("Unable to read the query from {}", file.display()))?;
            return Ok(QueryTemplate::new(query));
        }
        Ok(QueryTemplate::default())
    }
}

#[derive(clap::Args)]
pub struct EngineArgs {
    /// The sparql-anything CLI jar
    #[arg(long, env = "SPARQL_ANYTHING_JAR", value_hint = ValueHint::FilePath)]
    jar: PathBuf,
    /// The Java executable running the jar
    #[arg(long, env = "SPARQL_ANYTHING_JAVA", default_value = "java", value_hint = ValueHint::CommandName)]
    java: PathBuf,
    /// Extra argument for the JVM, e.g. -Xmx2g
    #[arg(long = "jvm-arg", allow_hyphen_values = true)]
    jvm_args: Vec<String>,
    /// Run the JVM without a security manager
    ///
    /// Required on Java versions that no longer support the security manager.
    #[arg(long)]
    no_sandbox: bool,
}

impl EngineArgs {
    pub fn config(self) -> EngineConfig {
        EngineConfig::new(self.jar)
            .with_java(self.java)
            .with_jvm_args(self.jvm_args)
            .with_sandbox(!self.no_sandbox)
    }
}

#[derive(clap::Args)]
pub struct PlatformArgs {
    /// Base URI of the platform deployment
    #[arg(long, env = "CMEM_BASE_URI", value_hint = ValueHint::Url)]
    base_uri: String,
    /// DataIntegration API root, defaults to {base-uri}/dataintegration
    #[arg(long, env = "DI_API_ENDPOINT", value_hint = ValueHint::Url)]
    di_endpoint: Option<Url>,
    /// DataPlatform API root, defaults to {base-uri}/dataplatform
    #[arg(long, env = "DP_API_ENDPOINT", value_hint = ValueHint::Url)]
    dp_endpoint: Option<Url>,
    /// SPARQL endpoint the graph is written through
    #[arg(long, default_value = "default")]
    endpoint_id: String,
    /// Bearer token for the platform APIs
    #[arg(long, env = "OAUTH_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

impl PlatformArgs {
    pub fn config(self) -> anyhow::Result<PlatformConfig> {
        let mut config = PlatformConfig::new(&self.base_uri)
            .with_context(|| format!("Invalid base URI {}", self.base_uri))?
            .with_endpoint_id(self.endpoint_id);
        if let Some(url) = self.di_endpoint {
            config = config.with_dataintegration(url);
        }
        if let Some(url) = self.dp_endpoint {
            config = config.with_dataplatform(url);
        }
        if let Some(token) = self.token {
            config = config.with_access_token(token);
        }
        Ok(config)
    }
}
