#![allow(clippy::print_stdout)]
use crate::cli::{Args, Command};
use anyhow::Context;
use clap::Parser;
use sparql_anything_step::adapter::{count_triples, InvocationAdapter};
use sparql_anything_step::engine::Engine;
use sparql_anything_step::error::StepError;
use sparql_anything_step::params::StepParameters;
use sparql_anything_step::platform::http::HttpPlatform;
use sparql_anything_step::policy::PolicyDocument;
use sparql_anything_step::query::DEFAULT_QUERY;
use sparql_anything_step::staging::Staging;
use tokio::io::AsyncWriteExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

const DEFAULT_LOG_FILTER: &str = "sparql_anything_step=info";

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let matches = Args::parse();
    init_tracing();
    match matches.command {
        Command::Run {
            project,
            resource,
            graph,
            replace,
            dataset,
            query,
            engine,
            platform,
        } => {
            let mut params = StepParameters::new(project, resource, query.load()?, &graph)
                .map_err(step_error)?
                .with_replace(replace);
            if let Some(dataset) = dataset {
                params = params.with_dataset(dataset).map_err(step_error)?;
            }
            let platform = HttpPlatform::new(platform.config()?)
                .context("Unable to set up the platform client")?;
            let adapter = InvocationAdapter::new(platform, Engine::new(engine.config()));
            let report = adapter.execute(&params).await.map_err(step_error)?;
            println!("{} triples written to {}", report.triples, report.graph);
            Ok(())
        }
        Command::Query {
            file,
            output,
            query,
            engine,
        } => {
            let query = query.load()?;
            if query.is_blank() {
                return Err(step_error(StepError::InvalidParameter(
                    "The query must not be empty".to_owned(),
                )));
            }
            let staging = Staging::for_local_file(&file)
                .with_context(|| format!("Unable to use {} as resource", file.display()))?;
            staging.prepare(&query).await?;

            let result = Engine::new(engine.config())
                .run(&staging)
                .await
                .map_err(step_error)?;
            result.check().map_err(step_error)?;
            let triples = count_triples(&result.output).await.map_err(step_error)?;

            if let Some(output) = output {
                tokio::fs::copy(&result.output, &output)
                    .await
                    .with_context(|| format!("Unable to write {}", output.display()))?;
            } else {
                let mut triples_file = tokio::fs::File::open(&result.output).await?;
                let mut stdout = tokio::io::stdout();
                tokio::io::copy(&mut triples_file, &mut stdout).await?;
                stdout.flush().await?;
            }
            info!("The query produced {triples} triples");
            Ok(())
        }
        Command::DefaultQuery => {
            println!("{DEFAULT_QUERY}");
            Ok(())
        }
        Command::Policy {
            resource_file,
            query_file,
        } => {
            let policy = PolicyDocument::new(resource_file, query_file)
                .render()
                .context("Unable to render the policy")?;
            print!("{policy}");
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn step_error(error: StepError) -> anyhow::Error {
    if error.is_user_error() {
        anyhow::Error::new(error).context("The step configuration is invalid")
    } else {
        anyhow::Error::new(error).context("The step failed")
    }
}

#[cfg(test)]
#[allow(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use anyhow::Result;
    use assert_cmd::Command;
    use assert_fs::prelude::*;
    use assert_fs::{NamedTempFile, TempDir};
    use predicates::prelude::*;

    fn cli_command() -> Command {
        let mut command = Command::new(env!("CARGO"));
        command
            .arg("run")
            .arg("--bin")
            .arg("sparql-anything-step");
        command.arg("--");
        command
            .env_remove("CMEM_BASE_URI")
            .env_remove("OAUTH_ACCESS_TOKEN")
            .env_remove("SPARQL_ANYTHING_JAR")
            .env_remove("SPARQL_ANYTHING_JAVA");
        command
    }

    #[test]
    fn cli_help() {
        cli_command()
            .assert()
            .failure()
            .stdout("")
            .stderr(predicate::str::contains("sparql-anything"));
    }

    #[test]
    fn cli_default_query() {
        cli_command()
            .arg("default-query")
            .assert()
            .success()
            .stdout(predicate::str::starts_with(DEFAULT_QUERY));
    }

    #[test]
    fn cli_policy() {
        cli_command()
            .arg("policy")
            .arg("--resource-file")
            .arg("/data/people.csv")
            .arg("--query-file")
            .arg("/data/query.sparql")
            .assert()
            .success()
            .stdout(
                predicate::str::contains(
                    r#"permission java.io.FilePermission "/data/people.csv", "read";"#,
                )
                .and(predicate::str::contains(
                    r#"permission java.io.FilePermission "/data/query.sparql", "read";"#,
                )),
            );
    }

    #[test]
    fn cli_run_rejects_relative_graph() {
        cli_command()
            .arg("run")
            .arg("--project")
            .arg("project")
            .arg("--resource")
            .arg("people.csv")
            .arg("--graph")
            .arg("not an iri")
            .arg("--jar")
            .arg("sparql-anything.jar")
            .arg("--base-uri")
            .arg("http://localhost:9")
            .assert()
            .failure()
            .stderr(predicate::str::contains("The step configuration is invalid"));
    }

    #[test]
    fn cli_run_rejects_two_queries() -> Result<()> {
        let query_file = NamedTempFile::new("query.sparql")?;
        query_file.write_str(DEFAULT_QUERY)?;
        cli_command()
            .arg("run")
            .arg("--project")
            .arg("project")
            .arg("--resource")
            .arg("people.csv")
            .arg("--graph")
            .arg("https://example.org/graph/")
            .arg("--query")
            .arg(DEFAULT_QUERY)
            .arg("--query-file")
            .arg(query_file.path())
            .arg("--jar")
            .arg("sparql-anything.jar")
            .arg("--base-uri")
            .arg("http://localhost:9")
            .assert()
            .failure()
            .stderr(predicate::str::contains("cannot be used with"));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn cli_query_local_file() -> Result<()> {
        let dir = TempDir::new()?;
        let resource = dir.child("people.csv");
        resource.write_str("name\nAlice\n")?;
        let engine = dir.child("engine.sh");
        engine.write_str(
            "#!/bin/sh\n\
             echo '<https://example.org/graph/> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://sparql.xyz/facade-x/ns/root> .'\n",
        )?;
        let output = dir.child("output.nt");
        cli_command()
            .arg("query")
            .arg("--file")
            .arg(resource.path())
            .arg("--output")
            .arg(output.path())
            .arg("--jar")
            .arg("sparql-anything.jar")
            .arg("--java")
            .arg("/bin/sh")
            .arg("--jvm-arg")
            .arg(engine.path())
            .assert()
            .success();
        output.assert(
            "<https://example.org/graph/> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://sparql.xyz/facade-x/ns/root> .\n",
        );
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn cli_query_reports_query_errors() -> Result<()> {
        let dir = TempDir::new()?;
        let resource = dir.child("people.csv");
        resource.write_str("name\nAlice\n")?;
        let engine = dir.child("engine.sh");
        engine.write_str(
            "#!/bin/sh\n\
             echo 'at io.github.sparqlanything.cli.SPARQLAnything.main(SPARQLAnything.java:512)' >&2\n\
             exit 1\n",
        )?;
        cli_command()
            .arg("query")
            .arg("--file")
            .arg(resource.path())
            .arg("--query")
            .arg("SELECT {{resource_file}}")
            .arg("--jar")
            .arg("sparql-anything.jar")
            .arg("--java")
            .arg("/bin/sh")
            .arg("--jvm-arg")
            .arg(engine.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("sparql-anything rejected the query"));
        Ok(())
    }

    #[test]
    fn clap_debug() {
        use clap::CommandFactory;

        Args::command().debug_assert()
    }
}
