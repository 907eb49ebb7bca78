use crate::policy::PolicyDocument;
use crate::query::QueryTemplate;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

const QUERY_FILE: &str = "query.sparql";
const POLICY_FILE: &str = "sparql-anything.policy";
const OUTPUT_FILE: &str = "output.nt";

/// Scratch directory of a single invocation.
///
/// Holds the resource, the rendered query and policy, and the engine output. Everything is
/// removed when the staging area is dropped.
#[derive(Debug)]
pub struct Staging {
    dir: TempDir,
    resource_file: PathBuf,
}

impl Staging {
    /// Creates a staging area whose resource file still has to be written.
    ///
    /// The file is named after the resource with every character outside `[A-Za-z0-9._-]`
    /// replaced, so the path can be pasted into an `x-sparql-anything:` IRI. The extension is
    /// kept, the engine picks its triplifier from it.
    pub fn new(resource: &str) -> io::Result<Self> {
        let file_name = Path::new(resource).file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("The resource '{resource}' does not name a file"),
            )
        })?;
        let dir = tempfile::Builder::new()
            .prefix("sparql-anything-")
            .tempdir()?;
        let resource_file = dir
            .path()
            .join(staged_file_name(&file_name.to_string_lossy()));
        Ok(Self { dir, resource_file })
    }

    /// Creates a staging area around a resource that already exists on the local file system.
    pub fn for_local_file(path: &Path) -> io::Result<Self> {
        let resource_file = path.canonicalize()?;
        if !resource_file.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a file", resource_file.display()),
            ));
        }
        let dir = tempfile::Builder::new()
            .prefix("sparql-anything-")
            .tempdir()?;
        Ok(Self { dir, resource_file })
    }

    pub fn resource_file(&self) -> &Path {
        &self.resource_file
    }

    pub fn query_file(&self) -> PathBuf {
        self.dir.path().join(QUERY_FILE)
    }

    pub fn policy_file(&self) -> PathBuf {
        self.dir.path().join(POLICY_FILE)
    }

    pub fn output_file(&self) -> PathBuf {
        self.dir.path().join(OUTPUT_FILE)
    }

    /// Writes the rendered query and the matching policy, returns the rendered query.
    pub async fn prepare(&self, query: &QueryTemplate) -> io::Result<String> {
        let query_file = self.query_file();
        let rendered = query.render(&self.resource_file);
        tokio::fs::write(&query_file, &rendered).await?;

        let policy = PolicyDocument::new(&self.resource_file, &query_file);
        tokio::fs::write(self.policy_file(), policy.render()?).await?;
        debug!("Staged query and policy in {}", self.dir.path().display());
        Ok(rendered)
    }
}

fn staged_file_name(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    // Dots only would name a directory.
    if safe.trim_matches('.').is_empty() {
        "resource".to_owned()
    } else {
        safe
    }
}
