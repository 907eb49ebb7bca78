use std::fmt;
use std::path::Path;

/// The placeholder that is replaced by the path of the materialized resource.
pub const RESOURCE_FILE_PLACEHOLDER: &str = "{{resource_file}}";

/// Query used when a step does not provide its own.
///
/// It lifts every triple of the Facade-X view of the resource into the target graph.
pub const DEFAULT_QUERY: &str = r#"PREFIX fx: <http://sparql.xyz/facade-x/ns/>
CONSTRUCT { ?s ?p ?o }
WHERE
{
  SERVICE <x-sparql-anything:{{resource_file}}> {
    fx:properties fx:root "https://example.org/graph/" .
    fx:properties fx:blank-nodes false .
    ?s  ?p  ?o .
  }
}"#;

/// A sparql-anything query that may reference the step resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate(String);

impl QueryTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn references_resource(&self) -> bool {
        self.0.contains(RESOURCE_FILE_PLACEHOLDER)
    }

    /// Replaces every placeholder occurrence with `resource_file`.
    pub fn render(&self, resource_file: &Path) -> String {
        self.0
            .replace(RESOURCE_FILE_PLACEHOLDER, &resource_file.to_string_lossy())
    }
}

impl Default for QueryTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY)
    }
}

impl From<String> for QueryTemplate {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for QueryTemplate {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for QueryTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
