//! Java security policy for the sandboxed engine process.
//!
//! The engine only gets read access to the two files a step materializes, plus the system
//! properties and location-mapping lookups Apache Jena performs on start-up.

use std::io;
use std::path::{Path, PathBuf};

/// Grant block with two file slots, the resource file followed by the query file.
pub const POLICY_TEMPLATE: &str = r#"
grant {
permission java.util.PropertyPermission "user.dir", "read";
permission java.util.PropertyPermission "http://jena.hpl.hp.com/2004/07/feature/noSecurity", "read";
permission java.util.PropertyPermission "http://jena.hpl.hp.com/2004/07/feature/noCharset", "read";
permission java.util.PropertyPermission "http://jena.hpl.hp.com/2004/08/LocationMap", "read";
permission java.util.PropertyPermission "LocationMap", "read";
permission java.util.PropertyPermission "org.apache.jena.tdb.settings", "read";
permission java.util.PropertyPermission "tdb:settings", "read";
permission java.util.PropertyPermission "sun.arch.data.model", "read";
permission java.util.PropertyPermission "*", "read,write";
permission java.lang.RuntimePermission "getenv.TURN_OFF_LR_LOOP_ENTRY_BRANCH_OPT";
permission java.io.FilePermission "location-mapping.ttl", "read";
permission java.io.FilePermission "etc/location-mapping.ttl", "read";
permission java.io.FilePermission "etc/location-mapping.rdf", "read";
permission java.io.FilePermission "location-mapping.rdf", "read";

permission java.io.FilePermission "{resource_file}", "read";
permission java.io.FilePermission "{query_file}", "read";

};
"#;

/// The policy of a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDocument {
    resource_file: PathBuf,
    query_file: PathBuf,
}

impl PolicyDocument {
    pub fn new(resource_file: impl Into<PathBuf>, query_file: impl Into<PathBuf>) -> Self {
        Self {
            resource_file: resource_file.into(),
            query_file: query_file.into(),
        }
    }

    /// Fails on paths the policy syntax cannot express.
    pub fn render(&self) -> io::Result<String> {
        Ok(POLICY_TEMPLATE
            .replace("{resource_file}", &escape_path(&self.resource_file)?)
            .replace("{query_file}", &escape_path(&self.query_file)?))
    }
}

/// Policy files use Java string literal syntax.
///
/// The JVM expands `${property}` inside policy strings and offers no escape for it, so such
/// paths are rejected.
fn escape_path(path: &Path) -> io::Result<String> {
    let path = path.to_string_lossy();
    if path.contains("${") {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{path} contains '${{', which the JVM would expand in the security policy"),
        ));
    }
    let mut escaped = String::new();
    for c in path.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            c => escaped.push(c),
        }
    }
    Ok(escaped)
}
