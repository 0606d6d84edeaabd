//! Targeted file patching and the files-to-write queue
//!
//! Patching is text substitution, not parsing: the provider block is matched
//! with a bounded-depth bracket regex and replaced wholesale. Writes are
//! accumulated in a queue and flushed at the end so no partially patched
//! template is visible mid-setup (the flush itself is whole-file writes, not
//! transactional across files).

use anyhow::{Context, Result};
use regex::{NoExpand, Regex};
use std::path::PathBuf;

/// Pattern for the content of `providers: [...]` in the auth file.
/// Correct only while the array nests other array literals at most three
/// levels deep; deeper nesting truncates the match.
const PROVIDER_BLOCK_PATTERN: &str =
    r"providers:\s*\[(?:[^\]\[]|\[(?:[^\]\[]|\[(?:[^\]\[]|\[[^\]\[]*\])*\])*\])*\]";

/// Pattern for the template's default provider import, assumed to sit on a
/// single line.
const PROVIDER_IMPORT_PATTERN: &str = r"(?m)^import\s+CredentialsProvider.*$";

/// A single environment file entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A pending whole-file write
#[derive(Debug, Clone)]
pub struct FileToWrite {
    pub location: PathBuf,
    pub content: String,
}

/// Patch the auth-configuration source: swap the provider block and the
/// provider import for the selected provider's code.
///
/// `None` for either lookup means the provider is unknown to the kit; the
/// substitution degrades to empty rather than erroring, as does a pattern
/// that never matches.
pub fn apply_auth_provider(source: &str, code: Option<&str>, import: Option<&str>) -> String {
    let patched = replace_provider_block(source, code.unwrap_or_default());
    replace_provider_import(&patched, import.unwrap_or_default())
}

/// Replace the existing `providers: [...]` array with the given provider code
pub fn replace_provider_block(source: &str, code: &str) -> String {
    let pattern = Regex::new(PROVIDER_BLOCK_PATTERN).expect("provider block pattern is valid");
    let replacement = format!("providers: [{}  ]", code);
    pattern.replace(source, NoExpand(&replacement)).into_owned()
}

/// Replace the default provider import line with the given import statement
pub fn replace_provider_import(source: &str, import: &str) -> String {
    let pattern = Regex::new(PROVIDER_IMPORT_PATTERN).expect("provider import pattern is valid");
    pattern.replace(source, NoExpand(import)).into_owned()
}

/// Render `KEY=VALUE` lines, one per entry, in insertion order
pub fn render_env_file(vars: &[EnvVar]) -> String {
    vars.iter()
        .map(|v| format!("{}={}", v.key, v.value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse `KEY=VALUE` lines back into ordered entries. Round-trips with
/// `render_env_file` exactly.
pub fn parse_env_file(content: &str) -> Vec<EnvVar> {
    content
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once('=') {
            Some((key, value)) => EnvVar::new(key, value),
            None => EnvVar::new(line, ""),
        })
        .collect()
}

/// Parse and re-serialize the manifest (package.json), preserving key order.
/// The content is unchanged apart from normalization to 2-space indentation.
pub fn reserialize_manifest(source: &str) -> Result<String> {
    let manifest: serde_json::Value =
        serde_json::from_str(source).context("Failed to parse package.json")?;
    serde_json::to_string_pretty(&manifest).context("Failed to serialize package.json")
}

/// Flush the queue: each entry is a whole-file replacement
pub async fn flush(files: &[FileToWrite]) -> Result<()> {
    for file in files {
        tokio::fs::write(&file.location, &file.content)
            .await
            .with_context(|| format!("Failed to write {}", file.location.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTH_SOURCE: &str = r#"import NextAuth from "next-auth";
import CredentialsProvider from "next-auth/providers/credentials";

export default NextAuth({
  providers: [
    CredentialsProvider({
      name: "Demo",
      credentials: [{ label: "Email", type: "email" }],
    }),
  ],
});
"#;

    const GITHUB_CODE: &str = "\n    GithubProvider({\n      clientId: process.env.GITHUB_CLIENT_ID,\n      clientSecret: process.env.GITHUB_CLIENT_SECRET,\n    }),\n";
    const GITHUB_IMPORT: &str = "import GithubProvider from \"next-auth/providers/github\";";

    #[test]
    fn test_provider_block_is_replaced_wholesale() {
        let patched = replace_provider_block(AUTH_SOURCE, GITHUB_CODE);
        assert!(patched.contains("GithubProvider"));
        assert!(!patched.contains("name: \"Demo\""));
        assert!(patched.contains("providers: [\n    GithubProvider"));
    }

    #[test]
    fn test_empty_code_empties_the_block() {
        let patched = replace_provider_block(AUTH_SOURCE, "");
        assert!(patched.contains("providers: [  ]"));
        assert!(!patched.contains("CredentialsProvider({"));
    }

    #[test]
    fn test_three_level_nesting_is_matched() {
        let source = r#"providers: [
    CredentialsProvider({
      credentials: [[["deep"]]],
    }),
  ], rest"#;
        let patched = replace_provider_block(source, "X");
        assert_eq!(patched, "providers: [X  ], rest");
    }

    #[test]
    fn test_import_line_is_replaced() {
        let patched = replace_provider_import(AUTH_SOURCE, GITHUB_IMPORT);
        assert!(patched.contains(GITHUB_IMPORT));
        assert!(!patched.contains("next-auth/providers/credentials"));
        // The surrounding import is untouched
        assert!(patched.contains("import NextAuth from \"next-auth\";"));
    }

    #[test]
    fn test_unknown_provider_degrades_to_empty() {
        let patched = apply_auth_provider(AUTH_SOURCE, None, None);
        assert!(patched.contains("providers: [  ]"));
        assert!(!patched.contains("import CredentialsProvider"));
    }

    #[test]
    fn test_pattern_miss_leaves_source_untouched() {
        let source = "export default {};\n";
        assert_eq!(apply_auth_provider(source, Some("X"), Some("Y")), source);
    }

    #[test]
    fn test_replacement_with_dollar_signs_is_literal() {
        let code = "\n    CustomProvider({ secret: \"$100\" }),\n";
        let patched = replace_provider_block(AUTH_SOURCE, code);
        assert!(patched.contains("$100"));
    }

    #[test]
    fn test_env_file_round_trips() {
        let vars = vec![
            EnvVar::new("SECRET_KEY", "sk_live_abc"),
            EnvVar::new("GITHUB_CLIENT_ID", ""),
            EnvVar::new("SESSION_SECRET", "aGVsbG8=="),
        ];
        let rendered = render_env_file(&vars);
        assert_eq!(
            rendered,
            "SECRET_KEY=sk_live_abc\nGITHUB_CLIENT_ID=\nSESSION_SECRET=aGVsbG8=="
        );
        assert_eq!(parse_env_file(&rendered), vars);
    }

    #[test]
    fn test_manifest_reserializes_with_order_preserved() {
        let source = r#"{"name":"demo","version":"0.1.0","scripts":{"dev":"next dev"}}"#;
        let output = reserialize_manifest(source).unwrap();
        let name_at = output.find("\"name\"").unwrap();
        let version_at = output.find("\"version\"").unwrap();
        let scripts_at = output.find("\"scripts\"").unwrap();
        assert!(name_at < version_at && version_at < scripts_at);
        // Stable under a second pass
        assert_eq!(reserialize_manifest(&output).unwrap(), output);
    }

    #[test]
    fn test_invalid_manifest_is_an_error() {
        assert!(reserialize_manifest("not json").is_err());
    }

    #[tokio::test]
    async fn test_flush_writes_every_queued_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            FileToWrite {
                location: dir.path().join(".env.local"),
                content: "KEY=value".to_string(),
            },
            FileToWrite {
                location: dir.path().join("package.json"),
                content: "{}".to_string(),
            },
        ];
        flush(&files).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join(".env.local")).unwrap(),
            "KEY=value"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("package.json")).unwrap(),
            "{}"
        );
    }
}
