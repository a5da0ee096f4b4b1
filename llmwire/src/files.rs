//! The `read_file` tool.
//!
//! The model may only read files attached to the conversation. It names
//! one by the path from the attachment notice, or by its display name.
//! Content is capped at [`MAX_READ_BYTES`] and decoded lossily.

use llmwire_core::FileReference;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

/// Largest file prefix returned to the model.
pub const MAX_READ_BYTES: usize = 256 * 1024;

#[derive(Debug, Deserialize)]
struct ReadFileArgs {
    path: String,
}

#[derive(Debug, Error)]
enum ReadFileError {
    #[error("invalid arguments: {0}")]
    Arguments(#[from] serde_json::Error),

    #[error("'{0}' is not an attached file")]
    NotAttached(String),

    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run `read_file` with the model's JSON arguments.
///
/// Returns the tool message content. Failures are reported to the model as
/// `{"error": ...}` rather than ending the turn.
pub async fn read_file(arguments: &str, attached: &[FileReference]) -> String {
    match read_attached(arguments, attached).await {
        Ok(content) => content,
        Err(err) => {
            warn!(error = %err, "read_file failed");
            json!({ "error": err.to_string() }).to_string()
        }
    }
}

async fn read_attached(arguments: &str, attached: &[FileReference]) -> Result<String, ReadFileError> {
    let args: ReadFileArgs = serde_json::from_str(arguments)?;
    let requested = args.path.trim();

    let (file, path) = attached
        .iter()
        .filter(|f| f.is_local())
        .find_map(|f| {
            let path = f.locator()?;
            (path == requested || f.name == requested).then_some((f, path))
        })
        .ok_or_else(|| ReadFileError::NotAttached(requested.to_string()))?;

    let io_error = |source| ReadFileError::Io {
        path: path.to_string(),
        source,
    };
    let handle = tokio::fs::File::open(path).await.map_err(io_error)?;
    let mut bytes = Vec::new();
    handle
        .take(MAX_READ_BYTES as u64 + 1)
        .read_to_end(&mut bytes)
        .await
        .map_err(io_error)?;

    let truncated = bytes.len() > MAX_READ_BYTES;
    bytes.truncate(MAX_READ_BYTES);
    debug!(file = %file.name, bytes = bytes.len(), truncated, "read attached file");

    Ok(json!({
        "path": path,
        "name": file.name,
        "content": String::from_utf8_lossy(&bytes),
        "truncated": truncated,
    })
    .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn temp_file(name: &str, contents: &[u8]) -> String {
        let path = std::env::temp_dir().join(format!("llmwire-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_reads_attached_file_by_path_or_name() {
        let path = temp_file("notes.txt", b"line one\nline two");
        let attached = vec![FileReference::local(&path, "notes.txt")];

        let by_path: Value =
            serde_json::from_str(&read_file(&json!({"path": path}).to_string(), &attached).await)
                .unwrap();
        assert_eq!(by_path["content"], "line one\nline two");
        assert_eq!(by_path["truncated"], false);

        let by_name: Value =
            serde_json::from_str(&read_file(r#"{"path":"notes.txt"}"#, &attached).await).unwrap();
        assert_eq!(by_name["content"], "line one\nline two");
    }

    #[tokio::test]
    async fn test_unattached_path_refused() {
        let path = temp_file("secret.txt", b"hidden");
        let attached = vec![FileReference::local("/tmp/other.txt", "other.txt")];

        let result: Value =
            serde_json::from_str(&read_file(&json!({"path": path}).to_string(), &attached).await)
                .unwrap();
        assert!(result["error"].as_str().unwrap().contains("not an attached file"));
        assert!(result.get("content").is_none());
    }

    #[tokio::test]
    async fn test_large_file_truncated() {
        let path = temp_file("big.txt", &vec![b'x'; MAX_READ_BYTES + 10]);
        let attached = vec![FileReference::local(&path, "big.txt")];

        let result: Value =
            serde_json::from_str(&read_file(r#"{"path":"big.txt"}"#, &attached).await).unwrap();
        assert_eq!(result["truncated"], true);
        assert_eq!(result["content"].as_str().unwrap().len(), MAX_READ_BYTES);
    }

    #[tokio::test]
    async fn test_bad_arguments_and_missing_file() {
        let attached = vec![FileReference::local("/nonexistent/llmwire/a.txt", "a.txt")];

        let bad: Value = serde_json::from_str(&read_file("{", &attached).await).unwrap();
        assert!(bad["error"].as_str().unwrap().starts_with("invalid arguments"));

        let missing: Value =
            serde_json::from_str(&read_file(r#"{"path":"a.txt"}"#, &attached).await).unwrap();
        assert!(missing["error"].as_str().unwrap().contains("cannot read"));
    }
}
