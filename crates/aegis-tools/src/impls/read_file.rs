//! `read_file`: returns a file's contents as text, restricted to a base
//! directory. Runs on the blocking pool since `std::fs` is synchronous.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use aegis_models::{ToolDefinition, ToolParameter, ToolResult};
use aegis_traits::{Result, Tool, TraitError};

use crate::blocking_pool::BlockingPool;
use crate::path_policy::resolve_path;

pub struct ReadFileTool {
    base_dir: PathBuf,
    pool: BlockingPool,
    max_bytes: usize,
}

impl ReadFileTool {
    pub fn new(base_dir: impl Into<PathBuf>, pool: BlockingPool) -> Self {
        Self {
            base_dir: base_dir.into(),
            pool,
            max_bytes: 1_000_000,
        }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "read_file".into(),
            description: "Reads a UTF-8 text file and returns its contents".into(),
            parameters: vec![ToolParameter {
                name: "path".into(),
                param_type: "string".into(),
                required: true,
                default: None,
            }],
            timeout_seconds: 10,
        }
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult> {
        let path = arguments
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| TraitError::Other("missing required argument 'path'".to_string()))?;

        let resolved = match resolve_path(path, &self.base_dir) {
            Some(resolved) => resolved,
            None => {
                return Ok(ToolResult::err(
                    "read_file",
                    "path escapes the allowed base directory",
                    0,
                ))
            }
        };

        let max_bytes = self.max_bytes;
        let result = self
            .pool
            .run(move || std::fs::read_to_string(&resolved).map(|content| truncate(content, max_bytes)))
            .await
            .map_err(|err| TraitError::ToolExecutionFailed {
                tool: "read_file".to_string(),
                message: err.to_string(),
            })?;

        Ok(match result {
            Ok(content) => ToolResult::ok("read_file", Value::String(content), 0),
            Err(err) => ToolResult::err("read_file", err.to_string(), 0),
        })
    }
}

fn truncate(mut content: String, max_bytes: usize) -> String {
    if content.len() > max_bytes {
        content.truncate(max_bytes);
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn reads_file_within_base_dir() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "hi there").unwrap();
        let tool = ReadFileTool::new(dir.path(), BlockingPool::new(2));
        let result = tool.execute(json!({"path": "hello.txt"})).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output.as_str(), Some("hi there"));
    }

    #[tokio::test]
    async fn rejects_path_escaping_base_dir() {
        let dir = tempdir().unwrap();
        let tool = ReadFileTool::new(dir.path(), BlockingPool::new(2));
        let result = tool
            .execute(json!({"path": "../../etc/passwd"}))
            .await
            .unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn reports_missing_file_as_failed_result() {
        let dir = tempdir().unwrap();
        let tool = ReadFileTool::new(dir.path(), BlockingPool::new(2));
        let result = tool.execute(json!({"path": "missing.txt"})).await.unwrap();
        assert!(!result.success);
    }
}
