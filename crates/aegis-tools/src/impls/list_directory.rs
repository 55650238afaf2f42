//! `list_directory`: lists immediate entries of a directory, restricted to
//! a base directory, sorted and capped to keep the LLM's context bounded.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{json, Value};

use aegis_models::{ToolDefinition, ToolParameter, ToolResult};
use aegis_traits::{Result, Tool, TraitError};

use crate::blocking_pool::BlockingPool;
use crate::path_policy::resolve_path;

const MAX_ENTRIES: usize = 1000;

pub struct ListDirectoryTool {
    base_dir: PathBuf,
    pool: BlockingPool,
}

impl ListDirectoryTool {
    pub fn new(base_dir: impl Into<PathBuf>, pool: BlockingPool) -> Self {
        Self {
            base_dir: base_dir.into(),
            pool,
        }
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_directory".into(),
            description: "Lists the immediate entries of a directory".into(),
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
                    "list_directory",
                    "path escapes the allowed base directory",
                    0,
                ))
            }
        };

        let result = self
            .pool
            .run(move || list_entries(&resolved))
            .await
            .map_err(|err| TraitError::ToolExecutionFailed {
                tool: "list_directory".to_string(),
                message: err.to_string(),
            })?;

        Ok(match result {
            Ok(entries) => ToolResult::ok("list_directory", json!(entries), 0),
            Err(err) => ToolResult::err("list_directory", err, 0),
        })
    }
}

fn list_entries(path: &std::path::Path) -> std::result::Result<Vec<String>, String> {
    let read_dir = std::fs::read_dir(path).map_err(|e| e.to_string())?;
    let mut names: Vec<String> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.path().is_dir() {
                format!("{name}/")
            } else {
                name
            }
        })
        .take(MAX_ENTRIES)
        .collect();
    names.sort();
    Ok(names)
}
