//! File editor capability (`str_replace_editor`).
//!
//! Supports the view / create / str_replace / insert command surface. Every
//! failure mode is reported through the result's error field so the model
//! can adjust and retry.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Tool, ToolExecutionResult};

const VIEW_LINE_LIMIT: usize = 500;

pub struct EditTool;

impl EditTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EditTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for EditTool {
    fn name(&self) -> &str {
        "str_replace_editor"
    }

    fn description(&self) -> &str {
        "View, create and edit files"
    }

    fn spec(&self) -> Value {
        json!({
            "type": "text_editor_20241022",
            "name": "str_replace_editor",
        })
    }

    async fn invoke(&self, input: Value) -> ToolExecutionResult {
        let Some(command) = input["command"].as_str() else {
            return ToolExecutionResult::err("missing 'command' argument");
        };
        let Some(path) = input["path"].as_str() else {
            return ToolExecutionResult::err("missing 'path' argument");
        };
        let path = Path::new(path);

        match command {
            "view" => view(path).await,
            "create" => create(path, input["file_text"].as_str()).await,
            "str_replace" => {
                str_replace(
                    path,
                    input["old_str"].as_str(),
                    input["new_str"].as_str().unwrap_or(""),
                )
                .await
            }
            "insert" => {
                insert(
                    path,
                    input["insert_line"].as_u64(),
                    input["new_str"].as_str(),
                )
                .await
            }
            other => ToolExecutionResult::err(format!("unrecognized command: {other}")),
        }
    }
}

async fn view(path: &Path) -> ToolExecutionResult {
    if path.is_dir() {
        return list_dir(path).await;
    }

    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) => return ToolExecutionResult::err(format!("cannot read {}: {err}", path.display())),
    };

    let mut numbered = String::new();
    let mut truncated = false;
    for (idx, line) in text.lines().enumerate() {
        if idx >= VIEW_LINE_LIMIT {
            truncated = true;
            break;
        }
        numbered.push_str(&format!("{:6}\t{line}\n", idx + 1));
    }

    let mut result = ToolExecutionResult::ok(numbered);
    if truncated {
        result.system = Some(format!("file truncated to first {VIEW_LINE_LIMIT} lines"));
    }
    result
}

async fn list_dir(path: &Path) -> ToolExecutionResult {
    let mut entries = match tokio::fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(err) => return ToolExecutionResult::err(format!("cannot list {}: {err}", path.display())),
    };

    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    ToolExecutionResult::ok(names.join("\n"))
}

async fn create(path: &Path, file_text: Option<&str>) -> ToolExecutionResult {
    let Some(file_text) = file_text else {
        return ToolExecutionResult::err("missing 'file_text' argument");
    };
    if path.exists() {
        return ToolExecutionResult::err(format!("{} already exists", path.display()));
    }
    match tokio::fs::write(path, file_text).await {
        Ok(()) => ToolExecutionResult::ok(format!("created {}", path.display())),
        Err(err) => ToolExecutionResult::err(format!("cannot create {}: {err}", path.display())),
    }
}

async fn str_replace(path: &Path, old_str: Option<&str>, new_str: &str) -> ToolExecutionResult {
    let Some(old_str) = old_str else {
        return ToolExecutionResult::err("missing 'old_str' argument");
    };

    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) => return ToolExecutionResult::err(format!("cannot read {}: {err}", path.display())),
    };

    let occurrences = text.matches(old_str).count();
    if occurrences == 0 {
        return ToolExecutionResult::err(format!(
            "old_str not found in {}; no edit performed",
            path.display()
        ));
    }
    if occurrences > 1 {
        return ToolExecutionResult::err(format!(
            "old_str appears {occurrences} times in {}; it must be unique",
            path.display()
        ));
    }

    let updated = text.replacen(old_str, new_str, 1);
    match tokio::fs::write(path, updated).await {
        Ok(()) => ToolExecutionResult::ok(format!("edited {}", path.display())),
        Err(err) => ToolExecutionResult::err(format!("cannot write {}: {err}", path.display())),
    }
}

async fn insert(
    path: &Path,
    insert_line: Option<u64>,
    new_str: Option<&str>,
) -> ToolExecutionResult {
    let Some(insert_line) = insert_line else {
        return ToolExecutionResult::err("missing 'insert_line' argument");
    };
    let Some(new_str) = new_str else {
        return ToolExecutionResult::err("missing 'new_str' argument");
    };

    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) => return ToolExecutionResult::err(format!("cannot read {}: {err}", path.display())),
    };

    let mut lines: Vec<&str> = text.lines().collect();
    let at = insert_line as usize;
    if at > lines.len() {
        return ToolExecutionResult::err(format!(
            "insert_line {at} is past the end of the file ({} lines)",
            lines.len()
        ));
    }
    lines.insert(at, new_str);
    let updated = lines.join("\n") + "\n";

    match tokio::fs::write(path, updated).await {
        Ok(()) => ToolExecutionResult::ok(format!(
            "inserted at line {at} in {}",
            path.display()
        )),
        Err(err) => ToolExecutionResult::err(format!("cannot write {}: {err}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> EditTool {
        EditTool::new()
    }

    #[tokio::test]
    async fn create_then_view() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let path_str = path.to_string_lossy().to_string();

        let result = tool()
            .invoke(json!({
                "command": "create",
                "path": path_str,
                "file_text": "alpha\nbeta\n"
            }))
            .await;
        assert!(!result.is_error(), "{:?}", result.error);

        let result = tool()
            .invoke(json!({"command": "view", "path": path_str}))
            .await;
        let output = result.output.unwrap();
        assert!(output.contains("1\talpha"));
        assert!(output.contains("2\tbeta"));
    }

    #[tokio::test]
    async fn create_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.txt");
        std::fs::write(&path, "existing").unwrap();

        let result = tool()
            .invoke(json!({
                "command": "create",
                "path": path.to_string_lossy(),
                "file_text": "new"
            }))
            .await;
        assert!(result.is_error());
        assert!(result.error.unwrap().contains("already exists"));
    }

    #[tokio::test]
    async fn str_replace_requires_unique_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.txt");
        std::fs::write(&path, "aa bb aa\n").unwrap();
        let path_str = path.to_string_lossy().to_string();

        let result = tool()
            .invoke(json!({
                "command": "str_replace",
                "path": path_str,
                "old_str": "aa",
                "new_str": "cc"
            }))
            .await;
        assert!(result.is_error());
        assert!(result.error.unwrap().contains("must be unique"));

        let result = tool()
            .invoke(json!({
                "command": "str_replace",
                "path": path_str,
                "old_str": "bb",
                "new_str": "cc"
            }))
            .await;
        assert!(!result.is_error());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "aa cc aa\n");
    }

    #[tokio::test]
    async fn str_replace_missing_needle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.txt");
        std::fs::write(&path, "hello\n").unwrap();

        let result = tool()
            .invoke(json!({
                "command": "str_replace",
                "path": path.to_string_lossy(),
                "old_str": "absent",
                "new_str": "y"
            }))
            .await;
        assert!(result.is_error());
        assert!(result.error.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn insert_after_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.txt");
        std::fs::write(&path, "one\nthree\n").unwrap();

        let result = tool()
            .invoke(json!({
                "command": "insert",
                "path": path.to_string_lossy(),
                "insert_line": 1,
                "new_str": "two"
            }))
            .await;
        assert!(!result.is_error(), "{:?}", result.error);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\nthree\n");
    }

    #[tokio::test]
    async fn view_lists_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();

        let result = tool()
            .invoke(json!({"command": "view", "path": dir.path().to_string_lossy()}))
            .await;
        assert_eq!(result.output.as_deref(), Some("a.txt\nb.txt"));
    }

    #[tokio::test]
    async fn unrecognized_command() {
        let result = tool()
            .invoke(json!({"command": "delete", "path": "/tmp/x"}))
            .await;
        assert!(result.is_error());
        assert!(result.error.unwrap().contains("unrecognized command"));
    }
}
