use crate::path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Directory,
}

/// A node of the tree. Directories own their children exclusively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<BTreeMap<String, FileNode>>,
    pub last_modified: i64,
    pub path: String,
}

impl FileNode {
    pub fn file(name: &str, path: &str, content: String, now: i64) -> Self {
        Self {
            name: name.to_string(),
            node_type: NodeType::File,
            content: Some(content),
            children: None,
            last_modified: now,
            path: path.to_string(),
        }
    }

    pub fn directory(name: &str, path: &str, now: i64) -> Self {
        Self {
            name: name.to_string(),
            node_type: NodeType::Directory,
            content: None,
            children: Some(BTreeMap::new()),
            last_modified: now,
            path: path.to_string(),
        }
    }

    pub fn root(now: i64) -> Self {
        Self::directory("", path::ROOT, now)
    }

    pub fn is_dir(&self) -> bool {
        self.node_type == NodeType::Directory
    }

    pub fn children_mut(&mut self) -> Option<&mut BTreeMap<String, FileNode>> {
        if self.is_dir() {
            Some(self.children.get_or_insert_with(BTreeMap::new))
        } else {
            None
        }
    }

    pub fn child(&self, name: &str) -> Option<&FileNode> {
        self.children.as_ref().and_then(|children| children.get(name))
    }

    /// Rewrite `path` for this node and its whole subtree.
    pub fn relocate(&mut self, new_path: &str) {
        self.path = new_path.to_string();
        if let Some(children) = self.children.as_mut() {
            for (name, child) in children.iter_mut() {
                child.relocate(&path::join(new_path, name));
            }
        }
    }

    pub fn stat(&self) -> FileStat {
        FileStat {
            name: self.name.clone(),
            path: self.path.clone(),
            node_type: self.node_type,
            size: self.content.as_ref().map(|c| c.len()).unwrap_or(0),
            last_modified: self.last_modified,
            language: if self.is_dir() {
                None
            } else {
                language_for(&self.name).map(str::to_string)
            },
        }
    }
}

/// Flat description of a node, as returned by listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileStat {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub size: usize,
    pub last_modified: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

pub fn language_for(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    let language = match ext.to_ascii_lowercase().as_str() {
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" => "javascript",
        "py" => "python",
        "md" => "markdown",
        "json" => "json",
        "rs" => "rust",
        "html" => "html",
        "css" => "css",
        "sh" => "shell",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "txt" => "plaintext",
        _ => return None,
    };
    Some(language)
}
