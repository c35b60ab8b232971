use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Folder,
}

/// A file or folder in the project tree, paths are relative to the project root
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct FileNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
}

impl FileNode {
    pub fn is_folder(&self) -> bool {
        self.kind == FileKind::Folder
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct FileStats {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
}

/// Text content of a file together with its metadata
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct FileContent {
    pub content: String,
    pub stats: FileStats,
}

/// Response for the full project tree
#[derive(Serialize, Deserialize, ToSchema)]
pub struct FileTreeResponse {
    pub success: bool,
    pub files: FileNode,
}

/// Response for reading a file
#[derive(Serialize, Deserialize, ToSchema)]
pub struct FileReadResponse {
    pub success: bool,
    pub content: String,
    pub stats: FileStats,
}

/// Response for listing a single directory
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DirectoryListResponse {
    pub success: bool,
    pub files: Vec<FileNode>,
}

/// Request payload for writing a file
#[derive(Serialize, Deserialize, ToSchema)]
pub struct FileWriteRequest {
    pub content: String,
}

/// Response returned after a write or delete
#[derive(Serialize, Deserialize, ToSchema)]
pub struct FileMutationResponse {
    pub success: bool,
}
