//! GitHub contents API request and response types.
//!
//! See: https://docs.github.com/en/rest/repos/contents

use serde::{Deserialize, Serialize};

/// File resource returned by `GET /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Clone, Deserialize)]
pub struct ContentFile {
    /// Blob SHA, used as the version token
    pub sha: String,

    /// Base64 content, wrapped at 60 columns. Empty for files over 1 MB.
    #[serde(default)]
    pub content: String,

    /// "base64", or "none" when the file is too large to inline
    #[serde(default)]
    pub encoding: Option<String>,

    #[serde(default)]
    pub size: u64,

    /// Raw download location, used when content is not inlined
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Serialize)]
pub struct PutContentRequest<'a> {
    pub message: &'a str,
    /// Base64 encoded file content
    pub content: String,
    /// SHA of the blob being replaced; omitted when creating the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
    pub branch: &'a str,
}

/// Response to a successful `PUT`
#[derive(Debug, Deserialize)]
pub struct PutContentResponse {
    pub content: CommittedContent,
}

#[derive(Debug, Deserialize)]
pub struct CommittedContent {
    pub sha: String,
}

/// Error body returned by the API
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_request_omits_missing_sha() {
        let request = PutContentRequest {
            message: "Update albums.json",
            content: "W10=".to_string(),
            sha: None,
            branch: "main",
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("sha").is_none());
        assert_eq!(value["branch"], "main");
    }

    #[test]
    fn test_content_file_tolerates_missing_fields() {
        let file: ContentFile = serde_json::from_str(r#"{"sha": "abc"}"#).unwrap();
        assert_eq!(file.sha, "abc");
        assert!(file.content.is_empty());
        assert!(file.download_url.is_none());
    }
}
