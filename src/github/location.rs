use url::Url;

use crate::error::{AppError, Result};
use crate::models::FileLocation;

/// Splits `https://github.com/{owner}/{repo}/blob/{branch}/{path...}`.
pub fn parse_file_url(file_url: &str) -> Result<FileLocation> {
    let parsed = Url::parse(file_url).map_err(|e| AppError::BadRequest(format!("Invalid URL: {}", e)))?;

    match parsed.host_str() {
        Some("github.com") | Some("www.github.com") => {}
        _ => {
            return Err(AppError::BadRequest(
                "Only github.com file URLs are supported".to_string(),
            ))
        }
    }

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if segments.len() < 5 || segments[2] != "blob" {
        return Err(AppError::BadRequest(
            "Expected a /owner/repo/blob/branch/path file URL".to_string(),
        ));
    }

    Ok(FileLocation {
        owner: segments[0].to_string(),
        repo: segments[1].to_string(),
        branch: segments[3].to_string(),
        file_path: segments[4..].join("/"),
    })
}

/// Splits `owner/repo`.
pub fn split_repo_name(full_name: &str) -> Result<(&str, &str)> {
    match full_name.trim().split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner, repo))
        }
        _ => Err(AppError::BadRequest(format!(
            "Repository must be owner/repo, got {:?}",
            full_name
        ))),
    }
}
