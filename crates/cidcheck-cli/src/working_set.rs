//! Loading the working set: the ordered list of CIDs a run checks.

use std::path::Path;

use anyhow::{Context, Result};

/// Parse a working set from text.
///
/// Accepts a JSON array of strings, or one CID per line. Blank lines and
/// lines starting with `#` are ignored in the line format.
pub fn parse(text: &str) -> Result<Vec<String>> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("working set is not a JSON array of strings");
    }

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

/// Read a working set from a local file.
pub async fn load_file(path: &Path) -> Result<Vec<String>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading working set from {}", path.display()))?;
    parse(&text).with_context(|| format!("parsing working set in {}", path.display()))
}

/// Fetch a working set published as a JSON array of strings.
pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Vec<String>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("fetching working set from {url}"))?
        .error_for_status()
        .with_context(|| format!("fetching working set from {url}"))?;

    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("reading working set body from {url}"))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing working set from {url}"))
}

/// Keep at most `limit` entries.
pub fn truncate(mut cids: Vec<String>, limit: Option<usize>) -> Vec<String> {
    if let Some(limit) = limit {
        cids.truncate(limit);
    }
    cids
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_json_array() {
        let cids = parse(r#" ["bafy1", "bafy2/path"] "#).unwrap();
        assert_eq!(cids, vec!["bafy1", "bafy2/path"]);
    }

    #[test]
    fn test_parse_lines() {
        let cids = parse("bafy1\n\n# comment\n  bafy2  \n").unwrap();
        assert_eq!(cids, vec!["bafy1", "bafy2"]);
    }

    #[test]
    fn test_parse_bad_json() {
        assert!(parse("[1, 2]").is_err());
    }

    #[test]
    fn test_truncate() {
        let cids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(truncate(cids.clone(), Some(2)), vec!["a", "b"]);
        assert_eq!(truncate(cids.clone(), None).len(), 3);
        assert_eq!(truncate(cids, Some(10)).len(), 3);
    }

    #[tokio::test]
    async fn test_load_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("cids.txt");
        std::fs::write(&file, "bafy1\nbafy2\n").unwrap();
        assert_eq!(load_file(&file).await.unwrap(), vec!["bafy1", "bafy2"]);
        assert!(load_file(&dir.path().join("missing")).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/top-cids"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"["bafy1","bafy2"]"#))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let cids = fetch(&client, &format!("{}/top-cids", server.uri()))
            .await
            .unwrap();
        assert_eq!(cids, vec!["bafy1", "bafy2"]);
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        assert!(fetch(&client, &server.uri()).await.is_err());
    }
}
