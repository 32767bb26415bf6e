use anyhow::Context;
use log::debug;
use reqwest::Url;

/// Downloads a published CSV export. Non-2xx responses are errors.
pub async fn fetch_csv(url: &str) -> anyhow::Result<String> {
    let url = Url::parse(url).with_context(|| format!("malformed url {:?}", url))?;
    debug!("GET {}", url);

    let res = reqwest::get(url.clone())
        .await
        .with_context(|| format!("request {} failed", url))?
        .error_for_status()?;
    let body = res.text().await?;
    debug!("{} bytes from {}", body.len(), url);
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_malformed_url() {
        let err = fetch_csv("not a url").await.unwrap_err();
        assert!(err.to_string().contains("malformed url"));
    }
}
