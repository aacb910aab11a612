//! Best-effort lookup of the image a product page advertises for sharing.

use std::time::Duration;

use regex::Regex;
use reqwest::{Client, Url};

/// Fetches a page and returns the absolute URL of its `og:image`
/// (or `twitter:image`). Never fails: problems are logged and yield `None`.
#[derive(Clone, Debug)]
pub struct PreviewFetcher {
    client: Client,
}

impl PreviewFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub async fn preview_image(&self, url: &str) -> Option<String> {
        match self.fetch(url).await {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!("failed to fetch url preview image for {url}: {err}");
                None
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<Option<String>, reqwest::Error> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(extract_preview_image(&body).map(|image| absolutize(url, &image)))
    }
}

impl Default for PreviewFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

/// `content` of the first `<meta>` whose `property`/`name` is `key`.
fn meta_content(html: &str, key: &str) -> Option<String> {
    let tag = Regex::new(&format!(
        r#"(?is)<meta\s[^>]*(?:property|name)\s*=\s*["']{}["'][^>]*>"#,
        regex::escape(key)
    ))
    .ok()?;
    let content = Regex::new(r#"(?is)\bcontent\s*=\s*["']([^"']*)["']"#).ok()?;

    tag.find_iter(html).find_map(|found| {
        content
            .captures(found.as_str())
            .and_then(|caps| caps.get(1))
            .map(|value| value.as_str().trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

pub(crate) fn extract_preview_image(html: &str) -> Option<String> {
    meta_content(html, "og:image").or_else(|| meta_content(html, "twitter:image"))
}

pub(crate) fn absolutize(page: &str, image: &str) -> String {
    if let Some(rest) = image.strip_prefix("//") {
        return format!("https://{rest}");
    }
    if image.starts_with('/') {
        if let Ok(page) = Url::parse(page) {
            if let Some(host) = page.host_str() {
                let port = page.port().map(|p| format!(":{p}")).unwrap_or_default();
                return format!("{}://{host}{port}{image}", page.scheme());
            }
        }
    }
    image.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn og_image_wins_over_twitter_image() {
        let html = r#"<html><head>
            <meta name="twitter:image" content="https://cdn.example.com/t.png">
            <meta property="og:image" content="https://cdn.example.com/og.png" />
        </head></html>"#;
        assert_eq!(
            extract_preview_image(html).as_deref(),
            Some("https://cdn.example.com/og.png")
        );
    }

    #[test]
    fn falls_back_to_twitter_image_and_any_attribute_order() {
        let html = r#"<meta content='/img/t.jpg' name='twitter:image'>"#;
        assert_eq!(extract_preview_image(html).as_deref(), Some("/img/t.jpg"));
        assert_eq!(extract_preview_image("<p>nothing</p>"), None);
    }

    #[test]
    fn relative_images_become_absolute() {
        let page = "http://shop.example.com:8080/items/42?ref=x";
        assert_eq!(
            absolutize(page, "//cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
        assert_eq!(
            absolutize(page, "/static/a.png"),
            "http://shop.example.com:8080/static/a.png"
        );
        assert_eq!(
            absolutize(page, "https://other.example.com/a.png"),
            "https://other.example.com/a.png"
        );
    }
}
