//! [`ContentExtractor`] that downloads a page and keeps its readable main
//! content.

use brief_pipeline::{
  ScrapeConfig,
  collab::{CollaboratorError, ContentExtractor, ExtractedPage},
};
use reqwest::Client;
use spider_transformations::transformation::content::{
  ReturnFormat, TransformConfig, TransformInput, transform_content_input,
};
use tracing::debug;

pub struct HttpExtractor {
  client: Client,
}

impl HttpExtractor {
  pub fn new(config: &ScrapeConfig) -> anyhow::Result<Self> {
    let client = Client::builder()
      .user_agent(&config.user_agent)
      .timeout(config.timeout())
      .build()?;
    Ok(Self { client })
  }
}

/// Contents of the first `<title>` element, if any.
pub fn extract_title(html: &str) -> Option<String> {
  let lower = html.to_ascii_lowercase();
  let open = lower.find("<title")?;
  let start = open + lower[open..].find('>')? + 1;
  let end = start + lower[start..].find("</title>")?;
  let title = html[start..end].trim();
  (!title.is_empty()).then(|| title.to_owned())
}

/// Readability pass over raw HTML.
pub fn readable_text(url: &str, html: &str) -> String {
  let parsed_url = url::Url::parse(url).ok();
  let config = TransformConfig {
    readability:   true,
    main_content:  true,
    return_format: ReturnFormat::Text,
    filter_images: true,
    filter_svg:    true,
    clean_html:    true,
  };
  let input = TransformInput {
    url:              parsed_url.as_ref(),
    content:          html.as_bytes(),
    screenshot_bytes: None,
    encoding:         None,
    selector_config:  None,
    ignore_tags:      None,
  };
  transform_content_input(input, &config)
}

impl ContentExtractor for HttpExtractor {
  async fn extract(&self, url: &str) -> Result<ExtractedPage, CollaboratorError> {
    let html = self
      .client
      .get(url)
      .send()
      .await
      .and_then(reqwest::Response::error_for_status)
      .map_err(CollaboratorError::transport)?
      .text()
      .await
      .map_err(CollaboratorError::transport)?;

    let title = extract_title(&html);
    let text = readable_text(url, &html);
    debug!(url, html_bytes = html.len(), text_bytes = text.len(), "page extracted");
    Ok(ExtractedPage { text, title })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn title_is_found_case_insensitively() {
    let html = "<html><HEAD><Title lang=\"vi\"> Lãi suất </Title></HEAD></html>";
    assert_eq!(extract_title(html).as_deref(), Some("Lãi suất"));
    assert_eq!(extract_title("<title></title>"), None);
    assert_eq!(extract_title("<p>no title</p>"), None);
  }
}
