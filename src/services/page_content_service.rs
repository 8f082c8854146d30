use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Node, Selector};

use crate::{errors::GenerationError, models::domain::PageContent};

static TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title is a valid selector"));
static FAVICON: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"link[rel~="icon"]"#).expect("icon link is a valid selector"));
static BODY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("body is a valid selector"));

const SKIPPED: [&str; 5] = ["script", "style", "noscript", "template", "head"];
const BLOCKS: [&str; 20] = [
    "p", "div", "br", "li", "ul", "ol", "tr", "table", "section", "article", "header", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre",
];

/// Source of the page a quiz is generated from.
#[async_trait]
pub trait PageContentProvider: Send + Sync {
    async fn fetch(&self) -> Result<PageContent, GenerationError>;
}

/// A page the extension already captured from the active tab.
pub struct SnapshotPageProvider {
    page: Option<PageContent>,
}

impl SnapshotPageProvider {
    pub fn new(page: Option<PageContent>) -> Self {
        Self { page }
    }
}

#[async_trait]
impl PageContentProvider for SnapshotPageProvider {
    async fn fetch(&self) -> Result<PageContent, GenerationError> {
        match &self.page {
            Some(page) if !page.text.trim().is_empty() || !page.title.trim().is_empty() => {
                Ok(page.clone())
            }
            Some(_) => Err(GenerationError::PageContent(
                "Failed to extract page content".to_string(),
            )),
            None => Err(GenerationError::PageContent("No active tab found".to_string())),
        }
    }
}

/// Downloads a URL and reduces its HTML to readable text.
pub struct HttpPageFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpPageFetcher {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl PageContentProvider for HttpPageFetcher {
    async fn fetch(&self) -> Result<PageContent, GenerationError> {
        let failed = |e: reqwest::Error| {
            GenerationError::PageContent(format!("Failed to extract page content: {}", e))
        };

        let html = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(failed)?
            .text()
            .await
            .map_err(failed)?;

        let page = page_from_html(&html);
        if page.text.is_empty() {
            return Err(GenerationError::PageContent(format!(
                "Failed to extract page content: {} has no readable text",
                self.url
            )));
        }
        Ok(page)
    }
}

/// Extracts title, favicon and visible text from an HTML document.
pub fn page_from_html(html: &str) -> PageContent {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&TITLE)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    let favicon = doc
        .select(&FAVICON)
        .find_map(|link| link.value().attr("href"))
        .unwrap_or_default()
        .to_string();

    let body = doc.select(&BODY).next().unwrap_or_else(|| doc.root_element());
    let mut raw = String::new();
    for node in body.descendants() {
        match node.value() {
            Node::Element(element) if BLOCKS.contains(&element.name()) => raw.push('\n'),
            Node::Text(text) => {
                let hidden = node.ancestors().any(|a| {
                    a.value()
                        .as_element()
                        .is_some_and(|e| SKIPPED.contains(&e.name()))
                });
                if !hidden {
                    raw.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
                }
            }
            _ => {}
        }
    }

    let text = raw
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    PageContent {
        title,
        text,
        favicon,
    }
}
