//! Fetches Wikipedia articles and pulls out the parts quiz generation needs.

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::metrics;
use crate::models::article::KeyEntities;
use crate::services::error::QuizError;
use crate::utils::html::{collapse_whitespace, text_content};

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0 Safari/537.36";

const MAX_SUMMARY_CHARS: usize = 500;
const MIN_SUMMARY_CHARS: usize = 100;
const MAX_SECTIONS: usize = 10;
const MAX_ENTITY_LINKS: usize = 30;

lazy_static! {
    static ref FIRST_HEADING: Regex =
        Regex::new(r#"(?s)<h1\b[^>]*\bid="firstHeading"[^>]*>(.*?)</h1>"#).unwrap();
    static ref PARAGRAPH: Regex = Regex::new(r"(?s)<p\b[^>]*>(.*?)</p>").unwrap();
    static ref SECTION_HEADING: Regex =
        Regex::new(r"(?s)<h2\b[^>]*>(.*?)</h2>|<h3\b[^>]*>(.*?)</h3>").unwrap();
    static ref ANCHOR: Regex = Regex::new(r"(?s)<a\b([^>]*)>(.*?)</a>").unwrap();
    static ref TITLE_ATTR: Regex = Regex::new(r#"\btitle="([^"]*)""#).unwrap();
}

/// Everything extracted from one article page.
#[derive(Debug, Clone, Default)]
pub struct ArticleContent {
    pub title: String,
    pub summary: String,
    pub sections: Vec<String>,
    pub key_entities: KeyEntities,
    pub raw_html: String,
}

impl ArticleContent {
    /// Text handed to the model: the summary followed by the section names.
    pub fn generation_text(&self) -> String {
        format!("{} {}", self.summary, self.sections.join(" "))
    }
}

/// Accepts parseable http(s) URLs on a wikipedia.org host.
pub fn validate_url(raw: &str) -> bool {
    match Url::parse(raw.trim()) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url
                    .host_str()
                    .is_some_and(|host| host.contains("wikipedia.org"))
        }
        Err(e) => {
            tracing::debug!("URL validation error for {:?}: {}", raw, e);
            false
        }
    }
}

#[derive(Clone)]
pub struct WikiScraper {
    client: reqwest::Client,
}

impl WikiScraper {
    pub fn new(timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    /// Fetches and parses. Callers validate the URL first with
    /// [`validate_url`].
    pub async fn fetch_article(&self, url: &str) -> Result<ArticleContent, QuizError> {
        let html = match self.fetch_html(url).await {
            Ok(html) => {
                metrics::record_scrape("success");
                html
            }
            Err(e) => {
                metrics::record_scrape("error");
                tracing::error!("Failed to fetch {}: {}", url, e);
                return Err(QuizError::Scrape(e.to_string()));
            }
        };

        let article = parse_article(html);
        tracing::debug!(
            "Scraped {}: title={:?} sections={} summary_len={}",
            url,
            article.title,
            article.sections.len(),
            article.summary.len()
        );
        Ok(article)
    }

    async fn fetch_html(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

pub fn parse_article(raw_html: String) -> ArticleContent {
    ArticleContent {
        title: extract_title(&raw_html),
        summary: extract_summary(&raw_html),
        sections: extract_sections(&raw_html),
        key_entities: extract_key_entities(&raw_html),
        raw_html,
    }
}

pub fn extract_title(html: &str) -> String {
    FIRST_HEADING
        .captures(html)
        .map(|caps| collapse_whitespace(&text_content(&caps[1])))
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// First substantial paragraph of the article body.
pub fn extract_summary(html: &str) -> String {
    let Some(start) = html.find(r#"id="mw-content-text""#) else {
        return String::new();
    };

    PARAGRAPH
        .captures_iter(&html[start..])
        .map(|caps| text_content(&caps[1]).trim().to_string())
        .find(|text| text.chars().count() > MIN_SUMMARY_CHARS && !text.starts_with("Coordinates"))
        .map(|text| text.chars().take(MAX_SUMMARY_CHARS).collect())
        .unwrap_or_default()
}

pub fn extract_sections(html: &str) -> Vec<String> {
    let mut sections: Vec<String> = Vec::new();
    for caps in SECTION_HEADING.captures_iter(html).take(MAX_SECTIONS) {
        let inner = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        let text = text_content(inner).replace("[edit]", "");
        let text = collapse_whitespace(&text);
        if !text.is_empty() && !sections.contains(&text) {
            sections.push(text);
        }
    }
    sections
}

/// Sorts titled links into people, organizations and locations by keywords
/// in the link title.
pub fn extract_key_entities(html: &str) -> KeyEntities {
    let mut entities = KeyEntities::default();

    let titled_links = ANCHOR
        .captures_iter(html)
        .filter_map(|caps| {
            let title = TITLE_ATTR.captures(&caps[1])?;
            Some((
                text_content(&title[1]).to_lowercase(),
                collapse_whitespace(&text_content(&caps[2])),
            ))
        })
        .take(MAX_ENTITY_LINKS);

    for (title, text) in titled_links {
        let bucket = if ["birth", "death", "born"].iter().any(|k| title.contains(k)) {
            &mut entities.people
        } else if ["university", "company", "organizat"]
            .iter()
            .any(|k| title.contains(k))
        {
            &mut entities.organizations
        } else if ["country", "city", "town"].iter().any(|k| title.contains(k)) {
            &mut entities.locations
        } else {
            continue;
        };

        if !bucket.contains(&text) {
            bucket.push(text);
        }
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r##"<html><body>
<h1 id="firstHeading" class="firstHeading mw-first-heading"><span class="mw-page-title-main">Ada Lovelace</span></h1>
<div id="mw-content-text" class="mw-body-content">
  <p class="mw-empty-elt"></p>
  <p>Coordinates: somewhere that is long enough to pass the length check but must still be skipped because of its prefix.</p>
  <p><b>Augusta Ada King, Countess of Lovelace</b> (10 December 1815 &ndash; 27 November 1852) was an English mathematician and writer, chiefly known for her work on <a href="/wiki/Charles_Babbage" title="Charles Babbage (born 1791)">Charles Babbage</a>'s proposed mechanical general-purpose computer.</p>
  <p>Second paragraph.</p>
  <a href="/wiki/University_of_London" title="University of London">University of London</a>
  <a href="/wiki/London" title="Capital city of England">London</a>
  <a href="/wiki/London" title="Capital city of England">London</a>
  <a href="/wiki/Analytical_Engine">Analytical Engine</a>
  <div class="mw-heading mw-heading2"><h2 id="Biography">Biography</h2><span class="mw-editsection">[<a href="#">edit</a>]</span></div>
  <h3>Childhood <span>[edit]</span></h3>
  <h2>Biography</h2>
  <h2>Legacy</h2>
</div>
</body></html>"##;

    #[test]
    fn validates_wikipedia_urls() {
        assert!(validate_url("https://en.wikipedia.org/wiki/Ada_Lovelace"));
        assert!(validate_url("http://de.wikipedia.org/wiki/Berlin"));
        assert!(!validate_url("https://example.com/wiki/Ada_Lovelace"));
        assert!(!validate_url("ftp://en.wikipedia.org/wiki/Ada"));
        assert!(!validate_url("not a url"));
        assert!(!validate_url(""));
    }

    #[test]
    fn extracts_title() {
        assert_eq!(extract_title(PAGE), "Ada Lovelace");
        assert_eq!(extract_title("<html></html>"), "Unknown");
    }

    #[test]
    fn summary_skips_short_and_coordinate_paragraphs() {
        let summary = extract_summary(PAGE);
        assert!(summary.starts_with("Augusta Ada King"), "{summary}");
        assert!(summary.contains("1815 – 27 November 1852"));
        assert!(summary.contains("Charles Babbage's"));
        assert!(summary.chars().count() <= MAX_SUMMARY_CHARS);
    }

    #[test]
    fn summary_is_truncated() {
        let html = format!(
            r#"<div id="mw-content-text"><p>{}</p></div>"#,
            "word ".repeat(300)
        );
        assert_eq!(extract_summary(&html).chars().count(), MAX_SUMMARY_CHARS);
    }

    #[test]
    fn sections_are_cleaned_and_unique() {
        assert_eq!(
            extract_sections(PAGE),
            vec!["Biography", "Childhood", "Legacy"]
        );
    }

    #[test]
    fn entities_are_bucketed_by_link_title() {
        let entities = extract_key_entities(PAGE);
        assert_eq!(entities.people, vec!["Charles Babbage"]);
        assert_eq!(entities.organizations, vec!["University of London"]);
        assert_eq!(entities.locations, vec!["London"]);
    }

    #[test]
    fn generation_text_joins_summary_and_sections() {
        let article = ArticleContent {
            summary: "Summary.".into(),
            sections: vec!["History".into(), "Legacy".into()],
            ..Default::default()
        };
        assert_eq!(article.generation_text(), "Summary. History Legacy");
    }

    #[tokio::test]
    async fn fetches_and_parses_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Ada_Lovelace"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let scraper = WikiScraper::new(5).unwrap();
        let article = scraper
            .fetch_article(&format!("{}/wiki/Ada_Lovelace", server.uri()))
            .await
            .unwrap();

        assert_eq!(article.title, "Ada Lovelace");
        assert_eq!(article.raw_html, PAGE);
    }

    #[tokio::test]
    async fn http_errors_become_scrape_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let scraper = WikiScraper::new(5).unwrap();
        let err = scraper
            .fetch_article(&format!("{}/wiki/Missing", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::Scrape(_)));
    }
}
