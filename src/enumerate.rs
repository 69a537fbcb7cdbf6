use anyhow::Context as _;
use scraper::{ElementRef, Html, Selector};

use crate::formats::{Config, Subsection};

pub fn progress_url(root_url: &str, course_url: &str) -> String {
    format!("{root_url}/courses/{course_url}/progress")
}

pub fn fetch_subsections(
    client: &reqwest::blocking::Client,
    config: &Config,
) -> anyhow::Result<Vec<Subsection>> {
    let url = progress_url(&config.root_url, &config.course_url);
    tracing::info!(%url, "fetching progress page");

    let response = client
        .get(&url)
        .send()
        .with_context(|| format!("GET {url}"))?
        .error_for_status()
        .with_context(|| format!("GET {url}"))?;
    let html = crate::session::read_text(response).context("read progress page body")?;

    let subsections = parse_subsections(&html).context("parse progress page")?;
    if subsections.is_empty() {
        tracing::warn!(%url, "no subsections found; is the session cookie still valid?");
    } else {
        tracing::info!(count = subsections.len(), "enumerated subsections");
    }
    Ok(subsections)
}

/// Collects `{title, href}` from `.sections > * h3 a`, in document order.
///
/// Children of a `.sections` container without a linked heading are
/// decorations and are skipped.
pub fn parse_subsections(html: &str) -> anyhow::Result<Vec<Subsection>> {
    let sections = selector(".sections")?;
    let heading = selector("h3")?;
    let link = selector("a")?;

    let document = Html::parse_document(html);
    let mut subsections = Vec::new();

    for section in document.select(&sections) {
        for child in section.children().filter_map(ElementRef::wrap) {
            let Some(h3) = child.select(&heading).next() else {
                continue;
            };
            let Some(href) = h3
                .select(&link)
                .next()
                .and_then(|anchor| anchor.value().attr("href"))
            else {
                continue;
            };

            let title = h3.text().collect::<String>().trim().to_owned();
            subsections.push(Subsection {
                title,
                url: href.to_owned(),
            });
        }
    }

    Ok(subsections)
}

fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow::anyhow!("parse css selector {css:?}: {err}"))
}
