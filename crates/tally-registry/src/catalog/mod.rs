//! Project listing from the simple index

use async_trait::async_trait;
use tally_core::error::TallyError;

use crate::RegistryResult;

/// Source of the full, ordered list of project names
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_names(&self) -> RegistryResult<Vec<String>>;
}

/// Extract project names from a simple index page.
///
/// Every `<a>` element is a project. Its text is the name; an anchor without
/// text falls back to the last segment of its `href`.
pub fn parse_simple_index(body: &[u8]) -> RegistryResult<Vec<String>> {
    let text = std::str::from_utf8(body).map_err(|e| TallyError::CatalogParse {
        message: format!("listing is not valid UTF-8: {}", e),
    })?;

    let dom = tl::parse(text, tl::ParserOptions::default()).map_err(|e| TallyError::CatalogParse {
        message: format!("listing is not valid HTML: {}", e),
    })?;
    let parser = dom.parser();

    let names: Vec<String> = dom
        .nodes()
        .iter()
        .filter_map(|node| node.as_tag())
        .filter(|tag| tag.name().as_bytes() == b"a")
        .filter_map(|anchor| anchor_name(anchor, parser))
        .collect();

    if names.is_empty() && !text.trim().is_empty() {
        return Err(TallyError::CatalogParse {
            message: "no project links found".to_string(),
        });
    }

    Ok(names)
}

fn anchor_name(anchor: &tl::HTMLTag, parser: &tl::Parser) -> Option<String> {
    let inner = anchor.inner_text(parser);
    let name = inner.trim();
    if !name.is_empty() {
        return Some(name.to_string());
    }

    let href = anchor.attributes().get("href").flatten()?.as_utf8_str();
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
