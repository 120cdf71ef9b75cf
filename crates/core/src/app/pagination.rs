use tracing::debug;
use url::Url;

use crate::domain::{ListQuery, PageLink, PageMeta};

/// What a paginator link stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Previous,
    Next,
    Ellipsis,
    Numbered,
}

impl LinkKind {
    pub fn of(label: &str) -> Self {
        let label = label.trim();
        let lower = label.to_ascii_lowercase();
        if lower.contains("pagination.previous") || lower.contains("&laquo;") {
            Self::Previous
        } else if lower.contains("pagination.next") || lower.contains("&raquo;") {
            Self::Next
        } else if label == "..." {
            Self::Ellipsis
        } else {
            Self::Numbered
        }
    }
}

/// A numbered page button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageButton {
    pub label: String,
    pub active: bool,
    /// Paginator url behind the button
    pub url: Option<String>,
    /// `None` renders a disabled button
    pub target: Option<ListQuery>,
}

/// Build the listing request a paginator url leads to, keeping the active
/// search and status. Null or unparseable urls lead nowhere; a url without
/// a `page` parameter leads to the first page.
pub fn navigation_for(url: Option<&str>, active: &ListQuery) -> Option<ListQuery> {
    let url = url?;
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!("Ignoring paginator url {url:?}: {err}");
            return None;
        }
    };

    let page = match parsed.query_pairs().find(|(key, _)| key == "page") {
        None => None,
        Some((_, value)) => match value.parse::<u32>() {
            Ok(page) => Some(page),
            Err(_) => {
                debug!("Ignoring paginator url {url:?}: bad page {value:?}");
                return None;
            }
        },
    };

    Some(ListQuery {
        search: active.search.clone(),
        status: active.status,
        page,
    })
}

/// Navigation for a link descriptor
pub fn follow(link: &PageLink, active: &ListQuery) -> Option<ListQuery> {
    navigation_for(link.url.as_deref(), active)
}

pub fn previous(meta: &PageMeta, active: &ListQuery) -> Option<ListQuery> {
    navigation_for(meta.prev_page_url.as_deref(), active)
}

pub fn next(meta: &PageMeta, active: &ListQuery) -> Option<ListQuery> {
    navigation_for(meta.next_page_url.as_deref(), active)
}

/// Numbered buttons only; previous/next/ellipsis markers are left out
pub fn numbered_buttons(meta: &PageMeta, active: &ListQuery) -> Vec<PageButton> {
    meta.links
        .iter()
        .filter(|link| LinkKind::of(&link.label) == LinkKind::Numbered)
        .map(|link| PageButton {
            label: link.label.trim().to_string(),
            active: link.active,
            url: link.url.clone(),
            target: follow(link, active),
        })
        .collect()
}
