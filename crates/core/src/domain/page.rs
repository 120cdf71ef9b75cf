use serde::{Deserialize, Serialize};

use super::stats::Stats;
use super::todo::Todo;

/// Link descriptor emitted by the server paginator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub url: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub active: bool,
}

/// Pagination metadata of a listing page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default = "first_page")]
    pub last_page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub prev_page_url: Option<String>,
    #[serde(default)]
    pub next_page_url: Option<String>,
    #[serde(default)]
    pub links: Vec<PageLink>,
}

fn first_page() -> u32 {
    1
}

/// One page of todos as served, together with the server-computed counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoPage {
    pub items: Vec<Todo>,
    pub meta: PageMeta,
    pub stats: Stats,
}
