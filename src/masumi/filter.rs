//! Client-side agent filtering, pagination and price display

use super::registry::matches_support_keywords;
use super::types::RegistryAgent;

/// Agents per page in listings
pub const PAGE_SIZE: usize = 10;

const LOVELACE_PER_ADA: f64 = 1_000_000.0;

/// Extra name words that count as support agents
const SUPPORT_NAME_WORDS: [&str; 3] = ["website", "email", "meeting"];

/// Filter settings for agent listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentFilter {
    /// Case-insensitive text matched against name, description,
    /// capability name and tags
    pub search: Option<String>,
    /// Keep only support-like agents
    pub support_only: bool,
}

impl AgentFilter {
    /// Apply the filter; only online agents survive
    ///
    /// # Examples
    ///
    /// ```
    /// use helpdesk::masumi::AgentFilter;
    ///
    /// let filter = AgentFilter { search: Some("faq".to_string()), support_only: true };
    /// assert!(filter.apply(&[]).is_empty());
    /// ```
    pub fn apply(&self, agents: &[RegistryAgent]) -> Vec<RegistryAgent> {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        agents
            .iter()
            .filter(|a| !self.support_only || is_support_like(a))
            .filter(|a| match &needle {
                Some(n) => matches_search(a, n),
                None => true,
            })
            .filter(|a| a.is_online())
            .cloned()
            .collect()
    }
}

fn is_support_like(agent: &RegistryAgent) -> bool {
    let name = agent.name.to_lowercase();
    matches_support_keywords(agent) || SUPPORT_NAME_WORDS.iter().any(|w| name.contains(w))
}

fn matches_search(agent: &RegistryAgent, needle: &str) -> bool {
    agent.name.to_lowercase().contains(needle)
        || agent.description.to_lowercase().contains(needle)
        || agent.capability_name().to_lowercase().contains(needle)
        || agent.tags.iter().any(|t| t.to_lowercase().contains(needle))
}

/// One-based pagination over a filtered list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total_items: usize,
    page_size: usize,
    current: usize,
}

impl Paginator {
    pub fn new(total_items: usize, page_size: usize) -> Self {
        Self {
            total_items,
            page_size: page_size.max(1),
            current: 1,
        }
    }

    /// `ceil(total / size)`; zero for an empty list
    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size)
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Jump to a page, clamped into range
    pub fn go_to(&mut self, page: usize) {
        self.current = page.clamp(1, self.total_pages().max(1));
    }

    pub fn next(&mut self) {
        self.go_to(self.current + 1);
    }

    pub fn previous(&mut self) {
        self.go_to(self.current.saturating_sub(1));
    }

    /// Items of a 1-based page; out-of-range pages are empty
    pub fn page<'a, T>(&self, items: &'a [T], page: usize) -> &'a [T] {
        if page == 0 {
            return &[];
        }
        let start = (page - 1) * self.page_size;
        if start >= items.len() {
            return &[];
        }
        let end = (start + self.page_size).min(items.len());
        &items[start..end]
    }

    /// Items of the current page
    pub fn current_page<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        self.page(items, self.current)
    }
}

/// Human price of an agent
///
/// # Examples
///
/// ```
/// use helpdesk::masumi::filter::format_amount;
///
/// assert_eq!(format_amount("2500000", "lovelace"), "2.5 ADA");
/// assert_eq!(format_amount("10", "USDM"), "10 USDM");
/// ```
pub fn price_display(agent: &RegistryAgent) -> String {
    match agent.first_price() {
        Some(price) => format_amount(&price.amount, &price.unit),
        None => "Free".to_string(),
    }
}

/// Format an integer amount string with its unit; unparsable amounts read as 0
pub fn format_amount(amount: &str, unit: &str) -> String {
    let value: i64 = amount.trim().parse().unwrap_or(0);
    if unit.is_empty() || unit == "lovelace" {
        format!("{} ADA", value as f64 / LOVELACE_PER_ADA)
    } else {
        format!("{} {}", value, unit)
    }
}
