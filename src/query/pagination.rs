//! Paginated response envelope.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub item_count: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub items_per_page: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLinks {
    pub first: String,
    pub previous: String,
    pub next: String,
    pub last: String,
}

/// One page of data plus the metadata and navigation links describing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub meta: PaginationMeta,
    pub links: PaginationLinks,
    pub data: Vec<T>,
}

impl<T> Paginated<T> {
    /// Wrap one page of `data` taken from `total_items` rows.
    ///
    /// Pages are zero-based. `total_pages` is `ceil(total_items / limit)`; the
    /// `previous` link stays on the first page and `next` never points past the
    /// last page.
    pub fn from_window(data: Vec<T>, total_items: u64, page: u64, limit: u64, resource_url: &str) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total_items.div_ceil(limit)
        };

        let first = format!("{resource_url}?limit={limit}");
        let previous = match page.checked_sub(1) {
            Some(prev) => format!("{resource_url}?page={prev}&limit={limit}"),
            None => first.clone(),
        };
        let next = format!("{resource_url}?page={}&limit={limit}", page.saturating_add(1).min(total_pages));
        let last = format!("{resource_url}?page={total_pages}&limit={limit}");

        Self {
            meta: PaginationMeta {
                item_count: data.len() as u64,
                total_items,
                total_pages,
                current_page: page,
                items_per_page: limit,
            },
            links: PaginationLinks {
                first,
                previous,
                next,
                last,
            },
            data,
        }
    }

    /// Convert the page contents while keeping meta and links.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Paginated<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        let data = self.data.into_iter().map(f).collect::<Result<Vec<_>, _>>()?;
        Ok(Paginated {
            meta: self.meta,
            links: self.links,
            data,
        })
    }
}
