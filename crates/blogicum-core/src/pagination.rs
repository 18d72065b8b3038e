//! Page-number pagination for listing pages.

use std::str::FromStr;

use serde::Serialize;

/// Default number of posts (and comments) per page.
pub const PAGE_SIZE: u64 = 10;

/// Which page the client asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumber {
    /// A 1-based page number.
    Number(u64),
    /// Whatever the last page turns out to be.
    Last,
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::Number(1)
    }
}

/// The `page` query value was neither a positive integer nor `last`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid page: {0}")]
pub struct InvalidPage(pub String);

impl FromStr for PageNumber {
    type Err = InvalidPage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "last" {
            return Ok(Self::Last);
        }
        match s.parse::<u64>() {
            Ok(n) if n > 0 => Ok(Self::Number(n)),
            _ => Err(InvalidPage(s.to_string())),
        }
    }
}

/// A request for one page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: PageNumber,
    pub size: u64,
}

impl PageRequest {
    pub fn new(number: PageNumber, size: u64) -> Self {
        Self {
            number,
            size: size.max(1),
        }
    }

    pub fn first(size: u64) -> Self {
        Self::new(PageNumber::Number(1), size)
    }

    /// Resolve the concrete page number against `total` matching items.
    ///
    /// Returns `None` when the page lies past the end. An empty listing still
    /// has a (blank) first page.
    pub fn resolve(&self, total: u64) -> Option<u64> {
        let pages = num_pages(total, self.size);
        match self.number {
            PageNumber::Last => Some(pages),
            PageNumber::Number(n) if n >= 1 && n <= pages => Some(n),
            PageNumber::Number(_) => None,
        }
    }
}

/// Number of pages needed for `total` items, never less than one.
pub fn num_pages(total: u64, size: u64) -> u64 {
    total.div_ceil(size.max(1)).max(1)
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub size: u64,
    pub total_items: u64,
    pub num_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, number: u64, size: u64, total_items: u64) -> Self {
        Self {
            items,
            number,
            size,
            total_items,
            num_pages: num_pages(total_items, size),
        }
    }

    /// Offset of the first item of page `number` (1-based).
    pub fn offset(number: u64, size: u64) -> u64 {
        number.saturating_sub(1) * size
    }

    /// Cut one page out of an already ordered, fully materialized listing.
    pub fn from_vec(all: Vec<T>, request: PageRequest) -> Option<Self> {
        let total = all.len() as u64;
        let number = request.resolve(total)?;
        let items = all
            .into_iter()
            .skip(Self::offset(number, request.size) as usize)
            .take(request.size as usize)
            .collect();
        Some(Self::new(items, number, request.size, total))
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_items: self.total_items,
            num_pages: self.num_pages,
        }
    }
}
