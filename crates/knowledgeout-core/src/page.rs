//! Pagination primitives

use serde::Serialize;

/// Sortable columns for question listings.
///
/// Sort keys are whitelisted here so no caller-supplied string ever reaches
/// an ORDER BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAt,
    ViewCount,
}

impl SortKey {
    /// Parse the wire name (`createdAt`, `viewCount`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "createdAt" => Some(Self::CreatedAt),
            "viewCount" => Some(Self::ViewCount),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" | "ASC" => Some(Self::Asc),
            "desc" | "DESC" => Some(Self::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sort {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Sort {
    /// Parse a `key,dir` pair as sent by the frontend, e.g. `createdAt,desc`.
    /// Unknown keys or directions fall back to the default ordering.
    pub fn parse(s: &str) -> Self {
        let mut parts = s.splitn(2, ',');
        let key = parts.next().and_then(SortKey::parse).unwrap_or_default();
        let direction = parts
            .next()
            .and_then(SortDirection::parse)
            .unwrap_or_default();
        Self { key, direction }
    }
}

/// A page request: 0-based index, page size, sort order.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Sort,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort: Sort::default(),
        }
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, 20)
    }
}

/// One page of results plus the total element count across all pages.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        let total_pages = if request.size == 0 {
            0
        } else {
            total_elements.div_ceil(u64::from(request.size)) as u32
        };
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_parsing() {
        let sort = Sort::parse("viewCount,asc");
        assert_eq!(sort.key, SortKey::ViewCount);
        assert_eq!(sort.direction, SortDirection::Asc);

        // Unknown key falls back to default
        let sort = Sort::parse("bogus,asc");
        assert_eq!(sort.key, SortKey::CreatedAt);

        // Missing direction defaults to descending
        let sort = Sort::parse("createdAt");
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn page_math() {
        let req = PageRequest::new(2, 10);
        assert_eq!(req.offset(), 20);

        let page = Page::new(vec![1, 2, 3], &req, 23);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_elements, 23);
    }
}
