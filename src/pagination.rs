use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Keeps `offset()` representable for every accepted page size.
pub const MAX_PAGE_NUMBER: i64 = i64::MAX / MAX_PAGE_SIZE;

/// `?pageNumber=&pageSize=`. Kept as strings so junk falls back to the
/// defaults instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page_number: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        (self.page_number - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

impl From<PageQuery> for PageRequest {
    fn from(q: PageQuery) -> Self {
        let parse = |raw: Option<String>| {
            raw.and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|n| *n >= 1)
        };
        Self {
            page_number: parse(q.page_number).unwrap_or(1).min(MAX_PAGE_NUMBER),
            page_size: parse(q.page_size)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
        }
    }
}

#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page_number: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(req: PageRequest, total: i64) -> Self {
        Self {
            total,
            page_number: req.page_number,
            page_size: req.page_size,
            total_pages: (total + req.page_size - 1) / req.page_size,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> PageResponse<T> {
    pub fn new(req: PageRequest, page: Page<T>) -> Self {
        Self {
            success: true,
            pagination: PageMeta::new(req, page.total),
            data: page.items,
        }
    }
}
