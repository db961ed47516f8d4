use serde::Serialize;
use std::collections::BTreeMap;

use crate::{CoreError, CoreResult};

pub const MAX_PAGE_SIZE: u32 = 100;
const INVALID_PAGE: &str = "Invalid page.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Reads `page` and `page_size`; a malformed page number is a 404.
    pub fn from_query(params: &BTreeMap<String, String>, default_page_size: u32) -> CoreResult<Self> {
        let page = match params.get("page") {
            None => 1,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(CoreError::NotFound(INVALID_PAGE.to_string())),
            },
        };
        let page_size = match params.get("page_size") {
            None => default_page_size,
            Some(raw) => raw.trim().parse::<u32>().unwrap_or(default_page_size),
        };
        Ok(Self::new(page, page_size))
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// The first page always exists; any later page must start inside `count`.
    pub fn new(request: PageRequest, count: u64, results: Vec<T>) -> CoreResult<Self> {
        if request.page > 1 && request.offset() >= count {
            return Err(CoreError::NotFound(INVALID_PAGE.to_string()));
        }
        let has_next = request.offset() + (results.len() as u64) < count;
        Ok(Self {
            count,
            page: request.page,
            page_size: request.page_size,
            next: has_next.then_some(request.page + 1),
            previous: (request.page > 1).then(|| request.page - 1),
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults_and_clamping() {
        let req = PageRequest::from_query(&query(&[]), 20).unwrap();
        assert_eq!(req, PageRequest { page: 1, page_size: 20 });

        let req = PageRequest::from_query(&query(&[("page", "3"), ("page_size", "500")]), 20).unwrap();
        assert_eq!(req.page_size, MAX_PAGE_SIZE);
        assert_eq!(req.offset(), 200);
    }

    #[test]
    fn test_bad_page_is_not_found() {
        assert!(matches!(
            PageRequest::from_query(&query(&[("page", "zero")]), 20),
            Err(CoreError::NotFound(_))
        ));
        assert!(PageRequest::from_query(&query(&[("page", "0")]), 20).is_err());
    }

    #[test]
    fn test_page_links() {
        let first = Page::new(PageRequest::new(1, 2), 5, vec![1, 2]).unwrap();
        assert_eq!(first.next, Some(2));
        assert_eq!(first.previous, None);

        let last = Page::new(PageRequest::new(3, 2), 5, vec![5]).unwrap();
        assert_eq!(last.next, None);
        assert_eq!(last.previous, Some(2));

        let empty = Page::<i32>::new(PageRequest::new(1, 2), 0, vec![]).unwrap();
        assert_eq!(empty.count, 0);

        assert!(Page::<i32>::new(PageRequest::new(4, 2), 5, vec![]).is_err());
    }
}
