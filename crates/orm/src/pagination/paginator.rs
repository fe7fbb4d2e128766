//! Offset-based paginator

use std::ops::Index;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::links::{self, Link};
use super::request::PageUrl;
use crate::query::Hydrate;

/// One page of results plus the numbers needed to navigate the rest.
///
/// Read-only once built: there is `Index` but no `IndexMut`.
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    items: Vec<T>,
    total: u64,
    per_page: u64,
    current_page: u64,
    last_page: u64,
    url: PageUrl,
    links: Vec<Link>,
}

impl<T> Paginator<T> {
    /// `per_page` and `current_page` are clamped to at least 1. `url` should
    /// already have its `page` parameter removed.
    pub fn new(items: Vec<T>, total: u64, per_page: u64, current_page: u64, url: PageUrl) -> Self {
        let per_page = per_page.max(1);
        let current_page = current_page.max(1);
        let last_page = total.div_ceil(per_page).max(1);
        let links = links::build(&url, current_page, last_page);

        Self {
            items,
            total,
            per_page,
            current_page,
            last_page,
            url,
            links,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn last_page(&self) -> u64 {
        self.last_page
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Base URL without the query string
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// URL of an arbitrary page
    pub fn url(&self, page: u64) -> String {
        self.url.with("page", &page.max(1).to_string())
    }

    pub fn first_page_url(&self) -> String {
        self.url(1)
    }

    pub fn last_page_url(&self) -> String {
        self.url(self.last_page)
    }

    pub fn next_page_url(&self) -> Option<String> {
        self.has_more_pages().then(|| self.url(self.current_page + 1))
    }

    pub fn previous_page_url(&self) -> Option<String> {
        (self.current_page > 1).then(|| self.url(self.current_page - 1))
    }

    /// 1-based position of the first item on this page
    pub fn from(&self) -> Option<u64> {
        (!self.items.is_empty()).then(|| (self.current_page - 1) * self.per_page + 1)
    }

    /// 1-based position of the last item on this page
    pub fn to(&self) -> Option<u64> {
        self.from().map(|from| from + self.items.len() as u64 - 1)
    }

    pub fn has_pages(&self) -> bool {
        self.last_page > 1
    }

    pub fn on_first_page(&self) -> bool {
        self.current_page <= 1
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> Index<usize> for Paginator<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a Paginator<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> IntoIterator for Paginator<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<T: Hydrate> Serialize for Paginator<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let data: Vec<_> = self.items.iter().map(Hydrate::to_row).collect();

        let mut state = serializer.serialize_struct("Paginator", 13)?;
        state.serialize_field("current_page", &self.current_page)?;
        state.serialize_field("data", &data)?;
        state.serialize_field("first_page_url", &self.first_page_url())?;
        state.serialize_field("from", &self.from())?;
        state.serialize_field("last_page", &self.last_page)?;
        state.serialize_field("last_page_url", &self.last_page_url())?;
        state.serialize_field("links", &self.links)?;
        state.serialize_field("next_page_url", &self.next_page_url())?;
        state.serialize_field("path", self.path())?;
        state.serialize_field("per_page", &self.per_page)?;
        state.serialize_field("prev_page_url", &self.previous_page_url())?;
        state.serialize_field("to", &self.to())?;
        state.serialize_field("total", &self.total)?;
        state.end()
    }
}
