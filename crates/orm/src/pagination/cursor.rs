//! Cursor-based paginator

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;

use super::request::PageUrl;
use crate::query::Hydrate;

/// A page fetched by key position instead of offset. No total is computed.
#[derive(Debug, Clone)]
pub struct CursorPaginator<T> {
    items: Vec<T>,
    per_page: u64,
    next_cursor: Option<Value>,
    url: PageUrl,
}

impl<T> CursorPaginator<T> {
    /// `url` should already have its `cursor` and `page` parameters removed
    pub fn new(items: Vec<T>, per_page: u64, next_cursor: Option<Value>, url: PageUrl) -> Self {
        Self {
            items,
            per_page: per_page.max(1),
            next_cursor,
            url,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn next_cursor(&self) -> Option<&Value> {
        self.next_cursor.as_ref()
    }

    pub fn has_more_pages(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn next_page_url(&self) -> Option<String> {
        self.next_cursor.as_ref().map(|cursor| {
            let cursor = match cursor {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            self.url.with("cursor", &cursor)
        })
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

impl<'a, T> IntoIterator for &'a CursorPaginator<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Hydrate> Serialize for CursorPaginator<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let data: Vec<_> = self.items.iter().map(Hydrate::to_row).collect();

        let mut state = serializer.serialize_struct("CursorPaginator", 5)?;
        state.serialize_field("data", &data)?;
        state.serialize_field("path", self.path())?;
        state.serialize_field("per_page", &self.per_page)?;
        state.serialize_field("next_cursor", &self.next_cursor)?;
        state.serialize_field("next_page_url", &self.next_page_url())?;
        state.end()
    }
}
