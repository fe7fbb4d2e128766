//! Query Builder pagination operations

use serde_json::Value;

use super::builder::{QueryBuilder, MAX_ROWS};
use super::types::*;
use crate::error::ModelResult;
use crate::pagination::{CursorPaginator, PageUrl, Paginator};

impl<M: Hydrate> QueryBuilder<M> {
    fn page_url(&self) -> PageUrl {
        PageUrl::from_request(self.db.as_ref().and_then(|db| db.request()))
            .without(&["page", "cursor"])
    }

    async fn run_paginate(&self, per_page: u64, page: u64) -> ModelResult<Paginator<M>> {
        // both queries run on clones so neither sees the other's changes
        let total = self.clone().count().await?;

        let offset = (page - 1).saturating_mul(per_page).min(MAX_ROWS);
        let mut window = self.clone();
        window.state.limit = Some(per_page);
        window.state.offset = Some(offset);
        let items = window.get().await?;

        Ok(Paginator::new(items, total, per_page, page, self.page_url()))
    }

    /// One page of results plus the total row count. `per_page` and `page`
    /// are clamped to at least 1, and `per_page` to at most `i64::MAX`.
    pub async fn paginate(&mut self, per_page: u64, page: u64) -> ModelResult<Paginator<M>> {
        let result = self.run_paginate(per_page.clamp(1, MAX_ROWS), page.max(1)).await;
        self.reset();
        result
    }

    /// Page of rows after `cursor`, ordered by the key column
    pub async fn cursor_paginate(
        &mut self,
        per_page: u64,
        cursor: Option<Value>,
    ) -> ModelResult<CursorPaginator<M>> {
        self.cursor_paginate_by(M::key_name(), per_page, cursor).await
    }

    async fn run_cursor_paginate(
        &self,
        column: &str,
        per_page: u64,
        cursor: Option<Value>,
    ) -> ModelResult<CursorPaginator<M>> {
        let mut query = self.clone();
        if let Some(cursor) = cursor.filter(|c| !c.is_null()) {
            query.push_basic(column, ">", cursor, Boolean::And);
        }
        query.state.orders.clear();
        query = query.order_by(column, "asc");
        // one extra row tells whether another page exists
        query.state.limit = Some(per_page.saturating_add(1).min(MAX_ROWS));
        query.state.offset = None;

        let mut items = query.get().await?;
        let next_cursor = if items.len() as u64 > per_page {
            items.truncate(per_page as usize);
            let next = items.last().and_then(|item| item.column_value(column));
            if next.is_none() {
                tracing::warn!(column = column, "cursor column missing from selected columns");
            }
            next
        } else {
            None
        };

        Ok(CursorPaginator::new(items, per_page, next_cursor, self.page_url()))
    }

    /// Cursor pagination over an explicit, unique, ascending column
    pub async fn cursor_paginate_by(
        &mut self,
        column: &str,
        per_page: u64,
        cursor: Option<Value>,
    ) -> ModelResult<CursorPaginator<M>> {
        let result = self
            .run_cursor_paginate(column, per_page.clamp(1, MAX_ROWS), cursor)
            .await;
        self.reset();
        result
    }
}
