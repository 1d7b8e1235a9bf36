#![forbid(unsafe_code)]

//! Index-based pagination.
//!
//! A single global `index` into the full list is the source of truth; the
//! page is derived as `index / page_size`. Changing the list length clamps
//! the index instead of leaving it past the end.

use std::ops::Range;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginator {
    len: usize,
    page_size: usize,
    index: usize,
}

impl Default for Paginator {
    /// Empty list, pages of 10.
    fn default() -> Self {
        Self::new(0, 10)
    }
}

impl Paginator {
    /// `page_size` of zero is treated as one.
    #[must_use]
    pub fn new(len: usize, page_size: usize) -> Self {
        Self {
            len,
            page_size: page_size.max(1),
            index: 0,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.index / self.page_size
    }

    /// Number of pages; zero for an empty list.
    #[must_use]
    pub const fn page_count(&self) -> usize {
        self.len.div_ceil(self.page_size)
    }

    fn last_index(&self) -> usize {
        self.len.saturating_sub(1)
    }

    /// Resize the list, clamping the index into range.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        self.index = self.index.min(self.last_index());
    }

    /// Change the page size, keeping the current item on screen.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
    }

    /// Jump to `index`, clamped into range.
    pub fn set_index(&mut self, index: usize) {
        self.index = index.min(self.last_index());
    }

    /// Jump to the first item of `page`, clamped to the last page.
    pub fn goto_page(&mut self, page: usize) {
        let last_page = self.page_count().saturating_sub(1);
        self.set_index(page.min(last_page) * self.page_size);
    }

    /// Returns whether the page changed.
    pub fn next_page(&mut self) -> bool {
        let page = self.current_page();
        if page + 1 >= self.page_count() {
            return false;
        }
        self.goto_page(page + 1);
        true
    }

    /// Returns whether the page changed.
    pub fn prev_page(&mut self) -> bool {
        let page = self.current_page();
        if page == 0 {
            return false;
        }
        self.goto_page(page - 1);
        true
    }

    pub fn next_item(&mut self) {
        self.set_index(self.index.saturating_add(1));
    }

    pub fn prev_item(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// Index range of the current page.
    #[must_use]
    pub fn page_range(&self) -> Range<usize> {
        let start = (self.current_page() * self.page_size).min(self.len);
        start..(start + self.page_size).min(self.len)
    }

    /// Slice of `items` on the current page.
    #[must_use]
    pub fn visible<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.page_range();
        let end = range.end.min(items.len());
        items.get(range.start.min(end)..end).unwrap_or(&[])
    }
}
