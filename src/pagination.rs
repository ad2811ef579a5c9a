//! Page arithmetic for paginated command replies.

use serde::Serialize;

/// One page of a listing of `total` items.
///
/// `start..end` is the slice of the listing shown on `current_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: usize,
    pub total_page: usize,
    #[serde(skip)]
    start: usize,
    #[serde(skip)]
    end: usize,
}

impl Pagination {
    /// Page `page` (1-based) of `total` items, `limit` per page.
    ///
    /// Out-of-range pages are clamped. A `limit` of zero puts everything on
    /// one page. An empty listing has zero pages and an empty range.
    pub fn new(page: i64, limit: usize, total: usize) -> Self {
        if total == 0 {
            return Self {
                current_page: 1,
                total_page: 0,
                start: 0,
                end: 0,
            };
        }

        let limit = if limit == 0 { total } else { limit };
        let total_page = total.div_ceil(limit);
        let current_page = usize::try_from(page)
            .unwrap_or(0)
            .clamp(1, total_page);

        let start = (current_page - 1) * limit;
        let end = (start + limit).min(total);

        Self {
            current_page,
            total_page,
            start,
            end,
        }
    }

    /// Index of the first item on this page.
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the index of the last item on this page.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}
