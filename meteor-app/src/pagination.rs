//! Pagination for the camera table (5 rows per page)

/// Page size constant for the camera table
pub const PAGE_SIZE: usize = 5;

/// Pagination metadata calculated from total rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Total number of pages
    pub total_pages: usize,
    /// Index of the first row on this page
    pub offset: usize,
}

/// Calculate pagination metadata from total rows and requested page
///
/// Ensures page is within valid bounds [1, total_pages]
///
/// # Examples
/// ```
/// use meteor_app::pagination::calculate_pagination;
///
/// // 12 rows = 3 pages (5 + 5 + 2)
/// let p = calculate_pagination(12, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 5);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(12, 99);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 10);
/// ```
pub fn calculate_pagination(total_rows: usize, requested_page: usize) -> Pagination {
    let total_pages = total_rows.div_ceil(PAGE_SIZE);
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * PAGE_SIZE;

    Pagination {
        page,
        total_pages,
        offset,
    }
}

impl Pagination {
    /// Slice of `rows` on this page
    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        let start = self.offset.min(rows.len());
        let end = (self.offset + PAGE_SIZE).min(rows.len());
        &rows[start..end]
    }
}
