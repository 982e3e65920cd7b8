//! Page-link computation for paginated listings.

/// Upper bound on the page count a listing can report.
pub const MAX_PAGES: u32 = 1_000;

/// Position within a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
}

/// One numbered link in the pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLink {
    pub page: u32,
    pub active: bool,
}

impl Pagination {
    /// `total_pages` is capped at [`MAX_PAGES`].
    #[must_use]
    pub const fn new(current_page: u32, total_pages: u32) -> Self {
        Self {
            current_page,
            total_pages: if total_pages > MAX_PAGES {
                MAX_PAGES
            } else {
                total_pages
            },
        }
    }

    /// Whether a control is rendered at all.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.total_pages > 1
    }

    /// Target of the "previous" link, `None` on the first page.
    #[must_use]
    pub const fn previous(&self) -> Option<u32> {
        if self.current_page > 1 {
            Some(self.current_page - 1)
        } else {
            None
        }
    }

    /// Target of the "next" link, `None` on the last page.
    #[must_use]
    pub const fn next(&self) -> Option<u32> {
        if self.current_page < self.total_pages {
            Some(self.current_page + 1)
        } else {
            None
        }
    }

    /// Numbered links `1..=total_pages`.
    #[must_use]
    pub fn links(&self) -> Vec<PageLink> {
        (1..=self.total_pages)
            .map(|page| PageLink {
                page,
                active: page == self.current_page,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page_is_hidden() {
        assert!(!Pagination::new(1, 0).is_visible());
        assert!(!Pagination::new(1, 1).is_visible());
        assert!(Pagination::new(1, 2).is_visible());
    }

    #[test]
    fn test_edges() {
        let first = Pagination::new(1, 3);
        assert_eq!(first.previous(), None);
        assert_eq!(first.next(), Some(2));

        let last = Pagination::new(3, 3);
        assert_eq!(last.previous(), Some(2));
        assert_eq!(last.next(), None);
    }

    #[test]
    fn test_links_mark_current_page() {
        let links = Pagination::new(2, 3).links();
        assert_eq!(
            links,
            vec![
                PageLink { page: 1, active: false },
                PageLink { page: 2, active: true },
                PageLink { page: 3, active: false },
            ]
        );
    }

    #[test]
    fn test_page_count_is_capped() {
        let pagination = Pagination::new(1, u32::MAX);
        assert_eq!(pagination.total_pages, MAX_PAGES);
        assert_eq!(pagination.links().len(), MAX_PAGES as usize);
        assert_eq!(Pagination::new(MAX_PAGES, u32::MAX).next(), None);
    }
}
