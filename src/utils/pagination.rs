use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Slices an already-materialized result set. The store is in-memory, so
/// pagination happens after filtering rather than in a query.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let total = items.len();
    let pages = total.div_ceil(per_page);
    let start = (page - 1).saturating_mul(per_page).min(total);
    let end = (start + per_page).min(total);
    let has_next = end < total;

    let items = items
        .into_iter()
        .skip(start)
        .take(end - start)
        .collect();

    Page {
        items,
        total,
        page,
        per_page,
        pages,
        has_prev: page > 1,
        has_next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_page_has_both_neighbors() {
        let page = paginate((0..25).collect::<Vec<_>>(), 2, 10);
        assert_eq!(page.items, (10..20).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
        assert_eq!(page.pages, 3);
        assert!(page.has_prev);
        assert!(page.has_next);
    }

    #[test]
    fn page_past_the_end_is_empty_not_panicking() {
        let page = paginate(vec![1, 2, 3], 5, 10);
        assert!(page.items.is_empty());
        assert!(page.has_prev);
        assert!(!page.has_next);
    }

    #[test]
    fn zero_per_page_is_clamped() {
        let page = paginate(vec![1, 2, 3], 1, 0);
        assert_eq!(page.items, vec![1]);
        assert_eq!(page.per_page, 1);
    }
}
