//! Pagination math for the blog list and hashtag pages.

/// Number of pages needed to show `total` items, `per_page` at a time.
pub fn total_pages(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

/// Zero-based page numbers shown in the pagination bar for `current`.
///
/// The window is centered on the current page where possible and pinned to
/// the first or last pages near the edges. `size` should be odd so there is
/// a middle.
///
/// ```text
/// total 20, size 5:  current 0 → 0 1 2 3 4
///                    current 9 → 7 8 9 10 11
///                    current 19 → 15 16 17 18 19
/// ```
pub fn window(current: usize, total_pages: usize, size: usize) -> Vec<usize> {
    let middle = size.div_ceil(2);
    let start = middle.max((total_pages + 1).saturating_sub(middle).min(current + 1));
    (0..size)
        .map(|j| start - middle + j)
        .filter(|&k| k < total_pages)
        .collect()
}

/// Inclusive index range `(first, last)` of the items on `page`.
///
/// Returns `None` for pages past the end.
pub fn page_bounds(page: usize, per_page: usize, total: usize) -> Option<(usize, usize)> {
    let first = page * per_page;
    if first >= total {
        return None;
    }
    let last = (first + per_page).min(total) - 1;
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn window_pinned_at_start() {
        assert_eq!(window(0, 20, 5), vec![0, 1, 2, 3, 4]);
        assert_eq!(window(2, 20, 5), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn window_centered_in_middle() {
        assert_eq!(window(9, 20, 5), vec![7, 8, 9, 10, 11]);
    }

    #[test]
    fn window_pinned_at_end() {
        assert_eq!(window(19, 20, 5), vec![15, 16, 17, 18, 19]);
        assert_eq!(window(17, 20, 5), vec![15, 16, 17, 18, 19]);
    }

    #[test]
    fn window_truncated_when_few_pages() {
        assert_eq!(window(0, 3, 9), vec![0, 1, 2]);
        assert_eq!(window(2, 3, 9), vec![0, 1, 2]);
        assert_eq!(window(0, 1, 9), vec![0]);
    }

    #[test]
    fn page_bounds_last_page_is_partial() {
        assert_eq!(page_bounds(0, 10, 25), Some((0, 9)));
        assert_eq!(page_bounds(2, 10, 25), Some((20, 24)));
        assert_eq!(page_bounds(3, 10, 25), None);
    }
}
