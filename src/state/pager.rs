use std::ops::{Range, RangeInclusive};

/// Page arithmetic shared by the list grid and the detail view.
///
/// Pages are 1-based. A pager over zero items still has one (empty) page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    page_size: usize,
}

impl Pager {
    /// Buttons shown on each side of the current page.
    pub const BUTTON_RADIUS: usize = 2;

    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    /// Moves to `page`, clamped into `[1, page_count]`. Returns the applied page.
    pub fn select(&mut self, page: usize, total: usize) -> usize {
        self.page = page.clamp(1, self.page_count(total));
        self.page
    }

    pub fn range(&self, total: usize) -> Range<usize> {
        let page = self.page.min(self.page_count(total));
        let start = (page - 1) * self.page_size;
        let end = (start + self.page_size).min(total);
        start.min(total)..end
    }

    /// Page numbers to render as buttons around the current page.
    pub fn button_window(&self, total: usize) -> RangeInclusive<usize> {
        let count = self.page_count(total);
        let first = self.page.saturating_sub(Self::BUTTON_RADIUS).max(1);
        let last = (self.page + Self::BUTTON_RADIUS).min(count);
        first..=last
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self, total: usize) -> bool {
        self.page < self.page_count(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_total_has_one_page() {
        let p = Pager::new(10);
        assert_eq!(p.page_count(0), 1);
        assert_eq!(p.range(0), 0..0);
        assert!(!p.has_next(0));
    }

    #[test]
    fn select_clamps_both_ends() {
        let mut p = Pager::new(10);
        assert_eq!(p.select(0, 25), 1);
        assert_eq!(p.select(4, 25), 3);
        assert_eq!(p.range(25), 20..25);
    }

    #[test]
    fn button_window_stays_in_bounds() {
        let mut p = Pager::new(10);
        p.select(1, 286);
        assert_eq!(p.button_window(286), 1..=3);
        p.select(15, 286);
        assert_eq!(p.button_window(286), 13..=17);
        p.select(29, 286);
        assert_eq!(p.button_window(286), 27..=29);
    }

    #[test]
    fn zero_page_size_is_treated_as_one() {
        let p = Pager::new(0);
        assert_eq!(p.page_size(), 1);
        assert_eq!(p.page_count(3), 3);
    }
}
