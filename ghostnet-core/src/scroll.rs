//! Auto-scroll state for list pages longer than one screen.
//!
//! Renderer-side only: it reads an active count and produces the scroll
//! offset passed to [`crate::engine::Engine::snapshot`].

use crate::types::{age_ms, Timestamp};

#[derive(Debug, Clone)]
pub struct Scroller {
    offset: usize,
    page_size: usize,
    interval: u64,
    last_advance: Timestamp,
}

impl Scroller {
    pub fn new(page_size: usize, interval: u64) -> Self {
        Scroller {
            offset: 0,
            page_size,
            interval,
            last_advance: 0,
        }
    }

    /// Offset to render at `now` for a list of `active` entries.
    ///
    /// Steps by one entry every interval while the list overflows the page,
    /// wrapping at the end. A list that fits resets to the top.
    pub fn update(&mut self, active: usize, now: Timestamp) -> usize {
        if active <= self.page_size {
            self.offset = 0;
            return 0;
        }
        if age_ms(now, self.last_advance) >= self.interval {
            self.offset = (self.offset + 1) % active;
            self.last_advance = now;
        }
        self.offset % active
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Back to the top, e.g. on a page change.
    pub fn reset(&mut self, now: Timestamp) {
        self.offset = 0;
        self.last_advance = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_list_never_scrolls() {
        let mut s = Scroller::new(8, 2000);
        assert_eq!(s.update(8, 10_000), 0);
        assert_eq!(s.update(3, 20_000), 0);
    }

    #[test]
    fn test_scrolls_every_interval_and_wraps() {
        let mut s = Scroller::new(8, 2000);
        s.reset(0);
        assert_eq!(s.update(10, 1_000), 0);
        assert_eq!(s.update(10, 2_000), 1);
        assert_eq!(s.update(10, 3_999), 1);
        assert_eq!(s.update(10, 4_000), 2);

        let mut now = 4_000;
        for _ in 0..8 {
            now += 2_000;
            s.update(10, now);
        }
        assert_eq!(s.offset(), 0, "wrapped after ten steps");
    }

    #[test]
    fn test_shrinking_list_keeps_offset_in_range() {
        let mut s = Scroller::new(2, 1000);
        s.reset(0);
        for t in 1..=4 {
            s.update(5, t * 1000);
        }
        assert_eq!(s.offset(), 4);
        assert!(s.update(3, 4_500) < 3);
    }

    #[test]
    fn test_fitting_list_resets_offset() {
        let mut s = Scroller::new(2, 1000);
        s.update(5, 1000);
        assert_eq!(s.offset(), 1);
        s.update(2, 1500);
        assert_eq!(s.offset(), 0);
    }
}
