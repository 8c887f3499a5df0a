//! Page list and current page pointer.
//!
//! The rotation is: configured layout pages, then the power page (when
//! enabled), then however many message pages are currently published.

use log::debug;

use super::page::PageSpec;

/// What sits at one position of the rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRef {
    Layout(usize),
    Power,
    Message(usize),
}

pub struct PageManager {
    layouts: Vec<PageSpec>,
    show_power: bool,
    current: usize,
}

impl PageManager {
    pub fn new(layouts: Vec<PageSpec>, show_power: bool) -> Self {
        Self {
            layouts,
            show_power,
            current: 0,
        }
    }

    pub fn layout(&self, index: usize) -> Option<&PageSpec> {
        self.layouts.get(index)
    }

    fn fixed_count(&self) -> usize {
        self.layouts.len() + usize::from(self.show_power)
    }

    pub fn page_count(&self, message_pages: usize) -> usize {
        self.fixed_count() + message_pages
    }

    pub fn resolve(&self, index: usize, message_pages: usize) -> Option<PageRef> {
        let layouts = self.layouts.len();
        if index < layouts {
            Some(PageRef::Layout(index))
        } else if self.show_power && index == layouts {
            Some(PageRef::Power)
        } else if index < self.page_count(message_pages) {
            Some(PageRef::Message(index - self.fixed_count()))
        } else {
            None
        }
    }

    /// Current index, pulled back to 0 if the message range shrank under it.
    pub fn current(&mut self, message_pages: usize) -> usize {
        if self.current >= self.page_count(message_pages) {
            debug!("Page {} no longer exists, returning to 0", self.current);
            self.current = 0;
        }
        self.current
    }

    pub fn set_current(&mut self, index: usize) {
        self.current = index;
    }

    /// Index after the current one, wrapping.
    pub fn next_index(&mut self, message_pages: usize) -> usize {
        let total = self.page_count(message_pages).max(1);
        (self.current(message_pages) + 1) % total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(show_power: bool) -> PageManager {
        PageManager::new(
            vec![PageSpec::builtin_status(), PageSpec::builtin_status()],
            show_power,
        )
    }

    #[test]
    fn resolves_layout_power_and_messages() {
        let pages = manager(true);
        assert_eq!(pages.page_count(3), 6);
        assert_eq!(pages.resolve(1, 3), Some(PageRef::Layout(1)));
        assert_eq!(pages.resolve(2, 3), Some(PageRef::Power));
        assert_eq!(pages.resolve(3, 3), Some(PageRef::Message(0)));
        assert_eq!(pages.resolve(5, 3), Some(PageRef::Message(2)));
        assert_eq!(pages.resolve(6, 3), None);

        let no_power = manager(false);
        assert_eq!(no_power.resolve(2, 1), Some(PageRef::Message(0)));
    }

    #[test]
    fn wraps_and_recovers_from_shrinking_messages() {
        let mut pages = manager(true);
        pages.set_current(5);
        assert_eq!(pages.next_index(3), 0);
        assert_eq!(pages.current(1), 0);
        assert_eq!(pages.next_index(1), 1);
    }
}
