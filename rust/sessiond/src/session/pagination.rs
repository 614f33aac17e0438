use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Page cursor over one result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationWindow {
    current_page: usize,
    page_size: usize,
    total_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub total_pages: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Default for PaginationWindow {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PaginationWindow {
    pub fn new(page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            total_count: 0,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn total_pages(&self) -> usize {
        self.total_count.div_ceil(self.page_size).max(1)
    }

    pub fn start_index(&self) -> usize {
        (self.current_page - 1) * self.page_size
    }

    pub fn end_index(&self) -> usize {
        self.start_index() + self.page_size
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn has_prev_page(&self) -> bool {
        self.current_page > 1
    }

    /// Returns false and leaves the cursor alone when `page` is out of range.
    pub fn go_to(&mut self, page: usize) -> bool {
        if page < 1 || page > self.total_pages() {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn next(&mut self) -> bool {
        if !self.has_next_page() {
            return false;
        }
        self.current_page += 1;
        true
    }

    pub fn prev(&mut self) -> bool {
        if !self.has_prev_page() {
            return false;
        }
        self.current_page -= 1;
        true
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// Updates the row count; a cursor past the new last page clamps to it.
    pub fn set_total_count(&mut self, total_count: usize) {
        self.total_count = total_count;
        let last = self.total_pages();
        if self.current_page > last {
            self.current_page = last;
        }
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.current_page = 1;
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.start_index().min(items.len());
        let end = self.end_index().min(items.len());
        &items[start..end]
    }

    pub fn info(&self) -> PageInfo {
        PageInfo {
            current_page: self.current_page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages(),
            start_index: self.start_index(),
            end_index: self.end_index(),
            has_next_page: self.has_next_page(),
            has_prev_page: self.has_prev_page(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PopupState {
    #[default]
    Closed,
    Open,
}

/// Page-number picker attached to one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PagePopup {
    state: PopupState,
}

impl PagePopup {
    pub fn state(&self) -> PopupState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == PopupState::Open
    }

    /// Opens only when there is more than one page to choose from.
    pub fn open(&mut self, window: &PaginationWindow) -> bool {
        if window.total_pages() <= 1 {
            return false;
        }
        self.state = PopupState::Open;
        true
    }

    pub fn toggle(&mut self, window: &PaginationWindow) {
        if self.is_open() {
            self.close();
        } else {
            self.open(window);
        }
    }

    pub fn close(&mut self) {
        self.state = PopupState::Closed;
    }

    /// Picks a page and closes. An out-of-range page still closes the popup.
    pub fn pick(&mut self, window: &mut PaginationWindow, page: usize) -> bool {
        let moved = window.go_to(page);
        self.close();
        moved
    }

    pub fn sync(&mut self, window: &PaginationWindow) {
        if window.total_pages() <= 1 {
            self.close();
        }
    }
}
