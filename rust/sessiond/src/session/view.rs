use super::classify::{center_matches, grade_matches, Bucket};
use super::pagination::{PageInfo, PagePopup, PaginationWindow, PopupState, DEFAULT_PAGE_SIZE};
use super::pipeline::{active_students, classify_roster, ClassifiedStudent, Selection, WeekChoice};
use super::stats::{aggregate, SessionStats};
use crate::prefs::SelectionStore;
use crate::roster::Student;
use serde::Serialize;
use tracing::debug;

pub const PREF_VIEW: &str = "sessionInfo";
pub const PREF_GRADE: &str = "sessionInfo.grade";
pub const PREF_CENTER: &str = "sessionInfo.center";
pub const PREF_WEEK: &str = "sessionInfo.week";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Table {
    Attended,
    Absent,
    Aiac,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Attended, Table::Absent, Table::Aiac];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "attended" => Some(Table::Attended),
            "absent" => Some(Table::Absent),
            "aiac" => Some(Table::Aiac),
            _ => None,
        }
    }

    pub fn bucket(self) -> Bucket {
        match self {
            Table::Attended => Bucket::MainCenterAttended,
            Table::Absent => Bucket::Absent,
            Table::Aiac => Bucket::AttendedElsewhere,
        }
    }

    fn idx(self) -> usize {
        match self {
            Table::Attended => 0,
            Table::Absent => 1,
            Table::Aiac => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterDropdown {
    Grade,
    Center,
    Week,
}

impl FilterDropdown {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "grade" => Some(FilterDropdown::Grade),
            "center" => Some(FilterDropdown::Center),
            "week" => Some(FilterDropdown::Week),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub attended_page_size: usize,
    pub absent_page_size: usize,
    pub aiac_page_size: usize,
    pub persist_selection: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            attended_page_size: DEFAULT_PAGE_SIZE,
            absent_page_size: DEFAULT_PAGE_SIZE,
            aiac_page_size: DEFAULT_PAGE_SIZE,
            persist_selection: true,
        }
    }
}

impl SessionConfig {
    /// Reads the `session` setup section; missing or malformed keys keep defaults.
    pub fn from_setup(section: &serde_json::Value) -> Self {
        let mut cfg = Self::default();
        let size = |key: &str| {
            section
                .get(key)
                .and_then(|v| v.as_u64())
                .filter(|n| *n >= 1)
                .map(|n| n as usize)
        };
        if let Some(n) = size("attendedPageSize") {
            cfg.attended_page_size = n;
        }
        if let Some(n) = size("absentPageSize") {
            cfg.absent_page_size = n;
        }
        if let Some(n) = size("aiacPageSize") {
            cfg.aiac_page_size = n;
        }
        if let Some(b) = section.get("persistSelection").and_then(|v| v.as_bool()) {
            cfg.persist_selection = b;
        }
        cfg
    }

    fn page_size(&self, table: Table) -> usize {
        match table {
            Table::Attended => self.attended_page_size,
            Table::Absent => self.absent_page_size,
            Table::Aiac => self.aiac_page_size,
        }
    }
}

/// Partial selection change. `Some(None)` clears a filter, `None` leaves it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPatch {
    pub grade: Option<Option<String>>,
    pub center: Option<Option<String>>,
    pub week: Option<Option<WeekChoice>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    GoTo(usize),
    Next,
    Prev,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupAction {
    Open,
    Toggle,
    Close,
    Pick(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropdownAction {
    Open(FilterDropdown),
    Toggle(FilterDropdown),
    CloseAll,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionView {
    pub grade: Option<String>,
    pub center: Option<String>,
    /// `"all"` for aggregate mode, a week number, or null when not chosen.
    pub week: serde_json::Value,
    pub all_filters_selected: bool,
}

impl From<&Selection> for SelectionView {
    fn from(sel: &Selection) -> Self {
        let week = match sel.week {
            None => serde_json::Value::Null,
            Some(WeekChoice::AllWeeks) => serde_json::Value::String("all".into()),
            Some(WeekChoice::Week(n)) => serde_json::Value::from(n),
        };
        Self {
            grade: sel.grade.clone(),
            center: sel.center.clone(),
            week,
            all_filters_selected: sel.all_filters_selected(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePage<'a> {
    pub table: Table,
    pub items: Vec<ClassifiedStudent<'a>>,
    pub pagination: PageInfo,
    pub popup: PopupState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport<'a> {
    pub selection: SelectionView,
    pub stats: SessionStats,
    pub attended: TablePage<'a>,
    pub absent: TablePage<'a>,
    pub aiac: TablePage<'a>,
    pub open_dropdown: Option<FilterDropdown>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub grades: Vec<String>,
    pub centers: Vec<String>,
    pub max_week: usize,
}

/// Distinct grades and centers of the active roster, first spelling wins.
pub fn filter_options(roster: &[Student]) -> FilterOptions {
    let mut out = FilterOptions::default();
    for s in active_students(roster) {
        let grade = s.grade.trim();
        if !grade.is_empty() && !out.grades.iter().any(|g| grade_matches(g, grade)) {
            out.grades.push(grade.to_string());
        }
        let centers = std::iter::once(s.main_center.as_str()).chain(
            s.recorded_weeks()
                .filter_map(|w| w.last_attendance_center.as_deref()),
        );
        for center in centers {
            let center = center.trim();
            if !center.is_empty() && !out.centers.iter().any(|c| center_matches(c, center)) {
                out.centers.push(center.to_string());
            }
        }
        out.max_week = out.max_week.max(s.weeks.len());
    }
    out.grades.sort();
    out.centers.sort();
    out
}

/// Mutable state of the session-info view: the selection, one page cursor
/// and page popup per table, and the single open filter dropdown.
#[derive(Debug, Clone)]
pub struct SessionView {
    config: SessionConfig,
    selection: Selection,
    windows: [PaginationWindow; 3],
    popups: [PagePopup; 3],
    open_dropdown: Option<FilterDropdown>,
}

impl Default for SessionView {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl SessionView {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            selection: Selection::default(),
            windows: Table::ALL.map(|t| PaginationWindow::new(config.page_size(t))),
            popups: [PagePopup::default(); 3],
            open_dropdown: None,
        }
    }

    pub fn apply_config(&mut self, config: SessionConfig) {
        self.config = config;
        for t in Table::ALL {
            self.windows[t.idx()].set_page_size(config.page_size(t));
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn window(&self, table: Table) -> &PaginationWindow {
        &self.windows[table.idx()]
    }

    pub fn popup(&self, table: Table) -> PopupState {
        self.popups[table.idx()].state()
    }

    pub fn open_dropdown(&self) -> Option<FilterDropdown> {
        self.open_dropdown
    }

    /// Loads the persisted selection. Unparsable week values are ignored.
    pub fn restore(&mut self, store: &dyn SelectionStore) -> anyhow::Result<()> {
        if !self.config.persist_selection {
            return Ok(());
        }
        let selection = Selection {
            grade: store.get(PREF_GRADE)?,
            center: store.get(PREF_CENTER)?,
            week: store
                .get(PREF_WEEK)?
                .and_then(|w| WeekChoice::from_pref(&w)),
        };
        if selection != self.selection {
            self.selection = selection;
            self.reset_pages();
        }
        Ok(())
    }

    /// Applies `patch`; any effective change sends every table back to page 1.
    pub fn select(
        &mut self,
        patch: SelectionPatch,
        store: &mut dyn SelectionStore,
    ) -> anyhow::Result<bool> {
        let mut next = self.selection.clone();
        if let Some(grade) = patch.grade {
            next.grade = grade.filter(|g| !g.trim().is_empty());
        }
        if let Some(center) = patch.center {
            next.center = center.filter(|c| !c.trim().is_empty());
        }
        if let Some(week) = patch.week {
            next.week = week;
        }
        if next == self.selection {
            return Ok(false);
        }
        debug!(?next, "session selection changed");
        self.selection = next;
        self.reset_pages();
        self.open_dropdown = None;
        self.persist(store)?;
        Ok(true)
    }

    pub fn clear(&mut self, store: &mut dyn SelectionStore) -> anyhow::Result<()> {
        self.selection = Selection::default();
        self.reset_pages();
        self.open_dropdown = None;
        store.remove(PREF_GRADE)?;
        store.remove(PREF_CENTER)?;
        store.remove(PREF_WEEK)?;
        Ok(())
    }

    fn persist(&self, store: &mut dyn SelectionStore) -> anyhow::Result<()> {
        if !self.config.persist_selection {
            return Ok(());
        }
        match &self.selection.grade {
            Some(g) => store.set(PREF_GRADE, g)?,
            None => store.remove(PREF_GRADE)?,
        }
        match &self.selection.center {
            Some(c) => store.set(PREF_CENTER, c)?,
            None => store.remove(PREF_CENTER)?,
        }
        match self.selection.week {
            Some(w) => store.set(PREF_WEEK, &w.to_pref())?,
            None => store.remove(PREF_WEEK)?,
        }
        Ok(())
    }

    fn reset_pages(&mut self) {
        for w in self.windows.iter_mut() {
            w.reset();
        }
        for p in self.popups.iter_mut() {
            p.close();
        }
    }

    pub fn dropdown(&mut self, action: DropdownAction) {
        self.open_dropdown = match action {
            DropdownAction::Open(d) => Some(d),
            DropdownAction::Toggle(d) if self.open_dropdown == Some(d) => None,
            DropdownAction::Toggle(d) => Some(d),
            DropdownAction::CloseAll => None,
        };
    }

    pub fn page(&mut self, table: Table, action: PageAction) -> bool {
        let idx = table.idx();
        let moved = match action {
            PageAction::GoTo(page) => self.windows[idx].go_to(page),
            PageAction::Next => self.windows[idx].next(),
            PageAction::Prev => self.windows[idx].prev(),
        };
        self.popups[idx].sync(&self.windows[idx]);
        moved
    }

    pub fn page_popup(&mut self, table: Table, action: PopupAction) -> bool {
        let idx = table.idx();
        let (popup, window) = (&mut self.popups[idx], &mut self.windows[idx]);
        match action {
            PopupAction::Open => popup.open(window),
            PopupAction::Toggle => {
                popup.toggle(window);
                true
            }
            PopupAction::Close => {
                popup.close();
                true
            }
            PopupAction::Pick(page) => popup.pick(window, page),
        }
    }

    /// Recomputes everything from `roster` and returns the visible pages.
    pub fn refresh<'a>(&mut self, roster: &'a [Student]) -> SessionReport<'a> {
        let classified = classify_roster(roster, &self.selection);
        let criteria = self.selection.criteria();
        let stats = aggregate(roster, criteria.as_ref(), &classified);

        let [attended, absent, aiac] = Table::ALL.map(|table| {
            let idx = table.idx();
            let items = classified.bucket(table.bucket());
            self.windows[idx].set_total_count(items.len());
            self.popups[idx].sync(&self.windows[idx]);
            TablePage {
                table,
                items: self.windows[idx].slice(items).to_vec(),
                pagination: self.windows[idx].info(),
                popup: self.popups[idx].state(),
            }
        });
        SessionReport {
            selection: SelectionView::from(&self.selection),
            stats,
            attended,
            absent,
            aiac,
            open_dropdown: self.open_dropdown,
        }
    }
}
