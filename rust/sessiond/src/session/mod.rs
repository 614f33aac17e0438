//! Attendance analytics for the session-info view.
//!
//! Everything here is a pure derivation over a roster snapshot except
//! [`view::SessionView`], which holds the selection and page cursors.

pub mod classify;
pub mod detail;
pub mod pagination;
pub mod pipeline;
pub mod stats;
pub mod view;
pub mod weekly;

pub use detail::{lesson_detail, LessonCategory};
pub use pipeline::WeekChoice;
pub use view::{
    filter_options, DropdownAction, FilterDropdown, PageAction, PopupAction, SelectionPatch,
    SessionConfig, SessionView, Table,
};
