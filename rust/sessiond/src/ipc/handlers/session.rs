use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::prefs::SqlitePrefs;
use crate::roster::{find_student, RosterSource, SqliteRoster, Student};
use crate::session::view::PREF_VIEW;
use crate::session::{
    filter_options, lesson_detail, DropdownAction, FilterDropdown, LessonCategory, PageAction,
    PopupAction, SelectionPatch, SessionView, Table, WeekChoice,
};
use rusqlite::Connection;
use serde_json::{json, Value};

fn load_roster(conn: &Connection) -> Result<Vec<Student>, HandlerErr> {
    SqliteRoster::new(conn)
        .all_students()
        .map_err(HandlerErr::query)
}

fn render(view: &mut SessionView, roster: &[Student]) -> Result<Value, HandlerErr> {
    let report = view.refresh(roster);
    serde_json::to_value(&report).map_err(|e| HandlerErr::new("internal", e.to_string()))
}

fn parse_text_filter(params: &Value, key: &str) -> Result<Option<Option<String>>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(Some(None)),
        Some(v) => {
            let Some(s) = v.as_str() else {
                return Err(HandlerErr::bad_params(format!("{} must be string or null", key)));
            };
            let t = s.trim();
            Ok(Some(if t.is_empty() { None } else { Some(t.to_string()) }))
        }
    }
}

fn parse_week_filter(params: &Value) -> Result<Option<Option<WeekChoice>>, HandlerErr> {
    let Some(v) = params.get("week") else {
        return Ok(None);
    };
    if v.is_null() {
        return Ok(Some(None));
    }
    if let Some(n) = v.as_u64() {
        if n >= 1 && n <= u32::MAX as u64 {
            return Ok(Some(Some(WeekChoice::Week(n as u32))));
        }
    } else if let Some(choice) = v.as_str().and_then(WeekChoice::from_pref) {
        return Ok(Some(Some(choice)));
    }
    Err(HandlerErr::bad_params(
        "week must be a week number >= 1, 'all', or null",
    ))
}

fn parse_table(params: &Value) -> Result<Table, HandlerErr> {
    params
        .get("table")
        .and_then(|v| v.as_str())
        .and_then(Table::parse)
        .ok_or_else(|| HandlerErr::bad_params("table must be one of: attended, absent, aiac"))
}

fn parse_page(params: &Value) -> Result<usize, HandlerErr> {
    params
        .get("page")
        .and_then(|v| v.as_u64())
        .map(|n| n as usize)
        .ok_or_else(|| HandlerErr::bad_params("missing page"))
}

fn session_open(view: &mut SessionView, conn: &Connection) -> Result<Value, HandlerErr> {
    view.restore(&SqlitePrefs::new(conn, PREF_VIEW))
        .map_err(HandlerErr::query)?;
    let roster = load_roster(conn)?;
    let options = filter_options(&roster);
    Ok(json!({
        "options": options,
        "view": render(view, &roster)?
    }))
}

fn session_select(
    view: &mut SessionView,
    conn: &Connection,
    params: &Value,
) -> Result<Value, HandlerErr> {
    let patch = SelectionPatch {
        grade: parse_text_filter(params, "grade")?,
        center: parse_text_filter(params, "center")?,
        week: parse_week_filter(params)?,
    };
    let mut prefs = SqlitePrefs::new(conn, PREF_VIEW);
    let changed = view
        .select(patch, &mut prefs)
        .map_err(|e| HandlerErr::update(e, "view_prefs"))?;
    let roster = load_roster(conn)?;
    Ok(json!({
        "changed": changed,
        "view": render(view, &roster)?
    }))
}

fn session_clear(view: &mut SessionView, conn: &Connection) -> Result<Value, HandlerErr> {
    let mut prefs = SqlitePrefs::new(conn, PREF_VIEW);
    view.clear(&mut prefs)
        .map_err(|e| HandlerErr::update(e, "view_prefs"))?;
    let roster = load_roster(conn)?;
    Ok(json!({ "view": render(view, &roster)? }))
}

fn session_view(view: &mut SessionView, conn: &Connection) -> Result<Value, HandlerErr> {
    let roster = load_roster(conn)?;
    Ok(json!({ "view": render(view, &roster)? }))
}

fn session_page(
    view: &mut SessionView,
    conn: &Connection,
    params: &Value,
) -> Result<Value, HandlerErr> {
    let table = parse_table(params)?;
    let action = match params.get("action").and_then(|v| v.as_str()) {
        Some("goTo") => PageAction::GoTo(parse_page(params)?),
        Some("next") => PageAction::Next,
        Some("prev") => PageAction::Prev,
        _ => {
            return Err(HandlerErr::bad_params(
                "action must be one of: goTo, next, prev",
            ))
        }
    };
    let roster = load_roster(conn)?;
    // Page bounds must reflect the current roster, not the last rendered one.
    view.refresh(&roster);
    let moved = view.page(table, action);
    Ok(json!({
        "moved": moved,
        "view": render(view, &roster)?
    }))
}

fn session_page_popup(
    view: &mut SessionView,
    conn: &Connection,
    params: &Value,
) -> Result<Value, HandlerErr> {
    let table = parse_table(params)?;
    let action = match params.get("action").and_then(|v| v.as_str()) {
        Some("open") => PopupAction::Open,
        Some("toggle") => PopupAction::Toggle,
        Some("close") => PopupAction::Close,
        Some("pick") => PopupAction::Pick(parse_page(params)?),
        _ => {
            return Err(HandlerErr::bad_params(
                "action must be one of: open, toggle, close, pick",
            ))
        }
    };
    let roster = load_roster(conn)?;
    view.refresh(&roster);
    let applied = view.page_popup(table, action);
    Ok(json!({
        "applied": applied,
        "view": render(view, &roster)?
    }))
}

fn session_dropdown(view: &mut SessionView, params: &Value) -> Result<Value, HandlerErr> {
    let dropdown = params
        .get("dropdown")
        .and_then(|v| v.as_str())
        .and_then(FilterDropdown::parse);
    let action = match (params.get("action").and_then(|v| v.as_str()), dropdown) {
        (Some("open"), Some(d)) => DropdownAction::Open(d),
        (Some("toggle"), Some(d)) => DropdownAction::Toggle(d),
        (Some("close"), _) => DropdownAction::CloseAll,
        (Some("open" | "toggle"), None) => {
            return Err(HandlerErr::bad_params(
                "dropdown must be one of: grade, center, week",
            ))
        }
        _ => {
            return Err(HandlerErr::bad_params(
                "action must be one of: open, toggle, close",
            ))
        }
    };
    view.dropdown(action);
    Ok(json!({ "openDropdown": view.open_dropdown() }))
}

fn session_lesson_detail(
    view: &mut SessionView,
    conn: &Connection,
    params: &Value,
) -> Result<Value, HandlerErr> {
    let student_id = params
        .get("studentId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing studentId"))?;
    let category = params
        .get("category")
        .and_then(|v| v.as_str())
        .and_then(LessonCategory::parse)
        .ok_or_else(|| HandlerErr::bad_params("category must be one of: absent, hw, quiz"))?;
    let Some(student) = find_student(conn, student_id).map_err(HandlerErr::query)? else {
        return Err(HandlerErr::new("not_found", "student not found"));
    };
    let week = view.selection().week.and_then(|w| w.week_number());
    let detail = lesson_detail(&student, week, category);
    serde_json::to_value(&detail).map_err(|e| HandlerErr::new("internal", e.to_string()))
}

fn with_conn(
    state: &mut AppState,
    req: &Request,
    f: impl FnOnce(&mut SessionView, &Connection, &Value) -> Result<Value, HandlerErr>,
) -> serde_json::Value {
    let AppState { db, session, .. } = state;
    let Some(conn) = db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match f(session, conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_session_dropdown(state: &mut AppState, req: &Request) -> serde_json::Value {
    match session_dropdown(&mut state.session, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.open" => Some(with_conn(state, req, |s, c, _| session_open(s, c))),
        "session.select" => Some(with_conn(state, req, session_select)),
        "session.clear" => Some(with_conn(state, req, |s, c, _| session_clear(s, c))),
        "session.view" => Some(with_conn(state, req, |s, c, _| session_view(s, c))),
        "session.page" => Some(with_conn(state, req, session_page)),
        "session.pagePopup" => Some(with_conn(state, req, session_page_popup)),
        "session.lessonDetail" => Some(with_conn(state, req, session_lesson_detail)),
        "session.dropdown" => Some(handle_session_dropdown(state, req)),
        _ => None,
    }
}
