use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::roster::{duplicate_id, replace_roster, RosterSource, SqliteRoster, Student};
use rusqlite::Connection;
use serde_json::json;
use tracing::info;

fn roster_import(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let Some(raw) = params.get("students") else {
        return Err(HandlerErr::bad_params("missing students"));
    };
    if !raw.is_array() {
        return Err(HandlerErr::bad_params("students must be an array"));
    }
    let students: Vec<Student> = serde_json::from_value(raw.clone()).map_err(|e| HandlerErr {
        code: "bad_params",
        message: format!("invalid student record: {}", e),
        details: None,
    })?;
    if let Some(id) = duplicate_id(&students) {
        return Err(HandlerErr {
            code: "bad_params",
            message: "student ids must be unique".to_string(),
            details: Some(json!({ "id": id })),
        });
    }

    let summary = replace_roster(conn, &students).map_err(|e| HandlerErr {
        code: "db_tx_failed",
        message: e.to_string(),
        details: Some(json!({ "table": "students" })),
    })?;
    info!(
        students = summary.students,
        weeks = summary.weeks,
        "roster snapshot imported"
    );
    Ok(json!({
        "students": summary.students,
        "weeks": summary.weeks,
        "generatedIds": summary.generated_ids
    }))
}

fn roster_list(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    let students = SqliteRoster::new(conn)
        .all_students()
        .map_err(HandlerErr::query)?;
    Ok(json!({ "students": students }))
}

fn handle_roster_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match roster_import(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_roster_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match roster_list(conn) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.import" => Some(handle_roster_import(state, req)),
        "roster.list" => Some(handle_roster_list(state, req)),
        _ => None,
    }
}
