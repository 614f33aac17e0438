mod test_support;

use serde_json::json;
use test_support::{bulk_roster, ids, request_ok, spawn_sidecar, temp_dir};

#[test]
fn three_pages_of_attended_rows_and_reset_on_filter_change() {
    let workspace = temp_dir("sessiond-pagination");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "roster.import",
        json!({ "students": bulk_roster(260) }),
    );
    let first = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "session.select",
        json!({ "grade": "2nd", "center": "Nasr City Center", "week": 1 }),
    );
    let pagination = &first["view"]["attended"]["pagination"];
    assert_eq!(pagination["totalCount"], json!(130));
    assert_eq!(pagination["totalPages"], json!(3));
    assert_eq!(pagination["hasPrevPage"], json!(false));
    assert_eq!(ids(&first["view"]["attended"]).len(), 50);

    let third = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "session.page",
        json!({ "table": "attended", "action": "goTo", "page": 3 }),
    );
    assert_eq!(third["moved"], json!(true));
    let attended = &third["view"]["attended"];
    assert_eq!(attended["pagination"]["startIndex"], json!(100));
    assert_eq!(attended["pagination"]["endIndex"], json!(150));
    assert_eq!(attended["pagination"]["hasNextPage"], json!(false));
    assert_eq!(ids(attended).len(), 30);
    assert_eq!(third["view"]["absent"]["pagination"]["currentPage"], json!(1));

    let out_of_range = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "session.page",
        json!({ "table": "attended", "action": "goTo", "page": 4 }),
    );
    assert_eq!(out_of_range["moved"], json!(false));
    assert_eq!(
        out_of_range["view"]["attended"]["pagination"]["currentPage"],
        json!(3)
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "session.page",
        json!({ "table": "absent", "action": "next" }),
    );
    let changed = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "session.select",
        json!({ "center": "nasr city center" }),
    );
    assert_eq!(changed["changed"], json!(true));
    for table in ["attended", "absent", "aiac"] {
        assert_eq!(
            changed["view"][table]["pagination"]["currentPage"],
            json!(1),
            "{} not reset",
            table
        );
    }
}

#[test]
fn page_popup_opens_only_with_several_pages() {
    let workspace = temp_dir("sessiond-page-popup");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "roster.import",
        json!({ "students": bulk_roster(120) }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "session.select",
        json!({ "grade": "2nd", "center": "Nasr City Center", "week": 1 }),
    );

    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "session.pagePopup",
        json!({ "table": "attended", "action": "open" }),
    );
    assert_eq!(opened["applied"], json!(true));
    assert_eq!(opened["view"]["attended"]["popup"], json!("open"));

    let aiac = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "session.pagePopup",
        json!({ "table": "aiac", "action": "open" }),
    );
    assert_eq!(aiac["applied"], json!(false));
    assert_eq!(aiac["view"]["aiac"]["popup"], json!("closed"));
    assert_eq!(aiac["view"]["attended"]["popup"], json!("open"));

    let picked = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "session.pagePopup",
        json!({ "table": "attended", "action": "pick", "page": 2 }),
    );
    assert_eq!(picked["view"]["attended"]["popup"], json!("closed"));
    assert_eq!(picked["view"]["attended"]["pagination"]["currentPage"], json!(2));

    let dropdown = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "session.dropdown",
        json!({ "action": "open", "dropdown": "grade" }),
    );
    assert_eq!(dropdown["openDropdown"], json!("grade"));
    let dropdown = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "session.dropdown",
        json!({ "action": "toggle", "dropdown": "center" }),
    );
    assert_eq!(dropdown["openDropdown"], json!("center"));
    let dropdown = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "session.dropdown",
        json!({ "action": "close" }),
    );
    assert_eq!(dropdown["openDropdown"], serde_json::Value::Null);
}
