mod test_support;

use serde_json::json;
use test_support::{bulk_roster, request_ok, spawn_sidecar, temp_dir};

#[test]
fn selection_survives_restart_and_clear_forgets_it() {
    let workspace = temp_dir("sessiond-selection-persist");
    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();
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
            json!({ "students": bulk_roster(10) }),
        );
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "3",
            "session.select",
            json!({ "grade": "2nd", "center": "Nasr City Center", "week": "all" }),
        );
        drop(stdin);
        let _ = child.wait();
    }

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let opened = request_ok(&mut stdin, &mut reader, "2", "session.open", json!({}));
    let selection = &opened["view"]["selection"];
    assert_eq!(selection["grade"], json!("2nd"));
    assert_eq!(selection["center"], json!("Nasr City Center"));
    assert_eq!(selection["week"], json!("all"));
    assert_eq!(selection["allFiltersSelected"], json!(true));
    assert_eq!(opened["options"]["grades"], json!(["2nd"]));
    assert_eq!(opened["options"]["centers"], json!(["Nasr City Center"]));
    assert_eq!(opened["options"]["maxWeek"], json!(1));
    assert_eq!(opened["view"]["stats"]["mc"], json!(5));

    let cleared = request_ok(&mut stdin, &mut reader, "3", "session.clear", json!({}));
    assert_eq!(cleared["view"]["selection"]["allFiltersSelected"], json!(false));

    let reopened = request_ok(&mut stdin, &mut reader, "4", "session.open", json!({}));
    assert_eq!(reopened["view"]["selection"]["grade"], serde_json::Value::Null);
    assert_eq!(reopened["view"]["selection"]["week"], serde_json::Value::Null);
}
