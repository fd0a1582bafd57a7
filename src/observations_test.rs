use serde_json::json;

use super::*;

fn log_with(n: usize) -> ObservationLog {
    let mut log = ObservationLog::new();
    for i in 0..n {
        let baseline = 20.0 * (i + 1) as f64;
        log.record_injection(baseline, 0.05, baseline * 0.05 / 20.0);
    }
    log
}

#[test]
fn record_numbers_rows_and_advances_cursor() {
    let mut log = ObservationLog::new();
    let row = log.record_injection(20.0, 0.05, 0.05).clone();
    assert_eq!(row.s_no, 1);
    assert!(row.response.is_empty());
    assert!(row.percent_response.is_empty());
    log.record_injection(400.0, 0.8, 16.0);
    assert_eq!(log.entries()[1].s_no, 2);
    assert_eq!(log.graph_position(), 2);
}

#[test]
fn percent_needs_both_response_and_max() {
    let mut log = log_with(2);
    log.set_response(1, "3").unwrap();
    assert_eq!(log.entries()[0].percent_response, "");

    log.set_max_response(Some(4.0));
    assert_eq!(log.entries()[0].percent_response, "75.00");
    assert_eq!(log.entries()[1].percent_response, "");
}

#[test]
fn changing_max_recomputes_every_row() {
    let mut log = log_with(3);
    log.set_max_response(Some(10.0));
    log.set_response(1, "2.5").unwrap();
    log.set_response(3, " 10 ").unwrap();
    assert_eq!(log.entries()[0].percent_response, "25.00");
    assert_eq!(log.entries()[2].percent_response, "100.00");

    log.set_max_response(Some(5.0));
    assert_eq!(log.entries()[0].percent_response, "50.00");
    assert_eq!(log.entries()[2].percent_response, "200.00");

    log.set_max_response(None);
    assert!(log.entries().iter().all(|e| e.percent_response.is_empty()));
}

#[test]
fn zero_max_is_treated_as_unknown() {
    let mut log = log_with(1);
    log.set_response(1, "1").unwrap();
    log.set_max_response(Some(0.0));
    assert_eq!(log.max_response(), None);
    assert_eq!(log.entries()[0].percent_response, "");
}

#[test]
fn non_numeric_response_has_no_percent() {
    let mut log = log_with(1);
    log.set_max_response(Some(2.0));
    log.set_response(1, "n/a").unwrap();
    assert_eq!(log.entries()[0].response, "n/a");
    assert_eq!(log.entries()[0].percent_response, "");
}

#[test]
fn unknown_row_is_rejected() {
    let mut log = log_with(1);
    assert_eq!(log.set_response(9, "1"), Err(ObservationError::UnknownEntry(9)));
}

#[test]
fn clear_rewinds_cursor_and_keeps_max() {
    let mut log = log_with(2);
    log.set_max_response(Some(3.0));
    log.clear();
    assert!(log.is_empty());
    assert_eq!(log.graph_position(), 0);
    assert_eq!(log.max_response(), Some(3.0));
    assert_eq!(log.record_injection(1.0, 1.0, 0.05).s_no, 1);
}

#[test]
fn rows_serialize_in_camel_case() {
    let mut log = ObservationLog::new();
    log.record_injection(20.0, 0.05, 0.05);
    let value = serde_json::to_value(&log.entries()[0]).unwrap();
    assert_eq!(
        value,
        json!({
            "sNo": 1,
            "concentration": 20.0,
            "amountAdded": 0.05,
            "concInBath": 0.05,
            "response": "",
            "percentResponse": "",
        })
    );
}
