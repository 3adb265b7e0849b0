#![no_main]

use cloudaudit_api::{AuditLogPage, AuditLogRecord};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(json) = std::str::from_utf8(data) {
        // Result pages as returned by the list endpoint
        if let Ok(page) = serde_json::from_str::<AuditLogPage>(json) {
            for record in &page.items {
                check_record_round_trip(record);
            }
        }

        // Single records: any JSON value is accepted and kept verbatim
        if let Ok(record) = serde_json::from_str::<AuditLogRecord>(json) {
            check_record_round_trip(&record);
        }
    }

    // Raw bytes straight into the deserializer
    let _ = serde_json::from_slice::<AuditLogPage>(data);
});

/// A record serializes back to exactly the JSON it was read from
fn check_record_round_trip(record: &AuditLogRecord) {
    if let Ok(value) = serde_json::to_value(record) {
        assert_eq!(value, record.raw);
    }
}
