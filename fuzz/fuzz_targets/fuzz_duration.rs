#![no_main]

use chrono::{TimeZone, Utc};
use cloudaudit::duration::parse_duration;
use cloudaudit::range::{RangeOptions, resolve_range};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Must never panic, including on overflow
        let _ = parse_duration(s);

        let Some(now) = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single() else {
            return;
        };

        let relative = RangeOptions {
            since: Some(s.to_string()),
            ..RangeOptions::default()
        };
        if let Ok(resolved) = resolve_range(&relative, now) {
            assert!(resolved.window.start <= resolved.window.end);
            assert_eq!(resolved.window.end, now);
        }

        // Split the input into a --from/--to pair
        let mid = s.len() / 2;
        if let (Some(from), Some(to)) = (s.get(..mid), s.get(mid..)) {
            let explicit = RangeOptions {
                since: None,
                from: Some(from.to_string()),
                to: Some(to.to_string()),
            };
            if let Ok(resolved) = resolve_range(&explicit, now) {
                assert!(resolved.window.start <= resolved.window.end);
            }
        }
    }
});
