#![no_main]

use chrono::{TimeDelta, TimeZone, Utc};
use cloudaudit::chunk::{SplitPolicy, split};
use cloudaudit::range::TimeWindow;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 9 {
        return;
    }

    // Start within 2000..2100, length up to roughly three years
    let mut start_bytes = [0u8; 4];
    start_bytes.copy_from_slice(&data[..4]);
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&data[4..8]);
    let start_secs = i64::from(u32::from_le_bytes(start_bytes) % 3_155_760_000);
    let len_secs = i64::from(u32::from_le_bytes(len_bytes) % 100_000_000);

    let Some(base) = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).single() else {
        return;
    };
    let start = base + TimeDelta::seconds(start_secs);
    let end = start + TimeDelta::seconds(len_secs);

    let policy = match data[8] % 4 {
        0 => SplitPolicy::None,
        1 => SplitPolicy::Daily,
        2 => SplitPolicy::Weekly,
        _ => SplitPolicy::Monthly,
    };

    let window = TimeWindow { start, end };
    let chunks = split(&window, policy);

    // The chunks partition the window exactly
    assert!(!chunks.is_empty());
    assert_eq!(chunks[0].start, window.start);
    assert_eq!(chunks[chunks.len() - 1].end, window.end);
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.index, i + 1);
        assert_eq!(chunk.total, chunks.len());
        assert!(chunk.start <= chunk.end);
    }
    for pair in chunks.windows(2) {
        assert_eq!(pair[1].start, pair[0].end + TimeDelta::nanoseconds(1));
    }
});
