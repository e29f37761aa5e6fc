//! 시간순 정렬 -- `(timestamp, file_order)` 오름차순의 전순서
//!
//! 타임스탬프는 마이크로초 해상도지만 연속 호출된 로그는 같은 값을 가질 수 있습니다.
//! 동률은 소스 형식이 제공하는 파일 내 순서로 결정되므로, 같은 파일을 두 번 파싱해도
//! 정렬 결과가 동일합니다.

use std::cmp::Ordering;

use crate::record::LogRecord;

/// 두 레코드를 시간순으로 비교합니다.
pub fn compare_chronological(a: &LogRecord, b: &LogRecord) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.file_order.cmp(&b.file_order))
}

/// 레코드를 제자리에서 시간순으로 정렬합니다.
///
/// 안정 정렬이며 멱등입니다. 이미 정렬된 입력은 바뀌지 않습니다.
pub fn sort_chronologically(records: &mut [LogRecord]) {
    records.sort_by(compare_chronological);
}

/// 레코드가 이미 시간순인지 확인합니다.
pub fn is_chronological(records: &[LogRecord]) -> bool {
    records
        .windows(2)
        .all(|w| compare_chronological(&w[0], &w[1]) != Ordering::Greater)
}
