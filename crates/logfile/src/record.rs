//! 로그 레코드 -- 한 줄의 원시 로그에서 파생된 타입 있는 엔트리

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

/// 타임스탬프 필드의 고정 레이아웃 (`YYYY-MM-DD HH:MM:SS.ffffff`)
pub const TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// 파싱된 로그 레코드
///
/// 파서가 생성하고 `parse` 호출자가 소유합니다. 다른 레코드를 참조하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    /// 디바이스/세션 해시 (소문자 16진수 40자, 해석하지 않음)
    pub hashed_id: String,
    /// 초 단위 유닉스 시간
    pub unix_time: u64,
    /// 파일 내 순서 (타임스탬프 동률 시 tie-break)
    ///
    /// 원본 라인에 없으면 0부터 시작하는 라인 인덱스입니다.
    pub file_order: u16,
    /// `file_order`가 원본 라인에 실제로 있었는지 여부
    pub file_order_in_source: bool,
    /// 마이크로초 해상도의 타임스탬프
    pub timestamp: NaiveDateTime,
    /// 프로세스 ID
    pub pid: u32,
    /// 스레드 ID
    pub tid: u32,
    /// 로그 레벨 토큰
    pub level: String,
    /// 레벨 토큰 이후의 나머지 라인
    pub message: String,
}

impl LogRecord {
    /// 정렬 키 `(timestamp, file_order)`를 반환합니다.
    pub fn chronological_key(&self) -> (NaiveDateTime, u16) {
        (self.timestamp, self.file_order)
    }
}

/// 원본 라인 레이아웃으로 출력합니다.
///
/// 라인 인덱스로 채워진 `file_order`는 출력하지 않습니다.
impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.hashed_id, self.unix_time)?;
        if self.file_order_in_source {
            write!(f, ".{}", self.file_order)?;
        }
        write!(
            f,
            " {} {} {} {}{}",
            self.timestamp.format(TIMESTAMP_LAYOUT),
            self.pid,
            self.tid,
            self.level,
            self.message,
        )
    }
}
