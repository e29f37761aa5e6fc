#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`decoder`]: 파일 확장자 기반 전송 인코딩 선택 (plain, gzip)
//! - [`estimator`]: 디코딩된 스트림의 라인 수 사전 계산
//! - [`formatter`]: 라인 형식 정의와 첫 라인 기반 형식 감지
//! - [`parser`]: 파일 단위 all-or-nothing 파싱과 무결성 검증
//! - [`record`]: 로그 레코드 타입
//! - [`sort`]: `(timestamp, file_order)` 시간순 정렬
//! - [`discover`]: 날짜 디렉토리 탐색과 제한된 동시성의 태스크 디스패치
//! - [`config`]: 탐색 설정 (TOML + 환경변수)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! DirectoryWalker -> WorkerPool -> DirectoryHandler
//!                                      |
//!               DecodedFile -> count_lines -> ParseSession -> sort_chronologically
//!               (plain/gzip)   (1st pass)     (2nd pass)
//! ```

pub mod config;
pub mod decoder;
pub mod discover;
pub mod error;
pub mod estimator;
pub mod formatter;
pub mod parser;
pub mod record;
pub mod sort;

// --- 주요 타입 re-export ---

// 설정
pub use config::{WalkConfig, WalkConfigBuilder};

// 에러
pub use error::LogfileError;

// 디코딩
pub use decoder::{DecodedFile, Encoding};

// 형식
pub use formatter::{FieldWidth, Formatter, FormatterRegistry, default_registry};

// 파싱
pub use parser::{LogFileParser, ParseSession, parse_file, parse_file_sorted};

// 레코드와 정렬
pub use record::LogRecord;
pub use sort::{compare_chronological, is_chronological, sort_chronologically};

// 탐색
pub use discover::{
    DirectoryFailure, DirectoryHandler, DirectoryReport, DirectoryWalker, FileReport, WalkSummary,
    parse_directory, parse_directory_with,
};
