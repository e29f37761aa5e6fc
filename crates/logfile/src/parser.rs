//! 레코드 파서 -- 디코딩된 스트림을 [`LogRecord`] 목록으로 변환합니다.
//!
//! # 동작
//! 1. 첫 라인을 레지스트리의 포매터에 순서대로 시도하여 처음 매칭되는 포매터를 바인딩합니다.
//!    첫 라인이 어떤 포매터와도 매칭되지 않으면 파일 전체를 거부합니다.
//! 2. 이후 모든 라인은 바인딩된 포매터와 매칭되어야 합니다. 형식은 파일 중간에 바뀔 수 없습니다.
//! 3. 캡처된 필드는 타입 있는 값으로 변환되며, 변환 실패는 파일 단위 치명적 에러입니다.
//! 4. 스트림 종료 후 레코드 수가 사전 라인 수와 정확히 같아야 합니다.
//!
//! 결과는 파일 단위 all-or-nothing 입니다. 부분 결과는 반환하지 않습니다.
//!
//! # 사용 예시
//! ```no_run
//! use phonelab_logfile::{parse_file, sort_chronologically};
//!
//! let mut records = parse_file("logs/time/2015/03/01/20-2000.out.gz")?;
//! sort_chronologically(&mut records);
//! # Ok::<(), phonelab_logfile::LogfileError>(())
//! ```

use std::io::BufRead;
use std::path::Path;

use tracing::{debug, trace};

use crate::decoder::DecodedFile;
use crate::error::LogfileError;
use crate::estimator::count_lines;
use crate::formatter::{Formatter, FormatterRegistry, default_registry};
use crate::record::LogRecord;
use crate::sort::sort_chronologically;

/// 파일 하나에 대한 파싱 세션
///
/// 바인딩된 포매터와 출력 버퍼를 단독으로 소유합니다. 파일 간에 공유되지 않습니다.
pub struct ParseSession<'r> {
    registry: &'r FormatterRegistry,
    source: String,
    bound: Option<&'r Formatter>,
    records: Vec<LogRecord>,
    lines_seen: usize,
}

impl<'r> ParseSession<'r> {
    /// 새 세션을 생성합니다. `capacity`는 예상 레코드 수입니다.
    pub fn new(registry: &'r FormatterRegistry, source: impl Into<String>, capacity: usize) -> Self {
        Self {
            registry,
            source: source.into(),
            bound: None,
            records: Vec::with_capacity(capacity),
            lines_seen: 0,
        }
    }

    /// 바인딩된 포매터를 반환합니다.
    pub fn formatter(&self) -> Option<&'r Formatter> {
        self.bound
    }

    /// 라인 하나를 처리합니다. 줄바꿈 문자는 제거된 상태여야 합니다.
    pub fn feed(&mut self, line: &str) -> Result<(), LogfileError> {
        let index = self.lines_seen;
        self.lines_seen += 1;

        let formatter = match self.bound {
            Some(formatter) => formatter,
            None => {
                let formatter = self.registry.detect(line).ok_or_else(|| {
                    LogfileError::UnrecognizedFormat {
                        path: self.source.clone(),
                    }
                })?;
                debug!(
                    source = %self.source,
                    formatter = formatter.name(),
                    "bound log formatter"
                );
                self.bound = Some(formatter);
                formatter
            }
        };

        let record = formatter
            .extract(line, index)
            .ok_or_else(|| LogfileError::FormatViolation {
                path: self.source.clone(),
                line: index + 1,
                formatter: formatter.name().to_owned(),
            })?
            .map_err(|e| LogfileError::FieldConversion {
                path: self.source.clone(),
                line: index + 1,
                field: e.field.to_owned(),
                value: e.value,
                reason: e.reason,
            })?;

        self.records.push(record);
        Ok(())
    }

    /// 세션을 종료하고 레코드 수를 사전 라인 수와 대조합니다.
    pub fn finish(self, expected_lines: usize) -> Result<Vec<LogRecord>, LogfileError> {
        if self.records.len() != expected_lines {
            return Err(LogfileError::IntegrityMismatch {
                path: self.source,
                records: self.records.len(),
                lines: expected_lines,
            });
        }
        Ok(self.records)
    }
}

/// 로그 파일 파서
///
/// 공유 레지스트리를 참조할 뿐 상태를 갖지 않으므로 여러 태스크에서 동시에 사용할 수 있습니다.
#[derive(Clone, Copy)]
pub struct LogFileParser<'r> {
    registry: &'r FormatterRegistry,
}

impl LogFileParser<'static> {
    /// 프로세스 전역 기본 레지스트리를 사용하는 파서를 생성합니다.
    pub fn new() -> Self {
        Self {
            registry: default_registry(),
        }
    }
}

impl Default for LogFileParser<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> LogFileParser<'r> {
    /// 지정된 레지스트리를 사용하는 파서를 생성합니다.
    pub fn with_registry(registry: &'r FormatterRegistry) -> Self {
        Self { registry }
    }

    /// 파일을 디코딩하고 두 번의 패스(라인 수 세기, 파싱)로 레코드를 생성합니다.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Vec<LogRecord>, LogfileError> {
        let mut decoded = DecodedFile::open(path)?;
        let label = decoded.path().display().to_string();

        let line_count =
            count_lines(decoded.stream()?).map_err(|e| LogfileError::io(label.clone(), e))?;
        trace!(path = %label, lines = line_count, "counted lines");

        let records = self.parse_reader(&label, decoded.stream()?, line_count)?;
        debug!(path = %label, records = records.len(), "parsed log file");
        Ok(records)
    }

    /// 이미 디코딩된 스트림을 파싱합니다.
    ///
    /// `expected_lines`는 같은 스트림에 대한 사전 라인 수입니다.
    pub fn parse_reader<R: BufRead>(
        &self,
        source: &str,
        mut reader: R,
        expected_lines: usize,
    ) -> Result<Vec<LogRecord>, LogfileError> {
        let mut session = ParseSession::new(self.registry, source, expected_lines);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| LogfileError::io(source, e))?;
            if n == 0 {
                break;
            }
            let raw = strip_line_ending(&buf);
            let line = std::str::from_utf8(raw).map_err(|e| LogfileError::FieldConversion {
                path: source.to_owned(),
                line: session.lines_seen + 1,
                field: "line".to_owned(),
                value: String::from_utf8_lossy(raw).into_owned(),
                reason: format!("invalid UTF-8 at byte offset {}", e.valid_up_to()),
            })?;
            session.feed(line)?;
        }

        session.finish(expected_lines)
    }
}

/// 라인 끝의 `\n` 또는 `\r\n`을 제거합니다.
fn strip_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

/// 기본 레지스트리로 파일을 파싱합니다.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<LogRecord>, LogfileError> {
    LogFileParser::new().parse_file(path)
}

/// 기본 레지스트리로 파일을 파싱한 뒤 시간순으로 정렬합니다.
pub fn parse_file_sorted(path: impl AsRef<Path>) -> Result<Vec<LogRecord>, LogfileError> {
    let mut records = parse_file(path)?;
    sort_chronologically(&mut records);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::formatter::{FieldWidth, PHONELAB_PATTERN};

    const ID: &str = "0123456789abcdef0123456789abcdef01234567";

    fn line(order: u16, ts: &str, pid: u64) -> String {
        format!("{ID} 20 1425168000.{order} 2015-03-01 {ts} {pid} {pid} I/Tag: message {order}")
    }

    fn parse_str(input: &str) -> Result<Vec<LogRecord>, LogfileError> {
        let expected = count_lines(Cursor::new(input.as_bytes())).unwrap();
        LogFileParser::new().parse_reader("test", Cursor::new(input.as_bytes()), expected)
    }

    #[test]
    fn empty_input_yields_no_records() {
        assert!(parse_str("").unwrap().is_empty());
    }

    #[test]
    fn parses_every_line() {
        let input = format!(
            "{}\n{}\n{}\n",
            line(0, "00:00:00.000001", 10),
            line(1, "00:00:00.000002", 11),
            line(2, "00:00:00.000003", 12)
        );
        let records = parse_str(&input).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].file_order, 2);
        assert_eq!(records[1].message, "/Tag: message 1");
    }

    #[test]
    fn invalid_utf8_line_fails_closed() {
        let mut input = format!("{}\n", line(0, "00:00:00.000001", 10)).into_bytes();
        let second = line(1, "00:00:00.000002", 11);
        input.extend_from_slice(second.as_bytes());
        input.extend_from_slice(&[0xff, 0xfe, b'\n']);

        let expected = count_lines(Cursor::new(&input)).unwrap();
        let err = LogFileParser::new()
            .parse_reader("test", Cursor::new(&input), expected)
            .unwrap_err();
        match err {
            LogfileError::FieldConversion {
                line, field, reason, ..
            } => {
                assert_eq!(line, 2);
                assert_eq!(field, "line");
                assert!(reason.contains(&format!("byte offset {}", second.len())));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn crlf_line_endings_are_stripped() {
        let input = format!("{}\r\n", line(0, "00:00:00.000001", 10));
        let records = parse_str(&input).unwrap();
        assert_eq!(records[0].message, "/Tag: message 0");
    }

    #[test]
    fn unrecognized_first_line_fails() {
        let input = format!("garbage header\n{}\n", line(0, "00:00:00.000001", 10));
        let err = parse_str(&input).unwrap_err();
        assert!(matches!(err, LogfileError::UnrecognizedFormat { .. }));
    }

    #[test]
    fn later_mismatch_is_a_format_violation() {
        let input = format!(
            "{}\nnot a record\n{}\n",
            line(0, "00:00:00.000001", 10),
            line(2, "00:00:00.000003", 12)
        );
        match parse_str(&input).unwrap_err() {
            LogfileError::FormatViolation { line, formatter, .. } => {
                assert_eq!(line, 2);
                assert_eq!(formatter, "phonelab");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_line_in_the_middle_is_a_format_violation() {
        let input = format!(
            "{}\n\n{}\n",
            line(0, "00:00:00.000001", 10),
            line(2, "00:00:00.000003", 12)
        );
        assert!(matches!(
            parse_str(&input).unwrap_err(),
            LogfileError::FormatViolation { .. }
        ));
    }

    #[test]
    fn missing_trailing_newline_is_an_integrity_mismatch() {
        let input = format!(
            "{}\n{}",
            line(0, "00:00:00.000001", 10),
            line(1, "00:00:00.000002", 11)
        );
        match parse_str(&input).unwrap_err() {
            LogfileError::IntegrityMismatch { records, lines, .. } => {
                assert_eq!(records, 2);
                assert_eq!(lines, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn count_mismatch_against_wrong_estimate_fails() {
        let input = format!("{}\n", line(0, "00:00:00.000001", 10));
        let err = LogFileParser::new()
            .parse_reader("test", Cursor::new(input.as_bytes()), 5)
            .unwrap_err();
        assert!(matches!(
            err,
            LogfileError::IntegrityMismatch {
                records: 1,
                lines: 5,
                ..
            }
        ));
    }

    #[test]
    fn pid_overflow_under_16_bit_formatter_fails() {
        let registry = FormatterRegistry::new()
            .register(Formatter::new("phonelab-16", PHONELAB_PATTERN, FieldWidth::Bits16).unwrap());
        let input = format!("{}\n", line(0, "00:00:00.000001", 65_536));
        let err = LogFileParser::with_registry(&registry)
            .parse_reader("test", Cursor::new(input.as_bytes()), 1)
            .unwrap_err();
        match err {
            LogfileError::FieldConversion { field, value, line, .. } => {
                assert_eq!(field, "pid");
                assert_eq!(value, "65536");
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn session_binds_formatter_once() {
        let mut session = ParseSession::new(default_registry(), "session", 2);
        assert!(session.formatter().is_none());
        session.feed(&line(0, "00:00:00.000001", 10)).unwrap();
        assert_eq!(session.formatter().map(Formatter::name), Some("phonelab"));
        session.feed(&line(1, "00:00:00.000002", 10)).unwrap();
        assert_eq!(session.finish(2).unwrap().len(), 2);
    }

    #[test]
    fn empty_registry_rejects_everything() {
        let registry = FormatterRegistry::new();
        let input = format!("{}\n", line(0, "00:00:00.000001", 10));
        let err = LogFileParser::with_registry(&registry)
            .parse_reader("test", Cursor::new(input.as_bytes()), 1)
            .unwrap_err();
        assert!(matches!(err, LogfileError::UnrecognizedFormat { .. }));
    }

    #[test]
    fn strip_line_ending_variants() {
        assert_eq!(strip_line_ending(b"abc\n"), b"abc");
        assert_eq!(strip_line_ending(b"abc\r\n"), b"abc");
        assert_eq!(strip_line_ending(b"abc"), b"abc");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn arbitrary_lines_do_not_panic(input in ".{0,400}") {
                let _ = parse_str(&input);
            }

            #[test]
            fn record_count_equals_line_count(n in 0usize..200) {
                let input: String = (0..n)
                    .map(|i| line(i as u16, "00:00:00.000001", 42) + "\n")
                    .collect();
                let records = parse_str(&input).unwrap();
                prop_assert_eq!(records.len(), n);
            }
        }
    }
}
