//! 레코드 포매터 및 레지스트리
//!
//! [`Formatter`]는 이름 있는 캡처 그룹을 가진 라인 패턴입니다.
//! [`FormatterRegistry`]는 포매터를 순서대로 보관하며, 라인을 인식하는 첫 번째 포매터를 반환합니다.
//!
//! 기본 레지스트리는 [`default_registry`]로 얻는 프로세스 전역 읽기 전용 값입니다.
//! 초기화 이후 변경되지 않으므로 모든 태스크가 잠금 없이 공유합니다.
//!
//! # 지원 형식
//! ```text
//! <40-hex-id> <ignored> <unixtime>[.<fileorder>] <YYYY-MM-DD HH:MM:SS.ffffff> <PID> <TID> <LEVEL><message>
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::record::{LogRecord, TIMESTAMP_LAYOUT};

/// 기본 포매터 이름
pub const PHONELAB_FORMAT: &str = "phonelab";

/// 기본 포매터 패턴 (32비트 PID/TID, fileorder 선택)
///
/// 구분자와 레벨 토큰은 ASCII 클래스만 허용합니다.
pub const PHONELAB_PATTERN: &str = r"^(?P<hashed_id>[0-9a-f]{40})[\t\n\f\r ]+[0-9]+[\t\n\f\r ]+(?P<unix_time>[0-9]+)(?:\.(?P<file_order>[0-9]+))?[\t\n\f\r ]+(?P<timestamp>[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]+)[\t\n\f\r ]+(?P<pid>[0-9]+)[\t\n\f\r ]+(?P<tid>[0-9]+)[\t\n\f\r ]+(?P<level>[0-9A-Za-z_]+)(?P<message>.*)$";

static DEFAULT_REGISTRY: LazyLock<FormatterRegistry> = LazyLock::new(|| {
    let phonelab = Formatter::new(PHONELAB_FORMAT, PHONELAB_PATTERN, FieldWidth::Bits32)
        .expect("built-in phonelab pattern must compile");
    FormatterRegistry::new().register(phonelab)
});

/// 프로세스 전역 기본 레지스트리를 반환합니다.
pub fn default_registry() -> &'static FormatterRegistry {
    &DEFAULT_REGISTRY
}

/// PID/TID 필드의 선언된 폭
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldWidth {
    /// 16비트 (구형 변형)
    Bits16,
    /// 32비트 (기본)
    #[default]
    Bits32,
}

impl FieldWidth {
    fn parse(self, raw: &str) -> Result<u32, std::num::ParseIntError> {
        match self {
            Self::Bits16 => raw.parse::<u16>().map(u32::from),
            Self::Bits32 => raw.parse::<u32>(),
        }
    }
}

/// 필드 변환 실패 정보
///
/// 파일 경로와 라인 번호는 파싱 세션이 붙입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// 필드 이름
    pub field: &'static str,
    /// 원시 값
    pub value: String,
    /// 실패 사유
    pub reason: String,
}

impl FieldError {
    fn new(field: &'static str, value: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            field,
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

/// 이름 있는 라인 패턴
///
/// 생성 후 불변입니다.
#[derive(Debug, Clone)]
pub struct Formatter {
    name: String,
    pattern: Regex,
    id_width: FieldWidth,
}

impl Formatter {
    /// 새 포매터를 생성합니다.
    ///
    /// 패턴에는 `hashed_id`, `unix_time`, `timestamp`, `pid`, `tid`, `level`, `message`
    /// 캡처 그룹이 있어야 하며, `file_order`는 선택입니다.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        id_width: FieldWidth,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            id_width,
        })
    }

    /// 포매터 이름을 반환합니다.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// PID/TID 필드 폭을 반환합니다.
    pub fn id_width(&self) -> FieldWidth {
        self.id_width
    }

    /// 라인이 이 포매터와 매칭되는지 확인합니다.
    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    /// 매칭된 캡처 그룹을 이름 -> 값 맵으로 추출합니다.
    ///
    /// 매칭되지 않으면 `None`을 반환합니다. 참여하지 않은 선택 그룹은 맵에 없습니다.
    pub fn fields<'l>(&self, line: &'l str) -> Option<HashMap<&str, &'l str>> {
        let caps = self.pattern.captures(line)?;
        let fields = self
            .pattern
            .capture_names()
            .flatten()
            .filter_map(|name| caps.name(name).map(|m| (name, m.as_str())))
            .collect();
        Some(fields)
    }

    /// 라인을 레코드로 변환합니다.
    ///
    /// `line_index`는 0부터 시작하며, 형식에 `file_order`가 없을 때 대신 사용됩니다.
    /// 매칭되지 않으면 `None`, 필드 변환에 실패하면 `Some(Err(..))`를 반환합니다.
    pub fn extract(&self, line: &str, line_index: usize) -> Option<Result<LogRecord, FieldError>> {
        let fields = self.fields(line)?;
        Some(self.convert(&fields, line_index))
    }

    fn convert(
        &self,
        fields: &HashMap<&str, &str>,
        line_index: usize,
    ) -> Result<LogRecord, FieldError> {
        let get = |field: &'static str| {
            fields
                .get(field)
                .copied()
                .ok_or_else(|| FieldError::new(field, "", "missing capture group"))
        };

        let hashed_id = get("hashed_id")?;

        let raw = get("unix_time")?;
        let unix_time = raw
            .parse::<u64>()
            .map_err(|e| FieldError::new("unix_time", raw, e))?;

        let file_order_in_source = fields.contains_key("file_order");
        let file_order = match fields.get("file_order") {
            Some(&raw) => raw
                .parse::<u16>()
                .map_err(|e| FieldError::new("file_order", raw, e))?,
            None => u16::try_from(line_index).map_err(|_| {
                FieldError::new(
                    "file_order",
                    line_index.to_string(),
                    "line index exceeds 16-bit file order",
                )
            })?,
        };

        let raw = get("timestamp")?;
        let timestamp = NaiveDateTime::parse_from_str(raw, TIMESTAMP_LAYOUT)
            .map_err(|e| FieldError::new("timestamp", raw, e))?;

        let raw = get("pid")?;
        let pid = self
            .id_width
            .parse(raw)
            .map_err(|e| FieldError::new("pid", raw, e))?;

        let raw = get("tid")?;
        let tid = self
            .id_width
            .parse(raw)
            .map_err(|e| FieldError::new("tid", raw, e))?;

        let level = get("level")?;
        if level.is_empty() {
            return Err(FieldError::new("level", level, "empty level token"));
        }

        Ok(LogRecord {
            hashed_id: hashed_id.to_owned(),
            unix_time,
            file_order,
            file_order_in_source,
            timestamp,
            pid,
            tid,
            level: level.to_owned(),
            message: fields.get("message").copied().unwrap_or_default().to_owned(),
        })
    }
}

/// 포매터 레지스트리 -- 등록 순서대로 라인 인식을 시도합니다.
#[derive(Debug, Clone, Default)]
pub struct FormatterRegistry {
    /// 등록된 포매터 목록 (순서대로 시도)
    formatters: Vec<Formatter>,
}

impl FormatterRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 포매터를 등록합니다. 등록 순서대로 시도됩니다.
    pub fn register(mut self, formatter: Formatter) -> Self {
        self.formatters.push(formatter);
        self
    }

    /// 라인을 인식하는 첫 번째 포매터를 반환합니다.
    pub fn detect(&self, line: &str) -> Option<&Formatter> {
        self.formatters.iter().find(|f| f.matches(line))
    }

    /// 등록된 포매터 이름 목록을 반환합니다.
    pub fn names(&self) -> Vec<&str> {
        self.formatters.iter().map(Formatter::name).collect()
    }

    /// 등록된 포매터 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.formatters.len()
    }

    /// 레지스트리가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.formatters.is_empty()
    }
}
