//! 로그 파일 파이프라인 에러 타입
//!
//! [`LogfileError`]는 디코딩, 파싱, 검증, 디렉토리 탐색 중 발생하는 모든 에러를 표현합니다.
//! 파싱 에러는 모두 파일 단위이며, 에러 값에는 원인 파일 경로가 포함됩니다.

/// 로그 파일 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogfileError {
    /// 첫 번째 라인이 어떤 포매터와도 매칭되지 않음
    #[error("unrecognized log format: {path}")]
    UnrecognizedFormat {
        /// 원인 파일 경로
        path: String,
    },

    /// 포매터가 결정된 이후의 라인이 해당 포매터와 매칭되지 않음
    #[error("format violation: {path}:{line}: line does not match formatter '{formatter}'")]
    FormatViolation {
        /// 원인 파일 경로
        path: String,
        /// 1부터 시작하는 라인 번호
        line: usize,
        /// 바인딩된 포매터 이름
        formatter: String,
    },

    /// 캡처된 필드의 타입 변환 실패 (오버플로우, 타임스탬프 레이아웃 불일치 등)
    #[error("field conversion error: {path}:{line}: field '{field}' value '{value}': {reason}")]
    FieldConversion {
        /// 원인 파일 경로
        path: String,
        /// 1부터 시작하는 라인 번호
        line: usize,
        /// 필드 이름
        field: String,
        /// 원시 값
        value: String,
        /// 실패 사유
        reason: String,
    },

    /// 파싱된 레코드 수와 사전 라인 수가 다름
    #[error("integrity mismatch: {path}: parsed {records} records but counted {lines} lines")]
    IntegrityMismatch {
        /// 원인 파일 경로
        path: String,
        /// 파싱된 레코드 수
        records: usize,
        /// 사전 패스에서 센 라인 수
        lines: usize,
    },

    /// 파일 열기/읽기/압축 해제 실패
    #[error("io error: {path}: {source}")]
    Io {
        /// 원인 파일 경로
        path: String,
        /// 원본 I/O 에러
        #[source]
        source: std::io::Error,
    },

    /// 확장자로 인코딩을 판별할 수 없음
    #[error("unknown encoding (no reader for file suffix): {path}")]
    UnknownEncoding {
        /// 원인 파일 경로
        path: String,
    },

    /// 디렉토리 탐색 실패
    #[error("walk error: {path}: {reason}")]
    Walk {
        /// 탐색 중이던 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 디스패치된 태스크가 패닉하거나 중단됨
    #[error("task error: {0}")]
    Task(String),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl LogfileError {
    /// I/O 에러에 파일 경로 컨텍스트를 붙입니다.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 파싱 단계(포맷, 필드, 무결성)에서 발생한 에러인지 확인합니다.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            Self::UnrecognizedFormat { .. }
                | Self::FormatViolation { .. }
                | Self::FieldConversion { .. }
                | Self::IntegrityMismatch { .. }
        )
    }
}
