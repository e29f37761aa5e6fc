//! 디렉토리 탐색 설정
//!
//! [`WalkConfig`]의 기본값은 내장 상수(날짜 디렉토리 패턴, `tag` 제외 마커)와 같습니다.
//! 필요하면 TOML 파일과 환경변수로 덮어쓸 수 있습니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`PHONELAB_WALK_MAX_CONCURRENT_TASKS=8` 형식)
//! 2. 설정 파일 (`phonelab.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! use phonelab_logfile::config::WalkConfig;
//!
//! let config = WalkConfig::load("phonelab.toml")?;
//! let config = WalkConfig::parse("max_concurrent_tasks = 4")?;
//! # Ok::<(), phonelab_logfile::LogfileError>(())
//! ```

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::LogfileError;

/// 날짜 디렉토리 기본 패턴 (`.../time/YYYY/MM/DD`)
pub const DEFAULT_DATED_DIR_PATTERN: &str = r"(?:^|/)time/[0-9]{4}/[0-9]{2}/[0-9]{2}/?$";

/// 기본 제외 마커
pub const DEFAULT_EXCLUDED_DIR_NAME: &str = "tag";

const MAX_CONCURRENT_TASKS: usize = 1024;
const MAX_QUEUE_CAPACITY: usize = 65_536;

/// 디렉토리 탐색 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// 작업 단위가 되는 날짜 디렉토리 경로 패턴 (`/` 구분 경로에 대해 매칭)
    pub dated_dir_pattern: String,
    /// 하위 트리 전체를 건너뛸 디렉토리 이름 목록
    pub excluded_dir_names: Vec<String>,
    /// 동시에 실행되는 디렉토리 태스크 최대 수
    pub max_concurrent_tasks: usize,
    /// 탐색기와 디스패처 사이 대기열 용량
    pub queue_capacity: usize,
    /// 심볼릭 링크 추적 여부
    pub follow_links: bool,
    /// 파싱된 레코드를 시간순으로 정렬할지 여부
    pub sort_records: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            dated_dir_pattern: DEFAULT_DATED_DIR_PATTERN.to_owned(),
            excluded_dir_names: vec![DEFAULT_EXCLUDED_DIR_NAME.to_owned()],
            max_concurrent_tasks: workers,
            queue_capacity: 256,
            follow_links: false,
            sort_records: true,
        }
    }
}

impl WalkConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LogfileError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| LogfileError::io(path.display().to_string(), e))?;
        let mut config = Self::parse(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogfileError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| LogfileError::Config {
            field: "toml".to_owned(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `PHONELAB_WALK_*` 환경변수로 설정을 덮어씁니다.
    ///
    /// 파싱할 수 없는 값은 해당 환경변수 이름을 필드로 하는 `Config` 에러입니다.
    pub fn apply_env_overrides(&mut self) -> Result<(), LogfileError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    fn apply_overrides_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), LogfileError> {
        override_parsed(
            &mut self.max_concurrent_tasks,
            "PHONELAB_WALK_MAX_CONCURRENT_TASKS",
            &lookup,
        )?;
        override_parsed(
            &mut self.queue_capacity,
            "PHONELAB_WALK_QUEUE_CAPACITY",
            &lookup,
        )?;
        override_parsed(&mut self.follow_links, "PHONELAB_WALK_FOLLOW_LINKS", &lookup)?;
        override_parsed(&mut self.sort_records, "PHONELAB_WALK_SORT_RECORDS", &lookup)?;
        if let Some(val) = lookup("PHONELAB_WALK_EXCLUDED_DIR_NAMES") {
            self.excluded_dir_names = val
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();
        }
        Ok(())
    }

    /// 날짜 디렉토리 패턴을 컴파일합니다.
    pub fn compile_dated_pattern(&self) -> Result<Regex, LogfileError> {
        Regex::new(&self.dated_dir_pattern).map_err(|e| LogfileError::Config {
            field: "dated_dir_pattern".to_owned(),
            reason: e.to_string(),
        })
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogfileError> {
        if self.max_concurrent_tasks == 0 || self.max_concurrent_tasks > MAX_CONCURRENT_TASKS {
            return Err(LogfileError::Config {
                field: "max_concurrent_tasks".to_owned(),
                reason: format!("must be 1-{MAX_CONCURRENT_TASKS}"),
            });
        }

        if self.queue_capacity == 0 || self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(LogfileError::Config {
                field: "queue_capacity".to_owned(),
                reason: format!("must be 1-{MAX_QUEUE_CAPACITY}"),
            });
        }

        if self
            .excluded_dir_names
            .iter()
            .any(|name| name.is_empty() || name.contains('/'))
        {
            return Err(LogfileError::Config {
                field: "excluded_dir_names".to_owned(),
                reason: "names must be non-empty single path segments".to_owned(),
            });
        }

        self.compile_dated_pattern()?;
        Ok(())
    }
}

/// 탐색 설정 빌더
#[derive(Default)]
pub struct WalkConfigBuilder {
    config: WalkConfig,
}

impl WalkConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 날짜 디렉토리 패턴을 설정합니다.
    pub fn dated_dir_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.dated_dir_pattern = pattern.into();
        self
    }

    /// 제외 마커 목록을 설정합니다.
    pub fn excluded_dir_names(mut self, names: Vec<String>) -> Self {
        self.config.excluded_dir_names = names;
        self
    }

    /// 최대 동시 태스크 수를 설정합니다.
    pub fn max_concurrent_tasks(mut self, n: usize) -> Self {
        self.config.max_concurrent_tasks = n;
        self
    }

    /// 대기열 용량을 설정합니다.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// 심볼릭 링크 추적 여부를 설정합니다.
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.config.follow_links = follow;
        self
    }

    /// 레코드 정렬 여부를 설정합니다.
    pub fn sort_records(mut self, sort: bool) -> Self {
        self.config.sort_records = sort;
        self
    }

    /// 설정을 검증하고 `WalkConfig`를 생성합니다.
    pub fn build(self) -> Result<WalkConfig, LogfileError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn override_parsed<T>(
    target: &mut T,
    env_key: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<(), LogfileError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(val) = lookup(env_key) {
        *target = val.trim().parse::<T>().map_err(|e| LogfileError::Config {
            field: env_key.to_owned(),
            reason: format!("invalid value '{val}': {e}"),
        })?;
    }
    Ok(())
}
