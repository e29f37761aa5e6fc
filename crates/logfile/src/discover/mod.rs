//! 디렉토리 탐색 -- 날짜 디렉토리를 찾아 디렉토리당 하나의 태스크를 디스패치합니다.
//!
//! # 규칙
//! - 경로 끝이 날짜 형태(`time/YYYY/MM/DD`)인 디렉토리가 작업 단위입니다.
//! - 이름이 제외 마커(기본 `tag`)인 디렉토리는 하위 트리 전체를 건너뜁니다. 루트도 예외가 아닙니다.
//! - 태스크는 발견 즉시 디스패치되며, 한 태스크의 실패는 다른 태스크를 중단시키지 않습니다.
//! - [`DirectoryWalker::walk`]는 디스패치된 모든 태스크가 끝난 뒤 반환합니다.
//!
//! # 아키텍처
//! ```text
//! walkdir (blocking) -> mpsc(queue_capacity) -> WorkerPool(max_concurrent_tasks) -> DirectoryHandler
//! ```

pub mod pool;

pub use pool::{TaskOutcome, WorkerPool};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::WalkConfig;
use crate::error::LogfileError;
use crate::parser::LogFileParser;
use crate::record::LogRecord;
use crate::sort::sort_chronologically;

/// 날짜 디렉토리 하나를 처리하는 작업
///
/// 블로킹 풀에서 호출되므로 동기 I/O를 사용해도 됩니다.
pub trait DirectoryHandler: Send + Sync + 'static {
    /// 디렉토리 하나를 처리합니다. 에러는 해당 디렉토리에 한정됩니다.
    fn handle(&self, dir: &Path) -> Result<(), LogfileError>;
}

impl<F> DirectoryHandler for F
where
    F: Fn(&Path) -> Result<(), LogfileError> + Send + Sync + 'static,
{
    fn handle(&self, dir: &Path) -> Result<(), LogfileError> {
        self(dir)
    }
}

/// 실패한 디렉토리 태스크
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryFailure {
    /// 태스크가 처리하던 디렉토리
    pub dir: PathBuf,
    /// 에러 메시지
    pub error: String,
}

/// 탐색 결과 요약
#[derive(Debug, Clone, Default, Serialize)]
pub struct WalkSummary {
    /// 탐색 루트
    pub root: PathBuf,
    /// 디스패치된 태스크 수
    pub dispatched: usize,
    /// 성공한 태스크 수
    pub succeeded: usize,
    /// 실패한 태스크 목록
    pub failures: Vec<DirectoryFailure>,
    /// 루트 이하에서 읽지 못한 경로 (탐색은 계속됨)
    pub walk_errors: Vec<String>,
}

impl WalkSummary {
    /// 실패한 태스크나 탐색 에러가 없는지 확인합니다.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.walk_errors.is_empty()
    }
}

/// 탐색 스레드가 디스패처로 보내는 항목
#[derive(Debug)]
enum Discovered {
    /// 날짜 디렉토리
    Dated(PathBuf),
    /// 탐색 에러 (`depth == 0`이면 루트 자체)
    Error {
        path: String,
        reason: String,
        depth: usize,
    },
}

/// 경로 매칭 규칙 (탐색 스레드로 복제되어 전달됨)
#[derive(Debug, Clone)]
struct Discovery {
    dated: Regex,
    excluded: Vec<String>,
    follow_links: bool,
}

impl Discovery {
    fn from_config(config: &WalkConfig) -> Result<Self, LogfileError> {
        Ok(Self {
            dated: config.compile_dated_pattern()?,
            excluded: config.excluded_dir_names.clone(),
            follow_links: config.follow_links,
        })
    }

    fn is_excluded(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.excluded.iter().any(|marker| marker == name))
    }

    fn is_dated(&self, path: &Path) -> bool {
        self.dated.is_match(&slash_path(path))
    }

    /// 트리를 탐색하며 항목을 `emit`에 전달합니다. `emit`이 false를 반환하면 중단합니다.
    fn run(&self, root: &Path, mut emit: impl FnMut(Discovered) -> bool) {
        let entries = WalkDir::new(root)
            .follow_links(self.follow_links)
            .into_iter()
            .filter_entry(|e| !(e.file_type().is_dir() && self.is_excluded(e.path())));

        for entry in entries {
            let item = match entry {
                Ok(entry) => {
                    if !entry.file_type().is_dir() || !self.is_dated(entry.path()) {
                        continue;
                    }
                    Discovered::Dated(entry.into_path())
                }
                Err(e) => Discovered::Error {
                    path: e
                        .path()
                        .unwrap_or(root)
                        .display()
                        .to_string(),
                    reason: e.to_string(),
                    depth: e.depth(),
                },
            };
            if !emit(item) {
                return;
            }
        }
    }
}

/// `/` 구분자로 정규화된 경로 문자열
fn slash_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// 디렉토리 탐색기
pub struct DirectoryWalker {
    config: WalkConfig,
    discovery: Discovery,
}

impl DirectoryWalker {
    /// 설정을 검증하고 탐색기를 생성합니다.
    pub fn new(config: WalkConfig) -> Result<Self, LogfileError> {
        config.validate()?;
        let discovery = Discovery::from_config(&config)?;
        Ok(Self { config, discovery })
    }

    /// 탐색 설정을 반환합니다.
    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// 경로가 날짜 디렉토리 형태인지 확인합니다.
    pub fn is_dated_dir(&self, path: &Path) -> bool {
        self.discovery.is_dated(path)
    }

    /// 경로의 마지막 세그먼트가 제외 마커인지 확인합니다.
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.discovery.is_excluded(path)
    }

    /// 태스크를 디스패치하지 않고 날짜 디렉토리 목록만 수집합니다 (동기 I/O).
    ///
    /// # Errors
    /// 루트 자체를 읽을 수 없는 경우. 하위 경로 에러는 건너뜁니다.
    pub fn discover(&self, root: impl AsRef<Path>) -> Result<Vec<PathBuf>, LogfileError> {
        let mut dirs = Vec::new();
        let mut root_error = None;

        self.discovery.run(root.as_ref(), |item| {
            match item {
                Discovered::Dated(dir) => dirs.push(dir),
                Discovered::Error { path, reason, depth } => {
                    if depth == 0 {
                        root_error = Some(LogfileError::Walk { path, reason });
                        return false;
                    }
                    debug!(path = %path, reason = %reason, "skipping unreadable path");
                }
            }
            true
        });

        match root_error {
            Some(err) => Err(err),
            None => Ok(dirs),
        }
    }

    /// 트리를 탐색하며 날짜 디렉토리마다 `handler`를 실행합니다.
    ///
    /// 모든 태스크가 끝난 뒤 요약을 반환합니다. 태스크 실패는 요약에 기록될 뿐
    /// 탐색을 중단시키지 않습니다.
    ///
    /// # Errors
    /// 루트 자체를 읽을 수 없거나 탐색 스레드가 비정상 종료된 경우.
    pub async fn walk<H: DirectoryHandler>(
        &self,
        root: impl AsRef<Path>,
        handler: Arc<H>,
    ) -> Result<WalkSummary, LogfileError> {
        let root = root.as_ref().to_path_buf();
        let (tx, mut rx) = mpsc::channel(self.config.queue_capacity);

        let discovery = self.discovery.clone();
        let walk_root = root.clone();
        let walker = tokio::task::spawn_blocking(move || {
            discovery.run(&walk_root, |item| tx.blocking_send(item).is_ok());
        });

        let mut pool = WorkerPool::new(self.config.max_concurrent_tasks);
        let mut summary = WalkSummary {
            root: root.clone(),
            ..Default::default()
        };
        let mut root_error = None;

        while let Some(item) = rx.recv().await {
            match item {
                Discovered::Dated(dir) => {
                    debug!(dir = %dir.display(), active = pool.active(), "dispatching directory task");
                    let handler = Arc::clone(&handler);
                    pool.dispatch(dir, move |dir| handler.handle(dir)).await?;
                    summary.dispatched += 1;
                }
                Discovered::Error { path, reason, depth } if depth == 0 => {
                    root_error = Some(LogfileError::Walk { path, reason });
                }
                Discovered::Error { path, reason, .. } => {
                    debug!(path = %path, reason = %reason, "skipping unreadable path");
                    summary.walk_errors.push(format!("{path}: {reason}"));
                }
            }
        }

        walker
            .await
            .map_err(|e| LogfileError::Task(format!("directory walker failed: {e}")))?;

        for outcome in pool.join().await {
            match outcome.result {
                Ok(()) => summary.succeeded += 1,
                Err(e) => {
                    debug!(dir = %outcome.dir.display(), error = %e, "directory task failed");
                    summary.failures.push(DirectoryFailure {
                        dir: outcome.dir,
                        error: e.to_string(),
                    });
                }
            }
        }

        if let Some(err) = root_error {
            return Err(err);
        }

        debug!(
            root = %root.display(),
            dispatched = summary.dispatched,
            failed = summary.failures.len(),
            "walk complete"
        );
        Ok(summary)
    }
}

/// 디렉토리 안 파일 하나의 파싱 결과
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// 파일 경로
    pub path: PathBuf,
    /// 파싱된 레코드 수 (실패 시 0)
    pub records: usize,
    /// 레코드를 시간순으로 정렬했는지 여부
    pub sorted: bool,
    /// 실패 사유
    pub error: Option<String>,
}

impl FileReport {
    /// 파일 파싱이 성공했는지 확인합니다.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// 날짜 디렉토리 하나의 파싱 결과
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryReport {
    /// 디렉토리 경로
    pub dir: PathBuf,
    /// 파일별 결과 (파일 이름 순)
    pub files: Vec<FileReport>,
}

impl DirectoryReport {
    /// 성공한 파일들의 레코드 합계를 반환합니다.
    pub fn total_records(&self) -> usize {
        self.files.iter().map(|f| f.records).sum()
    }

    /// 실패한 파일 수를 반환합니다.
    pub fn failed_files(&self) -> usize {
        self.files.iter().filter(|f| !f.is_ok()).count()
    }
}

/// 디렉토리의 모든 파일을 파싱하고 결과를 `sink`로 넘깁니다.
///
/// 디렉토리 목록은 한 번만 읽습니다. 파일 하나의 실패는 같은 디렉토리의 다른 파일에
/// 영향을 주지 않으며, 실패한 파일의 레코드는 `sink`로 전달되지 않습니다.
///
/// # Errors
/// 디렉토리 자체를 읽을 수 없는 경우.
pub fn parse_directory_with<F>(
    dir: &Path,
    sort: bool,
    mut sink: F,
) -> Result<DirectoryReport, LogfileError>
where
    F: FnMut(&Path, Vec<LogRecord>),
{
    let label = dir.display().to_string();
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| LogfileError::io(label.clone(), e))? {
        let entry = entry.map_err(|e| LogfileError::io(label.clone(), e))?;
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let parser = LogFileParser::new();
    let mut files = Vec::with_capacity(paths.len());

    for path in paths {
        match parser.parse_file(&path) {
            Ok(mut records) => {
                if sort {
                    sort_chronologically(&mut records);
                }
                let count = records.len();
                sink(&path, records);
                files.push(FileReport {
                    path,
                    records: count,
                    sorted: sort,
                    error: None,
                });
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "failed to parse log file");
                files.push(FileReport {
                    path,
                    records: 0,
                    sorted: false,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Ok(DirectoryReport {
        dir: dir.to_path_buf(),
        files,
    })
}

/// 디렉토리의 모든 파일을 파싱하고 결과 요약만 반환합니다.
pub fn parse_directory(dir: &Path, sort: bool) -> Result<DirectoryReport, LogfileError> {
    parse_directory_with(dir, sort, |_, _| {})
}
