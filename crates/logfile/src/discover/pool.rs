//! 고정 크기 워커 풀 -- 디렉토리 태스크의 동시 실행 수를 제한합니다.
//!
//! 디스패치는 세마포어 permit을 얻을 때까지 대기하므로 탐색 속도가 처리 속도를
//! 앞지르지 않습니다. 각 태스크는 tokio 블로킹 풀에서 실행되며, 종료 시 permit을 반환합니다.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::LogfileError;

/// 완료된 디렉토리 태스크의 결과
#[derive(Debug)]
pub struct TaskOutcome {
    /// 태스크가 처리한 디렉토리
    pub dir: PathBuf,
    /// 태스크 결과
    pub result: Result<(), LogfileError>,
}

/// 디렉토리 태스크 워커 풀
pub struct WorkerPool {
    /// 동시 실행 제한용 세마포어
    semaphore: Arc<Semaphore>,
    /// 실행 중이거나 완료를 기다리는 태스크
    tasks: JoinSet<TaskOutcome>,
    /// 최대 동시 태스크 수
    capacity: usize,
}

impl WorkerPool {
    /// `capacity`개의 동시 태스크를 허용하는 풀을 생성합니다.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            tasks: JoinSet::new(),
            capacity,
        }
    }

    /// 최대 동시 태스크 수를 반환합니다.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 현재 실행 중인 태스크 수를 반환합니다.
    pub fn active(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// 디렉토리 태스크를 디스패치합니다.
    ///
    /// 빈 슬롯이 생길 때까지 대기합니다. 태스크의 패닉은 해당 태스크의 에러로 변환되며,
    /// 다른 태스크에 영향을 주지 않습니다.
    pub async fn dispatch<F>(&mut self, dir: PathBuf, job: F) -> Result<(), LogfileError>
    where
        F: FnOnce(&Path) -> Result<(), LogfileError> + Send + 'static,
    {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| LogfileError::Task(format!("worker pool closed: {e}")))?;

        self.tasks.spawn_blocking(move || {
            let result = catch_unwind(AssertUnwindSafe(|| job(&dir))).unwrap_or_else(|_| {
                Err(LogfileError::Task(format!(
                    "directory task panicked: {}",
                    dir.display()
                )))
            });
            drop(permit); // 태스크 종료 시 슬롯 반환
            TaskOutcome { dir, result }
        });

        Ok(())
    }

    /// 디스패치된 모든 태스크의 종료를 기다립니다.
    pub async fn join(mut self) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => outcomes.push(TaskOutcome {
                    dir: PathBuf::new(),
                    result: Err(LogfileError::Task(e.to_string())),
                }),
            }
        }
        outcomes
    }
}
