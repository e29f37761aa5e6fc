//! 크기 추정기 -- 스트림의 개행 문자 수를 셉니다.
//!
//! 라인 수는 출력 버퍼의 용량 힌트이자, 파싱 이후의 무결성 검증 기준입니다.
//! 파싱된 레코드 수가 이 값과 다르면 파싱은 실패합니다.

use std::io::{ErrorKind, Read};
use std::path::Path;

use crate::decoder::DecodedFile;
use crate::error::LogfileError;

/// 라인 수를 셀 때 사용하는 청크 크기
pub const COUNT_BUFFER_SIZE: usize = 32 * 1024;

/// 스트림을 끝까지 한 번 읽어 `\n` 개수를 반환합니다.
///
/// `Interrupted`는 재시도하며, 그 외 읽기 에러는 스트림 종료와 구분되어 반환됩니다.
pub fn count_lines<R: Read>(mut reader: R) -> std::io::Result<usize> {
    let mut buf = vec![0u8; COUNT_BUFFER_SIZE];
    let mut count = 0;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        count += buf[..n].iter().filter(|&&b| b == b'\n').count();
    }

    Ok(count)
}

/// 파일을 디코딩하여 라인 수만 셉니다.
pub fn count_file_lines(path: impl AsRef<Path>) -> Result<usize, LogfileError> {
    let mut decoded = DecodedFile::open(path)?;
    let label = decoded.path().display().to_string();
    count_lines(decoded.stream()?).map_err(|e| LogfileError::io(label, e))
}
