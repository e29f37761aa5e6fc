//! 스트림 디코더 -- 파일 이름 접미사로 전송 인코딩을 판별합니다.
//!
//! - `.gz`: gzip 압축 해제 스트림
//! - `.out`, `.log`, `.txt`: 버퍼링된 평문 스트림
//! - 그 외: 리더 없음 ([`LogfileError::UnknownEncoding`], 파일 단위 치명적 에러)
//!
//! 파싱은 두 번의 패스(라인 수 세기, 파싱)로 이루어집니다. gzip 스트림은 자체적으로
//! 되감을 수 없으므로, 원시 파일 핸들을 오프셋 0으로 되돌린 뒤 압축 해제 계층을
//! 새로 만듭니다. 원시 핸들은 [`DecodedFile`]이 소유하며 drop 시 한 번만 닫힙니다.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

use crate::error::LogfileError;

/// 평문으로 취급하는 파일 확장자
const PLAIN_EXTENSIONS: &[&str] = &["out", "log", "txt"];

/// 파일의 전송 인코딩
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// 평문 라인 스트림
    Plain,
    /// gzip 압축 라인 스트림
    Gzip,
}

impl Encoding {
    /// 파일 이름 접미사로 인코딩을 판별합니다.
    ///
    /// 인식하지 못하는 접미사는 `None`을 반환합니다.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext == "gz" {
            Some(Self::Gzip)
        } else if PLAIN_EXTENSIONS.contains(&ext) {
            Some(Self::Plain)
        } else {
            None
        }
    }

    /// 원시 파일 핸들 위에 디코딩 계층을 만듭니다.
    ///
    /// 핸들의 현재 위치부터 읽으므로, 호출자가 위치를 맞춰야 합니다.
    pub fn reader<'f>(&self, file: &'f File) -> Box<dyn BufRead + 'f> {
        match self {
            Self::Plain => Box::new(BufReader::new(file)),
            Self::Gzip => Box::new(BufReader::new(MultiGzDecoder::new(file))),
        }
    }
}

/// 인코딩이 판별된 열린 로그 파일
///
/// 하나의 파싱 세션 동안 살아 있으며, drop 시 원시 핸들을 닫습니다.
#[derive(Debug)]
pub struct DecodedFile {
    path: PathBuf,
    file: File,
    encoding: Encoding,
}

impl DecodedFile {
    /// 파일을 열고 인코딩을 판별합니다.
    ///
    /// # Errors
    /// - 접미사를 인식할 수 없는 경우 `UnknownEncoding` (파일을 열기 전에 판별)
    /// - 파일을 열 수 없는 경우 `Io`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LogfileError> {
        let path = path.as_ref();
        let encoding = Encoding::from_path(path).ok_or_else(|| LogfileError::UnknownEncoding {
            path: path.display().to_string(),
        })?;
        let file = File::open(path).map_err(|e| LogfileError::io(path.display().to_string(), e))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            encoding,
        })
    }

    /// 파일 경로를 반환합니다.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 판별된 인코딩을 반환합니다.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// 원시 핸들을 오프셋 0으로 되돌리고 새 디코딩 스트림을 만듭니다.
    ///
    /// 각 패스마다 호출합니다. 이전 패스의 스트림은 먼저 drop 되어야 합니다.
    pub fn stream(&mut self) -> Result<Box<dyn BufRead + '_>, LogfileError> {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| LogfileError::io(self.path.display().to_string(), e))?;
        Ok(self.encoding.reader(&self.file))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;

    #[test]
    fn encoding_from_suffix() {
        assert_eq!(Encoding::from_path(Path::new("a/20-2000.out.gz")), Some(Encoding::Gzip));
        assert_eq!(Encoding::from_path(Path::new("a/20-1000.out")), Some(Encoding::Plain));
        assert_eq!(Encoding::from_path(Path::new("x.log")), Some(Encoding::Plain));
        assert_eq!(Encoding::from_path(Path::new("x.bz2")), None);
        assert_eq!(Encoding::from_path(Path::new("noext")), None);
    }

    #[test]
    fn unknown_suffix_is_rejected_before_open() {
        let err = DecodedFile::open("/definitely/missing/file.zip").unwrap_err();
        assert!(matches!(err, LogfileError::UnknownEncoding { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = DecodedFile::open("/definitely/missing/file.out").unwrap_err();
        assert!(matches!(err, LogfileError::Io { .. }));
    }

    #[test]
    fn plain_stream_can_be_recreated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.out");
        std::fs::write(&path, "one\ntwo\n").unwrap();

        let mut decoded = DecodedFile::open(&path).unwrap();
        let mut first = String::new();
        decoded.stream().unwrap().read_to_string(&mut first).unwrap();
        let mut second = String::new();
        decoded.stream().unwrap().read_to_string(&mut second).unwrap();

        assert_eq!(first, "one\ntwo\n");
        assert_eq!(first, second);
    }

    #[test]
    fn gzip_stream_can_be_recreated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.out.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"alpha\nbeta\n").unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let mut decoded = DecodedFile::open(&path).unwrap();
        assert_eq!(decoded.encoding(), Encoding::Gzip);

        let mut first = String::new();
        decoded.stream().unwrap().read_to_string(&mut first).unwrap();
        let mut second = String::new();
        decoded.stream().unwrap().read_to_string(&mut second).unwrap();

        assert_eq!(first, "alpha\nbeta\n");
        assert_eq!(first, second);
    }

    #[test]
    fn corrupt_gzip_surfaces_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.out.gz");
        std::fs::write(&path, b"this is not gzip data").unwrap();

        let mut decoded = DecodedFile::open(&path).unwrap();
        let mut sink = String::new();
        assert!(decoded.stream().unwrap().read_to_string(&mut sink).is_err());
    }
}
