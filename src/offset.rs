//! Binlog 위치 (파일명 + 바이트 위치)
//!
//! 예: "mysql-bin.000005" 파일의 188858056 바이트 위치

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binlog 파일 위치 정보. 상태 조회마다 새로 만들어지는 스냅샷
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BinlogPosition {
    /// 바이너리 로그 파일명 (e.g., "mysql-bin.000001")
    pub name: String,
    /// 바이트 위치
    pub pos: u32,
}

impl BinlogPosition {
    pub fn new(name: impl Into<String>, pos: u32) -> Self {
        BinlogPosition {
            name: name.into(),
            pos,
        }
    }

    /// 파일명에서 시퀀스 번호 추출
    pub fn file_sequence(&self) -> Option<u64> {
        self.name
            .rsplit_once('.')
            .and_then(|(_, seq)| seq.parse().ok())
    }
}

impl fmt::Display for BinlogPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binlog_position_file_sequence() {
        let pos = BinlogPosition::new("mysql-bin.000123", 4096);
        assert_eq!(pos.file_sequence(), Some(123));
        assert_eq!(BinlogPosition::new("relaylog", 4).file_sequence(), None);
    }

    #[test]
    fn test_binlog_position_display() {
        let pos = BinlogPosition::new("mysql-bin.000005", 188858056);
        assert_eq!(pos.to_string(), "mysql-bin.000005:188858056");
    }
}
