//! GTID 파싱 및 상태 추출 에러 타입

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplicationError {
    #[error("GTID 파싱 에러: {0}")]
    ParseError(String),

    #[error("상태 컬럼 없음: {0}")]
    MissingColumn(String),

    #[error("유효하지 않은 컬럼 값 {column}: {reason}")]
    InvalidColumn { column: String, reason: String },

    #[error("알 수 없는 source UUID: {0}")]
    UnknownSource(String),

    #[error("트랜잭션 범위가 비어 있음: {0}")]
    EmptySource(String),

    #[error("MySQL 연결 에러: {0}")]
    ConnectionError(String),

    #[error("쿼리 실행 에러: {0}")]
    QueryError(String),

    #[error("직렬화 에러: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<mysql_async::Error> for ReplicationError {
    fn from(err: mysql_async::Error) -> Self {
        ReplicationError::QueryError(err.to_string())
    }
}

impl ReplicationError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        ReplicationError::ParseError(msg.into())
    }

    /// 파싱 에러 여부 (서버 출력 자체가 깨진 경우)
    pub fn is_parse_error(&self) -> bool {
        matches!(self, ReplicationError::ParseError(_))
    }
}

pub type Result<T> = std::result::Result<T, ReplicationError>;
