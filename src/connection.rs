//! MySQL 상태 조회 연결
//!
//! 쿼리를 실행해 받은 행을 [`StatusRow`] 로 바꾸고 `status` 모듈의 추출기에 넘깁니다.

use crate::error::{ReplicationError, Result};
use crate::gtid::GtidSet;
use crate::status::{
    extract_master_status, extract_slave_status, MasterStatus, StatusColumns, StatusMap,
    StatusRow, StatusValue,
};
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Pool, Row, Value};
use std::time::Duration;
use tracing::{debug, info};

/// MySQL 연결 설정
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: Option<String>,
    /// 연결 수립 제한 시간
    pub timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            hostname: "localhost".to_string(),
            port: 3306,
            username: "root".to_string(),
            password: String::new(),
            database: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ConnectionConfig {
    pub fn new(hostname: impl Into<String>, username: impl Into<String>) -> Self {
        ConnectionConfig {
            hostname: hostname.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    fn build_opts(&self) -> Opts {
        OptsBuilder::default()
            .ip_or_hostname(self.hostname.clone())
            .tcp_port(self.port)
            .user(Some(self.username.clone()))
            .pass(Some(self.password.clone()))
            .db_name(self.database.clone())
            .into()
    }
}

/// 상태 조회용 MySQL 연결
pub struct MySqlConnection {
    pool: Pool,
    conn: Conn,
}

impl MySqlConnection {
    pub async fn connect(config: ConnectionConfig) -> Result<Self> {
        let pool = Pool::new(config.build_opts());

        let conn = tokio::time::timeout(config.timeout, pool.get_conn())
            .await
            .map_err(|_| {
                ReplicationError::ConnectionError(format!(
                    "Timed out connecting to {}:{}",
                    config.hostname, config.port
                ))
            })?
            .map_err(|e| {
                ReplicationError::ConnectionError(format!("Failed to connect to MySQL: {}", e))
            })?;

        info!("Connected to MySQL {}:{}", config.hostname, config.port);
        Ok(MySqlConnection { pool, conn })
    }

    /// `SHOW MASTER STATUS` 결과에서 binlog 위치와 실행 GTID 집합 조회
    pub async fn master_status(&mut self) -> Result<MasterStatus> {
        let row = self
            .query_status_row("SHOW MASTER STATUS")
            .await?
            .ok_or_else(|| ReplicationError::QueryError("No binlog status available".to_string()))?;

        extract_master_status(&row)
    }

    /// `SHOW SLAVE STATUS` 결과. replica 가 아니면 `None`
    pub async fn slave_status(&mut self, columns: &StatusColumns) -> Result<Option<StatusMap>> {
        let row = self.query_status_row("SHOW SLAVE STATUS").await?;
        if row.is_none() {
            debug!("Server is not configured as a replica");
        }
        Ok(row.map(|row| extract_slave_status(row, columns)))
    }

    /// 서버 자신의 source UUID
    pub async fn server_uuid(&mut self) -> Result<String> {
        let uuid: Option<String> = self.conn.query_first("SELECT @@server_uuid").await?;
        uuid.ok_or_else(|| ReplicationError::QueryError("server_uuid not available".to_string()))
    }

    /// 현재 실행된 GTID 집합 조회
    pub async fn executed_gtid_set(&mut self) -> Result<GtidSet> {
        let gtid_executed: Option<String> =
            self.conn.query_first("SELECT @@global.gtid_executed").await?;

        match gtid_executed {
            Some(text) => GtidSet::parse(&text),
            None => Ok(GtidSet::new()),
        }
    }

    /// 해당 source 의 다음 미사용 트랜잭션 번호
    pub async fn next_txn_id(&mut self, source_uuid: &str) -> Result<i64> {
        self.executed_gtid_set().await?.next_txn_id(source_uuid)
    }

    async fn query_status_row(&mut self, query: &str) -> Result<Option<StatusRow>> {
        debug!("Executing status query: {}", query);
        let row: Option<Row> = self.conn.query_first(query).await?;
        Ok(row.map(status_row))
    }

    pub async fn close(self) -> Result<()> {
        drop(self.conn);
        self.pool.disconnect().await?;
        Ok(())
    }
}

/// MySQL 행을 컬럼명 -> 값 매핑으로 변환
pub fn status_row(row: Row) -> StatusRow {
    row.columns_ref()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let value = row.as_ref(i).cloned().unwrap_or(Value::NULL);
            (column.name_str().into_owned(), StatusValue::from(value))
        })
        .collect()
}

impl From<Value> for StatusValue {
    fn from(value: Value) -> Self {
        match value {
            Value::NULL => StatusValue::Null,
            Value::Bytes(bytes) => StatusValue::Text(String::from_utf8_lossy(&bytes).into_owned()),
            Value::Int(v) => StatusValue::Int(v),
            Value::UInt(v) => StatusValue::UInt(v),
            Value::Float(v) => StatusValue::Text(v.to_string()),
            Value::Double(v) => StatusValue::Text(v.to_string()),
            // 날짜/시간은 SQL 리터럴에서 따옴표만 제거
            other => StatusValue::Text(other.as_sql(true).trim_matches('\'').to_string()),
        }
    }
}
