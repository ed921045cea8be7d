//! `SHOW MASTER STATUS` / `SHOW SLAVE STATUS` 행에서 상태 정보 추출
//!
//! 행은 외부 쿼리 실행기가 넘겨주는 컬럼명 -> 값 매핑이며,
//! 이 모듈은 DB 에 직접 접근하지 않습니다.

use crate::error::{ReplicationError, Result};
use crate::gtid::GtidSet;
use crate::offset::BinlogPosition;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

pub const COLUMN_FILE: &str = "File";
pub const COLUMN_POSITION: &str = "Position";
pub const COLUMN_BINLOG_DO_DB: &str = "Binlog_Do_DB";
pub const COLUMN_BINLOG_IGNORE_DB: &str = "Binlog_Ignore_DB";
pub const COLUMN_EXECUTED_GTID_SET: &str = "Executed_Gtid_Set";

/// 문자열로 정규화되는 slave 상태의 위치/카운터 컬럼 기본값
pub const DEFAULT_NUMERIC_COLUMNS: &[&str] = &[
    "Exec_Master_Log_Pos",
    "Read_Master_Log_Pos",
    "Relay_Log_Pos",
    "Relay_Log_Space",
    "Skip_Counter",
];

/// 스캔된 컬럼 값
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Null,
    Int(i64),
    UInt(u64),
    Text(String),
}

impl StatusValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StatusValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StatusValue::Null)
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusValue::Null => f.write_str("NULL"),
            StatusValue::Int(v) => write!(f, "{}", v),
            StatusValue::UInt(v) => write!(f, "{}", v),
            StatusValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for StatusValue {
    fn from(s: &str) -> Self {
        StatusValue::Text(s.to_string())
    }
}

impl From<String> for StatusValue {
    fn from(s: String) -> Self {
        StatusValue::Text(s)
    }
}

impl From<i64> for StatusValue {
    fn from(v: i64) -> Self {
        StatusValue::Int(v)
    }
}

impl From<u64> for StatusValue {
    fn from(v: u64) -> Self {
        StatusValue::UInt(v)
    }
}

/// 상태 조회 결과 한 행 (컬럼명 -> 값)
pub type StatusRow = HashMap<String, StatusValue>;

/// 정규화를 마친 slave 상태 매핑
pub type StatusMap = HashMap<String, StatusValue>;

/// 10진 문자열로 강제 변환할 컬럼 목록
///
/// 위치 값은 다른 곳에서 binlog 위치 텍스트와 비교하거나 출력하기 때문에
/// 드라이버가 정수로 넘기든 문자열로 넘기든 같은 문자열이 되어야 합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusColumns {
    columns: BTreeSet<String>,
}

impl Default for StatusColumns {
    fn default() -> Self {
        StatusColumns::new(DEFAULT_NUMERIC_COLUMNS.iter().copied())
    }
}

impl StatusColumns {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StatusColumns {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.columns.insert(column.into());
        self
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    /// 목록에 있는 컬럼이면 정수를 10진 문자열로 바꾸고, 아니면 그대로 반환
    pub fn normalize(&self, column: &str, value: StatusValue) -> StatusValue {
        if !self.contains(column) {
            return value;
        }

        match value {
            StatusValue::Int(v) => StatusValue::Text(v.to_string()),
            StatusValue::UInt(v) => StatusValue::Text(v.to_string()),
            // "0042" 같은 텍스트도 정수 표기로 통일
            StatusValue::Text(s) => match s.parse::<u64>() {
                Ok(v) => StatusValue::Text(v.to_string()),
                Err(_) => StatusValue::Text(s),
            },
            StatusValue::Null => StatusValue::Null,
        }
    }
}

/// `SHOW MASTER STATUS` 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterStatus {
    pub position: BinlogPosition,
    pub executed_gtid_set: GtidSet,
    pub binlog_do_db: Option<String>,
    pub binlog_ignore_db: Option<String>,
}

/// master 상태 행에서 binlog 위치와 실행 GTID 집합 추출
pub fn extract_master_status(row: &StatusRow) -> Result<MasterStatus> {
    let file = match required(row, COLUMN_FILE)? {
        StatusValue::Text(s) => s.clone(),
        other => return Err(invalid(COLUMN_FILE, format!("expected file name, got {}", other))),
    };

    let pos_value = required(row, COLUMN_POSITION)?;
    let pos = match pos_value {
        StatusValue::UInt(v) => u32::try_from(*v).ok(),
        StatusValue::Int(v) => u32::try_from(*v).ok(),
        StatusValue::Text(s) => s.parse::<u32>().ok(),
        StatusValue::Null => None,
    }
    .ok_or_else(|| invalid(COLUMN_POSITION, format!("not a 32-bit offset: {}", pos_value)))?;

    // GTID 모드가 꺼진 서버는 NULL 을 돌려줄 수 있음
    let executed_gtid_set = match required(row, COLUMN_EXECUTED_GTID_SET)? {
        StatusValue::Text(s) => GtidSet::parse(s)?,
        StatusValue::Null => GtidSet::new(),
        other => {
            return Err(invalid(
                COLUMN_EXECUTED_GTID_SET,
                format!("expected GTID set text, got {}", other),
            ))
        }
    };

    let position = BinlogPosition::new(file, pos);
    debug!(
        "Master status: {} executed_gtid_set={}",
        position, executed_gtid_set
    );

    Ok(MasterStatus {
        position,
        executed_gtid_set,
        binlog_do_db: optional_text(row, COLUMN_BINLOG_DO_DB),
        binlog_ignore_db: optional_text(row, COLUMN_BINLOG_IGNORE_DB),
    })
}

/// slave 상태 행의 모든 컬럼을 유지하고, `columns` 에 있는 컬럼만 문자열로 정규화
pub fn extract_slave_status(row: StatusRow, columns: &StatusColumns) -> StatusMap {
    row.into_iter()
        .map(|(column, value)| {
            let value = columns.normalize(&column, value);
            (column, value)
        })
        .collect()
}

/// 상태 매핑을 JSON 으로 변환 (정수는 숫자, NULL 은 null)
pub fn status_to_json(status: &StatusMap) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(status)?)
}

fn required<'a>(row: &'a StatusRow, column: &str) -> Result<&'a StatusValue> {
    row.get(column)
        .ok_or_else(|| ReplicationError::MissingColumn(column.to_string()))
}

fn optional_text(row: &StatusRow, column: &str) -> Option<String> {
    row.get(column)
        .and_then(StatusValue::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn invalid(column: &str, reason: String) -> ReplicationError {
    ReplicationError::InvalidColumn {
        column: column.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtid::Interval;

    const UUID: &str = "85ab69d1-b21f-11e6-9c5e-64006a8978d2";

    fn row(values: Vec<(&str, StatusValue)>) -> StatusRow {
        values
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn master_row() -> StatusRow {
        row(vec![
            (COLUMN_FILE, "mysql-bin.000005".into()),
            (COLUMN_POSITION, 188858056i64.into()),
            (COLUMN_BINLOG_DO_DB, "".into()),
            (COLUMN_BINLOG_IGNORE_DB, "".into()),
            (COLUMN_EXECUTED_GTID_SET, format!("{}:1-46:49-50", UUID).into()),
        ])
    }

    #[test]
    fn test_extract_master_status() {
        let status = extract_master_status(&master_row()).unwrap();
        assert_eq!(status.position, BinlogPosition::new("mysql-bin.000005", 188858056));
        assert_eq!(status.binlog_do_db, None);
        assert_eq!(status.binlog_ignore_db, None);

        assert_eq!(status.executed_gtid_set.len(), 1);
        let set = status.executed_gtid_set.get(UUID).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.intervals()[0], Interval::new(1, 47).unwrap());
        assert_eq!(set.intervals()[1], Interval::new(49, 51).unwrap());
    }

    #[test]
    fn test_extract_master_status_text_position() {
        let mut r = master_row();
        r.insert(COLUMN_POSITION.to_string(), "4".into());
        r.insert(COLUMN_BINLOG_DO_DB.to_string(), "app".into());
        let status = extract_master_status(&r).unwrap();
        assert_eq!(status.position.pos, 4);
        assert_eq!(status.binlog_do_db.as_deref(), Some("app"));
    }

    #[test]
    fn test_extract_master_status_missing_column() {
        for column in [COLUMN_FILE, COLUMN_POSITION, COLUMN_EXECUTED_GTID_SET] {
            let mut r = master_row();
            r.remove(column);
            match extract_master_status(&r) {
                Err(ReplicationError::MissingColumn(c)) => assert_eq!(c, column),
                other => panic!("expected missing column {}, got {:?}", column, other),
            }
        }
    }

    #[test]
    fn test_extract_master_status_invalid_position() {
        let mut r = master_row();
        r.insert(COLUMN_POSITION.to_string(), StatusValue::UInt(u64::from(u32::MAX) + 1));
        assert!(matches!(
            extract_master_status(&r),
            Err(ReplicationError::InvalidColumn { .. })
        ));
    }

    #[test]
    fn test_extract_master_status_propagates_parse_error() {
        let mut r = master_row();
        r.insert(COLUMN_EXECUTED_GTID_SET.to_string(), format!("{}:", UUID).into());
        assert!(matches!(
            extract_master_status(&r),
            Err(ReplicationError::ParseError(_))
        ));
    }

    #[test]
    fn test_extract_master_status_null_gtid_set() {
        let mut r = master_row();
        r.insert(COLUMN_EXECUTED_GTID_SET.to_string(), StatusValue::Null);
        let status = extract_master_status(&r).unwrap();
        assert!(status.executed_gtid_set.is_empty());
    }

    #[test]
    fn test_extract_slave_status() {
        let titles = [
            "Relay_Master_Log_File",
            "Exec_Master_Log_Pos",
            "Executed_Gtid_Set",
            "Master_UUID",
            "Slave_IO_Running",
            "Slave_SQL_Running",
            "Seconds_Behind_Master",
        ];
        let values: Vec<StatusValue> = vec![
            "mysql-bin.000005".into(),
            188858056i64.into(),
            format!("{}:1-46", UUID).into(),
            UUID.into(),
            "Yes".into(),
            "No".into(),
            "5".into(),
        ];
        let r: StatusRow = titles
            .iter()
            .map(|t| t.to_string())
            .zip(values.iter().cloned())
            .collect();

        let status = extract_slave_status(r, &StatusColumns::default());
        assert_eq!(status.len(), titles.len());
        for (i, title) in titles.iter().enumerate() {
            let value = &status[*title];
            if i != 1 {
                assert_eq!(value, &values[i]);
            } else {
                assert_eq!(value, &StatusValue::Text("188858056".to_string()));
            }
        }
    }

    #[test]
    fn test_extract_slave_status_keeps_unknown_columns() {
        let r = row(vec![
            ("Read_Master_Log_Pos", StatusValue::UInt(120)),
            ("Relay_Log_Pos", "0042".into()),
            ("Last_Errno", StatusValue::Int(0)),
            ("Some_Future_Column", StatusValue::Null),
        ]);
        let status = extract_slave_status(r, &StatusColumns::default());
        assert_eq!(status["Read_Master_Log_Pos"], StatusValue::Text("120".to_string()));
        assert_eq!(status["Relay_Log_Pos"], StatusValue::Text("42".to_string()));
        assert_eq!(status["Last_Errno"], StatusValue::Int(0));
        assert_eq!(status["Some_Future_Column"], StatusValue::Null);
    }

    #[test]
    fn test_status_columns_configurable() {
        let columns = StatusColumns::new(["Exec_Master_Log_Pos"]).with_column("Last_Errno");
        assert!(columns.contains("Last_Errno"));
        assert!(!columns.contains("Relay_Log_Pos"));

        let r = row(vec![
            ("Last_Errno", StatusValue::Int(1062)),
            ("Relay_Log_Pos", StatusValue::UInt(7)),
        ]);
        let status = extract_slave_status(r, &columns);
        assert_eq!(status["Last_Errno"], StatusValue::Text("1062".to_string()));
        assert_eq!(status["Relay_Log_Pos"], StatusValue::UInt(7));
    }

    #[test]
    fn test_status_to_json() {
        let r = row(vec![
            ("Exec_Master_Log_Pos", StatusValue::UInt(188858056)),
            ("Seconds_Behind_Master", StatusValue::Null),
            ("Last_Errno", StatusValue::Int(0)),
        ]);
        let json = status_to_json(&extract_slave_status(r, &StatusColumns::default())).unwrap();
        assert_eq!(json["Exec_Master_Log_Pos"], "188858056");
        assert!(json["Seconds_Behind_Master"].is_null());
        assert_eq!(json["Last_Errno"], 0);
    }
}
