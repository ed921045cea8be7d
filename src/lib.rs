//! MySQL 복제 상태의 GTID 처리 핵심 구현
//!
//! failover 도구가 승격 지점을 고를 때 쓰는 사실들을 서버 상태 출력에서 뽑아냅니다.
//! 주요 기능:
//! - GTID 집합 문자열 파싱 및 구간 병합
//! - `SHOW MASTER STATUS` / `SHOW SLAVE STATUS` 행 추출
//! - source UUID 별 다음 트랜잭션 번호 계산

pub mod connection;
pub mod error;
pub mod gtid;
pub mod offset;
pub mod status;

pub use connection::{ConnectionConfig, MySqlConnection};
pub use error::{ReplicationError, Result};
pub use gtid::{next_txn_id, GtidSet, Interval, IntervalSet};
pub use offset::BinlogPosition;
pub use status::{
    extract_master_status, extract_slave_status, MasterStatus, StatusColumns, StatusMap,
    StatusRow, StatusValue,
};
