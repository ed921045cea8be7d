/// MySQL 복제 상태 조회 예제
///
/// master/slave 상태와 GTID 집합을 읽고, `GTID_SOURCE` 가 주어지면 다음 트랜잭션 번호를 출력합니다.
use mysql_gtid_status::status::status_to_json;
use mysql_gtid_status::{ConnectionConfig, MySqlConnection, StatusColumns};
use std::env;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 로깅 초기화
    tracing_subscriber::fmt::init();

    let config = ConnectionConfig {
        hostname: env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
        port: env::var("DB_PORT")
            .unwrap_or_else(|_| "3306".to_string())
            .parse()
            .unwrap_or(3306),
        username: env::var("DB_USER").unwrap_or_else(|_| "root".to_string()),
        password: env::var("DB_PASSWORD").unwrap_or_default(),
        ..Default::default()
    };

    info!("Connecting to {}:{}", config.hostname, config.port);
    let mut conn = MySqlConnection::connect(config).await?;

    let master = conn.master_status().await?;
    info!("Binlog position: {}", master.position);
    info!("Executed GTID set: {}", master.executed_gtid_set);

    match conn.slave_status(&StatusColumns::default()).await? {
        Some(status) => info!("Slave status: {}", status_to_json(&status)?),
        None => info!("Server is not a replica"),
    }

    let source = match env::var("GTID_SOURCE") {
        Ok(source) => source,
        Err(_) => conn.server_uuid().await?,
    };
    match master.executed_gtid_set.next_txn_id(&source) {
        Ok(txn_id) => info!("Next transaction id for {}: {}", source, txn_id),
        Err(e) => warn!("Cannot compute next transaction id for {}: {}", source, e),
    }

    conn.close().await?;
    Ok(())
}
