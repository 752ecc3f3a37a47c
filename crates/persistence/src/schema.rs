//! ScyllaDB schema creation
//!
//! Timestamps are stored as BIGINT epoch milliseconds. Daily analytics live
//! in a counter table so concurrent increments never lose updates.

use crate::error::PersistenceError;
use scylla::Session;

pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), PersistenceError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    );

    session
        .query_unpaged(query, &[])
        .await
        .map_err(|e| PersistenceError::SchemaError(format!("Failed to create keyspace: {}", e)))?;

    Ok(())
}

fn table_statements(keyspace: &str) -> Vec<(&'static str, String)> {
    vec![
        (
            "product_embeddings",
            format!(
                r#"
        CREATE TABLE IF NOT EXISTS {}.product_embeddings (
            shop_id TEXT,
            product_id TEXT,
            model_id TEXT,
            vector LIST<FLOAT>,
            created_at BIGINT,
            updated_at BIGINT,
            PRIMARY KEY ((shop_id), product_id)
        )
    "#,
                keyspace
            ),
        ),
        (
            "user_profiles",
            format!(
                r#"
        CREATE TABLE IF NOT EXISTS {}.user_profiles (
            shop_id TEXT,
            session_id TEXT,
            profile_id UUID,
            customer_id TEXT,
            preferences_json TEXT,
            browsing_history LIST<TEXT>,
            interactions_json TEXT,
            created_at BIGINT,
            updated_at BIGINT,
            PRIMARY KEY ((shop_id), session_id)
        )
    "#,
                keyspace
            ),
        ),
        (
            "chat_sessions",
            format!(
                r#"
        CREATE TABLE IF NOT EXISTS {}.chat_sessions (
            shop_id TEXT,
            profile_id UUID,
            chat_session_id UUID,
            started_at BIGINT,
            last_activity BIGINT,
            PRIMARY KEY ((shop_id, profile_id), chat_session_id)
        )
    "#,
                keyspace
            ),
        ),
        (
            "chat_messages",
            format!(
                r#"
        CREATE TABLE IF NOT EXISTS {}.chat_messages (
            chat_session_id UUID,
            created_at BIGINT,
            message_id UUID,
            role TEXT,
            content TEXT,
            intent TEXT,
            sentiment TEXT,
            confidence FLOAT,
            products_shown LIST<TEXT>,
            PRIMARY KEY ((chat_session_id), created_at, message_id)
        ) WITH CLUSTERING ORDER BY (created_at ASC, message_id ASC)
    "#,
                keyspace
            ),
        ),
        (
            "daily_counters",
            format!(
                r#"
        CREATE TABLE IF NOT EXISTS {}.daily_counters (
            shop_id TEXT,
            day TEXT,
            dimension TEXT,
            key TEXT,
            value COUNTER,
            PRIMARY KEY ((shop_id, day), dimension, key)
        )
    "#,
                keyspace
            ),
        ),
        (
            "conversation_usage",
            format!(
                r#"
        CREATE TABLE IF NOT EXISTS {}.conversation_usage (
            shop_id TEXT,
            period TEXT,
            recorded_at BIGINT,
            usage_id UUID,
            session_id TEXT,
            PRIMARY KEY ((shop_id, period), recorded_at, usage_id)
        )
    "#,
                keyspace
            ),
        ),
        (
            "shop_settings",
            format!(
                r#"
        CREATE TABLE IF NOT EXISTS {}.shop_settings (
            shop_id TEXT,
            plan TEXT,
            workflow_type TEXT,
            webhook_url TEXT,
            webhook_secret TEXT,
            policies_json TEXT,
            updated_at BIGINT,
            PRIMARY KEY (shop_id)
        )
    "#,
                keyspace
            ),
        ),
    ]
}

/// Create all required tables
pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), PersistenceError> {
    for (name, statement) in table_statements(keyspace) {
        session.query_unpaged(statement, &[]).await.map_err(|e| {
            PersistenceError::SchemaError(format!("Failed to create {} table: {}", name, e))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_is_keyspace_qualified() {
        let statements = table_statements("shopchat");
        assert_eq!(statements.len(), 7);
        for (name, statement) in statements {
            assert!(statement.contains(&format!("shopchat.{}", name)), "{}", name);
            assert!(statement.contains("IF NOT EXISTS"));
        }
    }
}
