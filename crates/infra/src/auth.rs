use anyhow::Context;
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};

use crate::db::DbConfig;

/// Validates SurrealDB access tokens and resolves the caller's identity
/// row. Sessions are authenticated against the record-access token the
/// frontend obtained from the database's auth subsystem.
#[derive(Clone)]
pub struct SurrealAuthService {
    config: DbConfig,
    db: Surreal<Client>,
}

#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub user_id: String,
    pub username: String,
    pub platform_role: String,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub identity: AuthIdentity,
}

#[derive(Debug, Deserialize)]
struct IdentityRow {
    id: String,
    email: Option<String>,
    platform_role: Option<String>,
}

impl SurrealAuthService {
    pub async fn new(config: DbConfig) -> anyhow::Result<Self> {
        let db = Surreal::<Client>::init();
        db.connect::<Ws>(&config.endpoint)
            .await
            .with_context(|| format!("connect surrealdb endpoint {}", config.endpoint))?;
        Ok(Self { config, db })
    }

    pub async fn validate(&self, access_token: &str) -> anyhow::Result<AuthSession> {
        let session = self.db.clone();
        session
            .authenticate(access_token.to_string())
            .await
            .context("surreal authenticate")?;
        session
            .use_ns(&self.config.namespace)
            .use_db(&self.config.database)
            .await
            .context("select surrealdb namespace/database")?;

        let mut response = session
            .query("SELECT type::string(id) AS id, email, platform_role FROM $auth.id")
            .await
            .context("select $auth identity")?;
        let rows: Vec<serde_json::Value> =
            response.take(0).context("decode $auth identity rows")?;
        let row: IdentityRow = rows
            .into_iter()
            .next()
            .map(serde_json::from_value)
            .transpose()
            .context("decode $auth identity row")?
            .context("missing $auth identity row")?;

        let user_id = record_id_to_raw(&row.id).to_string();
        let identity = AuthIdentity {
            username: row.email.unwrap_or_else(|| user_id.clone()),
            platform_role: row.platform_role.unwrap_or_else(|| "adopter".to_string()),
            user_id,
        };
        Ok(AuthSession { identity })
    }
}

fn record_id_to_raw(value: &str) -> &str {
    value.split_once(':').map(|(_, id)| id).unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ids_strip_table_prefix() {
        assert_eq!(record_id_to_raw("user_profiles:abc123"), "abc123");
        assert_eq!(record_id_to_raw("abc123"), "abc123");
    }
}
