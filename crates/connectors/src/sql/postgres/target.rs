use crate::{
    error::ConnectorError,
    sql::{
        postgres::{
            params::PgParamStore,
            utils::{connect_with_retry, ping},
        },
        query::{insert_rows, rows_per_statement},
    },
};
use async_trait::async_trait;
use engine_core::{connectors::target::TargetStore, error::StoreError, retry::RetryPolicy};
use model::records::{
    key::NaturalKey,
    target::{NewResume, NewUser},
};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tokio::sync::RwLock;
use tokio_postgres::{Client, Row, types::Json};
use tracing::debug;

const QUERY_USERS_EXISTING_SQL: &str = include_str!("sql/users_existing.sql");
const QUERY_RESUMES_EXISTING_SQL: &str = include_str!("sql/resumes_existing.sql");

const USER_TABLE: &str = "user";
const USER_COLUMNS: &[&str] = &[
    "id",
    "name",
    "email",
    "email_verified",
    "image",
    "username",
    "display_username",
    "two_factor_enabled",
    "created_at",
    "updated_at",
];

const ACCOUNT_TABLE: &str = "account";
const ACCOUNT_COLUMNS: &[&str] = &[
    "id",
    "account_id",
    "provider_id",
    "user_id",
    "password",
    "created_at",
    "updated_at",
];

const RESUME_TABLE: &str = "resume";
const RESUME_COLUMNS: &[&str] = &[
    "id",
    "name",
    "slug",
    "tags",
    "is_public",
    "is_locked",
    "data",
    "user_id",
    "created_at",
    "updated_at",
];

const STATISTICS_TABLE: &str = "resume_statistics";
const STATISTICS_COLUMNS: &[&str] = &[
    "id",
    "views",
    "downloads",
    "resume_id",
    "created_at",
    "updated_at",
];

/// Write side of the new database.
#[derive(Clone)]
pub struct PgTarget {
    client: Arc<RwLock<Client>>,
}

impl PgTarget {
    pub async fn connect(url: &str, retry: &RetryPolicy) -> Result<Self, ConnectorError> {
        let client = connect_with_retry("target", url, retry).await?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client: Arc::new(RwLock::new(client)),
        }
    }

    pub async fn ping(&self) -> Result<(), ConnectorError> {
        ping(&*self.client.read().await).await
    }

    /// Inserts all rows in one transaction, split into as many statements as
    /// the bind parameter limit requires.
    async fn insert_all<R>(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[R],
        bind: impl Fn(&R, &mut PgParamStore),
    ) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut client = self.client.write().await;
        let tx = client.transaction().await.map_err(write_error)?;

        let per_statement = rows_per_statement(columns.len(), rows.len());
        for part in rows.chunks(per_statement) {
            let sql = insert_rows(table, columns, part.len());
            let mut params = PgParamStore::with_capacity(part.len() * columns.len());
            for row in part {
                bind(row, &mut params);
            }
            tx.execute(&sql, &params.as_refs())
                .await
                .map_err(write_error)?;
        }

        tx.commit().await.map_err(write_error)?;
        debug!(table, rows = rows.len(), "Rows inserted");
        Ok(())
    }

    async fn query(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<Vec<Row>, StoreError> {
        let client = self.client.read().await;
        let rows = client
            .query(sql, params)
            .await
            .map_err(ConnectorError::from)?;
        Ok(rows)
    }
}

fn write_error(err: tokio_postgres::Error) -> StoreError {
    if err.is_closed() {
        StoreError::Connection(err.to_string())
    } else {
        StoreError::Write(err.to_string())
    }
}

fn column(row: &Row, name: &'static str) -> Result<String, StoreError> {
    row.try_get(name).map_err(|e| {
        ConnectorError::Decode {
            column: name,
            reason: e.to_string(),
        }
        .into()
    })
}

fn optional_column(row: &Row, name: &'static str) -> Result<Option<String>, StoreError> {
    row.try_get(name).map_err(|e| {
        ConnectorError::Decode {
            column: name,
            reason: e.to_string(),
        }
        .into()
    })
}

/// Natural keys of an existing user row. NULL columns contribute none.
fn user_keys(
    email: Option<String>,
    username: Option<String>,
    display_username: Option<String>,
) -> Vec<NaturalKey> {
    [
        email.map(NaturalKey::Email),
        username.map(NaturalKey::Username),
        display_username.map(NaturalKey::DisplayUsername),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn bind_user(user: &NewUser, params: &mut PgParamStore) {
    params.push(user.id.clone());
    params.push(user.name.clone());
    params.push(user.email.clone());
    params.push(user.email_verified);
    params.push(user.image.clone());
    params.push(user.username.clone());
    params.push(user.display_username.clone());
    params.push(user.two_factor_enabled);
    params.push(user.created_at);
    params.push(user.updated_at);
}

fn bind_account(user: &NewUser, params: &mut PgParamStore) {
    let account = &user.account;
    params.push(account.id.clone());
    params.push(account.account_id.clone());
    params.push(account.provider_id.clone());
    params.push(account.user_id.clone());
    params.push(account.password.clone());
    params.push(account.created_at);
    params.push(account.updated_at);
}

fn bind_resume(resume: &NewResume, params: &mut PgParamStore) {
    params.push(resume.id.clone());
    params.push(resume.name.clone());
    params.push(resume.slug.clone());
    params.push(resume.tags.clone());
    params.push(resume.is_public);
    params.push(resume.is_locked);
    params.push(Json(resume.data.clone()));
    params.push(resume.user_id.clone());
    params.push(resume.created_at);
    params.push(resume.updated_at);
}

fn bind_statistics(resume: &NewResume, params: &mut PgParamStore) {
    let statistics = &resume.statistics;
    params.push(statistics.id.clone());
    params.push(statistics.views);
    params.push(statistics.downloads);
    params.push(statistics.resume_id.clone());
    params.push(statistics.created_at);
    params.push(statistics.updated_at);
}

#[async_trait]
impl TargetStore<NewUser> for PgTarget {
    async fn find_existing(
        &self,
        keys: &[NaturalKey],
    ) -> Result<HashMap<NaturalKey, String>, StoreError> {
        let mut emails = Vec::new();
        let mut usernames = Vec::new();
        let mut display_usernames = Vec::new();
        for key in keys {
            match key {
                NaturalKey::Email(email) => emails.push(email.as_str()),
                NaturalKey::Username(name) => usernames.push(name.as_str()),
                NaturalKey::DisplayUsername(name) => display_usernames.push(name.as_str()),
                NaturalKey::Slug { .. } => {}
            }
        }

        let rows = self
            .query(
                QUERY_USERS_EXISTING_SQL,
                &[&emails, &usernames, &display_usernames],
            )
            .await?;

        let wanted: HashSet<&NaturalKey> = keys.iter().collect();
        let mut found = HashMap::new();
        for row in &rows {
            let id = column(row, "id")?;
            let candidates = user_keys(
                optional_column(row, "email")?,
                optional_column(row, "username")?,
                optional_column(row, "display_username")?,
            );
            for key in candidates {
                if wanted.contains(&key) {
                    found.entry(key).or_insert_with(|| id.clone());
                }
            }
        }
        Ok(found)
    }

    async fn insert(&self, rows: &[NewUser]) -> Result<(), StoreError> {
        self.insert_all(USER_TABLE, USER_COLUMNS, rows, bind_user)
            .await
    }

    async fn insert_dependents(&self, rows: &[NewUser]) -> Result<usize, StoreError> {
        self.insert_all(ACCOUNT_TABLE, ACCOUNT_COLUMNS, rows, bind_account)
            .await?;
        Ok(rows.len())
    }
}

#[async_trait]
impl TargetStore<NewResume> for PgTarget {
    async fn find_existing(
        &self,
        keys: &[NaturalKey],
    ) -> Result<HashMap<NaturalKey, String>, StoreError> {
        let (slugs, owners): (Vec<&str>, Vec<&str>) = keys
            .iter()
            .filter_map(|key| match key {
                NaturalKey::Slug { slug, user_id } => Some((slug.as_str(), user_id.as_str())),
                _ => None,
            })
            .unzip();

        let rows = self
            .query(QUERY_RESUMES_EXISTING_SQL, &[&slugs, &owners])
            .await?;

        let mut found = HashMap::new();
        for row in &rows {
            let key = NaturalKey::Slug {
                slug: column(row, "slug")?,
                user_id: column(row, "user_id")?,
            };
            found.entry(key).or_insert(column(row, "id")?);
        }
        Ok(found)
    }

    async fn insert(&self, rows: &[NewResume]) -> Result<(), StoreError> {
        self.insert_all(RESUME_TABLE, RESUME_COLUMNS, rows, bind_resume)
            .await
    }

    async fn insert_dependents(&self, rows: &[NewResume]) -> Result<usize, StoreError> {
        self.insert_all(STATISTICS_TABLE, STATISTICS_COLUMNS, rows, bind_statistics)
            .await?;
        Ok(rows.len())
    }
}
