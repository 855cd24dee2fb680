use crate::{
    error::ConnectorError,
    sql::{
        postgres::utils::{connect_with_retry, ping},
        query::PageQuery,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use engine_core::{connectors::source::SourceStore, error::StoreError, retry::RetryPolicy};
use model::{
    pagination::cursor::Cursor,
    records::legacy::{LegacyResume, LegacySecrets, LegacyStatistics, LegacyUser},
};
use std::{collections::HashMap, sync::Arc};
use tokio_postgres::{Client, Row, types::FromSql};
use tracing::debug;

const QUERY_SECRETS_BY_USER_SQL: &str = include_str!("sql/secrets_by_user.sql");
const QUERY_STATISTICS_BY_RESUME_SQL: &str = include_str!("sql/statistics_by_resume.sql");

/// Legacy timestamps are `timestamp without time zone` holding UTC.
const USER_PAGE: PageQuery<'static> = PageQuery {
    table: "User",
    columns: &[
        "\"id\" AS id",
        "\"name\" AS name",
        "\"username\" AS username",
        "\"email\" AS email",
        "\"picture\" AS picture",
        "\"locale\" AS locale",
        "\"emailVerified\" AS email_verified",
        "\"twoFactorEnabled\" AS two_factor_enabled",
        "\"provider\"::text AS provider",
        "\"createdAt\" AS created_at",
        "\"updatedAt\" AS updated_at",
    ],
    created_column: "createdAt",
    id_column: "id",
};

const RESUME_PAGE: PageQuery<'static> = PageQuery {
    table: "Resume",
    columns: &[
        "\"id\" AS id",
        "\"title\" AS title",
        "\"slug\" AS slug",
        "\"data\" AS data",
        "\"visibility\"::text AS visibility",
        "\"locked\" AS locked",
        "\"userId\" AS user_id",
        "\"createdAt\" AS created_at",
        "\"updatedAt\" AS updated_at",
    ],
    created_column: "createdAt",
    id_column: "id",
};

/// Read side of the legacy database.
#[derive(Clone)]
pub struct PgSource {
    client: Arc<Client>,
}

impl PgSource {
    pub async fn connect(url: &str, retry: &RetryPolicy) -> Result<Self, ConnectorError> {
        let client = connect_with_retry("source", url, retry).await?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub async fn ping(&self) -> Result<(), ConnectorError> {
        ping(&self.client).await
    }

    async fn page(
        &self,
        query: &PageQuery<'_>,
        cursor: Option<&Cursor>,
        limit: usize,
    ) -> Result<Vec<Row>, ConnectorError> {
        let limit = limit as i64;
        let rows = match cursor {
            None => self.client.query(&query.first(), &[&limit]).await?,
            Some(cursor) => {
                let timestamp = cursor.timestamp.naive_utc();
                self.client
                    .query(&query.after(), &[&limit, &timestamp, &cursor.id])
                    .await?
            }
        };
        debug!(table = query.table, rows = rows.len(), "Fetched page");
        Ok(rows)
    }

    async fn secrets_for(
        &self,
        user_ids: &[&str],
    ) -> Result<HashMap<String, LegacySecrets>, ConnectorError> {
        let rows = self
            .client
            .query(QUERY_SECRETS_BY_USER_SQL, &[&user_ids])
            .await?;

        rows.iter()
            .map(|row| {
                let secrets = LegacySecrets {
                    password: get(row, "password")?,
                    last_signed_in: get::<Option<NaiveDateTime>>(row, "last_signed_in")?
                        .map(|t| t.and_utc()),
                    two_factor_secret: get(row, "two_factor_secret")?,
                    two_factor_backup_codes: get::<Option<Vec<String>>>(
                        row,
                        "two_factor_backup_codes",
                    )?
                    .unwrap_or_default(),
                };
                Ok((get(row, "user_id")?, secrets))
            })
            .collect()
    }

    async fn statistics_for(
        &self,
        resume_ids: &[&str],
    ) -> Result<HashMap<String, LegacyStatistics>, ConnectorError> {
        let rows = self
            .client
            .query(QUERY_STATISTICS_BY_RESUME_SQL, &[&resume_ids])
            .await?;

        rows.iter()
            .map(|row| {
                let statistics = LegacyStatistics {
                    views: get(row, "views")?,
                    downloads: get(row, "downloads")?,
                };
                Ok((get(row, "resume_id")?, statistics))
            })
            .collect()
    }
}

#[async_trait]
impl SourceStore<LegacyUser> for PgSource {
    async fn fetch_page(
        &self,
        cursor: Option<&Cursor>,
        limit: usize,
    ) -> Result<Vec<LegacyUser>, StoreError> {
        let rows = self.page(&USER_PAGE, cursor, limit).await?;
        let mut users = rows
            .iter()
            .map(decode_user)
            .collect::<Result<Vec<_>, _>>()?;
        if users.is_empty() {
            return Ok(users);
        }

        let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
        let mut secrets = self.secrets_for(&ids).await?;
        for user in &mut users {
            user.secrets = secrets.remove(&user.id);
        }
        Ok(users)
    }
}

#[async_trait]
impl SourceStore<LegacyResume> for PgSource {
    async fn fetch_page(
        &self,
        cursor: Option<&Cursor>,
        limit: usize,
    ) -> Result<Vec<LegacyResume>, StoreError> {
        let rows = self.page(&RESUME_PAGE, cursor, limit).await?;
        let mut resumes = rows
            .iter()
            .map(decode_resume)
            .collect::<Result<Vec<_>, _>>()?;
        if resumes.is_empty() {
            return Ok(resumes);
        }

        let ids: Vec<&str> = resumes.iter().map(|r| r.id.as_str()).collect();
        let statistics = self.statistics_for(&ids).await?;
        for resume in &mut resumes {
            resume.statistics = statistics.get(&resume.id).copied();
        }
        Ok(resumes)
    }
}

fn get<'a, T: FromSql<'a>>(row: &'a Row, column: &'static str) -> Result<T, ConnectorError> {
    row.try_get(column)
        .map_err(|e| ConnectorError::Decode {
            column,
            reason: e.to_string(),
        })
}

fn utc(naive: NaiveDateTime) -> DateTime<Utc> {
    naive.and_utc()
}

fn decode_user(row: &Row) -> Result<LegacyUser, ConnectorError> {
    Ok(LegacyUser {
        id: get(row, "id")?,
        name: get(row, "name")?,
        username: get(row, "username")?,
        email: get(row, "email")?,
        picture: get(row, "picture")?,
        locale: get(row, "locale")?,
        email_verified: get(row, "email_verified")?,
        two_factor_enabled: get(row, "two_factor_enabled")?,
        provider: get(row, "provider")?,
        created_at: utc(get(row, "created_at")?),
        updated_at: get::<Option<NaiveDateTime>>(row, "updated_at")?.map(utc),
        secrets: None,
    })
}

fn decode_resume(row: &Row) -> Result<LegacyResume, ConnectorError> {
    Ok(LegacyResume {
        id: get(row, "id")?,
        title: get(row, "title")?,
        slug: get(row, "slug")?,
        data: get(row, "data")?,
        visibility: get(row, "visibility")?,
        locked: get(row, "locked")?,
        user_id: get(row, "user_id")?,
        created_at: utc(get(row, "created_at")?),
        updated_at: get::<Option<NaiveDateTime>>(row, "updated_at")?.map(utc),
        statistics: None,
    })
}
