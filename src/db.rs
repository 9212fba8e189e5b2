use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::types::time::OffsetDateTime;
use sqlx::{Executor, Pool, Sqlite};
use std::result::Result as StdResult;

use crate::error::{AppError, DBErrorContext, Result};

#[derive(Debug, Clone)]
pub struct DBService {
    pool: Pool<Sqlite>,
}

#[derive(sqlx::FromRow, serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Newsletter {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub date: String,
    pub image_url: String,
    pub description: String,
}

/// A newsletter that went through validation, every field is non empty.
#[derive(Debug)]
pub struct NewNewsletter<'input> {
    pub title: &'input str,
    pub author: &'input str,
    pub date: &'input str,
    pub image_url: &'input str,
    pub description: &'input str,
}

#[derive(Debug, PartialEq, Eq)]
pub enum NewsletterError {
    /// a newsletter with the same title is already stored
    AlreadyExist,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct ProfileUpload {
    pub id: i64,
    pub username: String,
    pub avatar: String,
    pub created_at: OffsetDateTime,
}

impl DBService {
    pub async fn new(db_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool_res = SqlitePoolOptions::new()
            .max_connections(2)
            .after_connect(|conn, _meta| {
                // Readers never block the single writer in WAL mode, which is
                // all the concurrency this server needs.
                // See https://www.sqlite.org/wal.html
                Box::pin(async move {
                    conn.execute("PRAGMA journal_mode=WAL;").await?;
                    Ok(())
                })
            })
            .connect_with(options)
            .await;
        match pool_res {
            Ok(pool) => Ok(DBService { pool }),
            Err(err) => Err(AppError::DBInitError {
                path: db_path.to_owned(),
                source: err,
            }),
        }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Waits for the checked out connections to come back, then closes the pool.
    /// Any query issued afterward fails.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn list_newsletters(&self) -> Result<Vec<Newsletter>> {
        let newsletters = sqlx::query_as::<_, Newsletter>(
            "SELECT id, title, author, date, image_url, description
            FROM newsletter
            ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .with_context(|| "Cannot list newsletters")?;

        Ok(newsletters)
    }

    pub async fn create_newsletter<'input>(
        &self,
        nn: NewNewsletter<'input>,
    ) -> Result<StdResult<Newsletter, NewsletterError>> {
        tracing::info!("Creating a newsletter: {nn:?}");

        // Autocommit statements only: a deferred transaction upgrading from read
        // to write fails with SQLITE_BUSY when creates overlap. The UNIQUE
        // constraint closes the gap between the check and the insert.
        if let Some(existing) = get_newsletter_by_title(&self.pool, nn.title).await? {
            tracing::info!(
                "Newsletter already exist for {} at id {}",
                existing.title,
                existing.id
            );
            return Ok(Err(NewsletterError::AlreadyExist));
        }

        let inserted = sqlx::query_as::<_, Newsletter>(
            "INSERT INTO newsletter
            (title, author, date, image_url, description, created_at)
            VALUES (?,?,?,?,?,?)
            RETURNING id, title, author, date, image_url, description",
        )
        .bind(nn.title)
        .bind(nn.author)
        .bind(nn.date)
        .bind(nn.image_url)
        .bind(nn.description)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.pool)
        .await;

        let newsletter = match inserted {
            Ok(n) => n,
            // a concurrent writer got the same title in between the check and the insert
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                tracing::info!("Newsletter title {} taken concurrently", nn.title);
                return Ok(Err(NewsletterError::AlreadyExist));
            }
            Err(err) => {
                return Err(AppError::DBError {
                    message: format!("Cannot insert newsletter {}", nn.title),
                    source: err,
                })
            }
        };

        tracing::info!(
            "Newsletter created with title {} and id {}",
            newsletter.title,
            newsletter.id
        );

        Ok(Ok(newsletter))
    }

    /// Stores a new profile and makes it the current one.
    pub async fn create_profile(&self, username: &str, avatar: &str) -> Result<ProfileUpload> {
        let mut tx = self.pool.begin().await?;

        let profile = sqlx::query_as::<_, ProfileUpload>(
            "INSERT INTO profile_upload
            (username, avatar, created_at)
            VALUES (?,?,?)
            RETURNING id, username, avatar, created_at",
        )
        .bind(username)
        .bind(avatar)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("Cannot save profile for {username}"))?;

        sqlx::query(
            "INSERT INTO current_profile (id, profile_id) VALUES (1, ?)
            ON CONFLICT(id) DO UPDATE SET profile_id = excluded.profile_id",
        )
        .bind(profile.id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Cannot point current profile at {}", profile.id))?;

        tx.commit().await?;

        tracing::info!("Profile saved with id {} for {}", profile.id, profile.username);
        Ok(profile)
    }

    pub async fn get_current_profile(&self) -> Result<Option<ProfileUpload>> {
        let profile = sqlx::query_as::<_, ProfileUpload>(
            "SELECT p.id, p.username, p.avatar, p.created_at
            FROM current_profile AS c
            JOIN profile_upload AS p ON p.id = c.profile_id
            WHERE c.id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .with_context(|| "Cannot fetch current profile")?;

        Ok(profile)
    }
}

async fn get_newsletter_by_title<'t, E>(executor: E, title: &str) -> Result<Option<Newsletter>>
where
    E: sqlx::SqliteExecutor<'t>,
{
    let newsletter = sqlx::query_as::<_, Newsletter>(
        "SELECT id, title, author, date, image_url, description
        FROM newsletter WHERE title=?
        LIMIT 1",
    )
    .bind(title)
    .fetch_optional(executor)
    .await?;

    Ok(newsletter)
}
