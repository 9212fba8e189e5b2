use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, Multipart};
use futures::TryStreamExt;
use rand::Rng;
use time::OffsetDateTime;
use tokio::fs::{self, OpenOptions};
use tokio_util::compat::TokioAsyncWriteCompatExt;

use crate::error::{AppError, Result, UploadErrorContext};

/// Directory, relative to the storage root, holding every uploaded file.
/// It is also the url prefix the files are served under.
pub const UPLOAD_DIR: &str = "uploads";

/// Persists uploaded files on the local file system, under
/// `<base_path>/uploads/`.
#[derive(Debug, Clone)]
pub struct LocalFsUploader {
    base_path: PathBuf,
}

/// A file written to disk by the receiver.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub field_name: String,
    pub original_name: Option<String>,
    pub mime_type: Option<String>,
    /// relative to the storage root, with `/` separators, eg: `uploads/avatar-1700000000000-42`
    pub path: String,
    pub size_b: u64,
}

/// Outcome of reading a multipart body: the file received under the expected
/// field, if any, and all the plain text fields.
#[derive(Debug, Default)]
pub struct ReceivedForm {
    pub file: Option<StoredFile>,
    pub fields: HashMap<String, String>,
}

impl ReceivedForm {
    /// A text field, `None` when absent or empty.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

impl LocalFsUploader {
    pub fn new<P>(base_path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.base_path.join(UPLOAD_DIR)
    }

    pub async fn ensure_upload_dir(&self) -> Result<()> {
        let dir = self.upload_dir();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Cannot create upload directory {dir:?}"))
    }

    /// Reads the whole multipart body. At most one file is accepted, under
    /// `file_field`, and it is written to disk as soon as it's encountered.
    pub async fn receive(&self, mut multipart: Multipart, file_field: &str) -> Result<ReceivedForm> {
        let mut form = ReceivedForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if field.file_name().is_none() {
                let value = field.text().await?;
                form.fields.insert(name, value);
                continue;
            }

            if name != file_field || form.file.is_some() {
                tracing::info!("Rejecting file under field {name:?}, expected {file_field:?}");
                return Err(AppError::UnexpectedField(name));
            }

            form.file = Some(self.save_field(field).await?);
        }

        Ok(form)
    }

    async fn save_field(&self, field: Field<'_>) -> Result<StoredFile> {
        let field_name = field.name().unwrap_or_default().to_string();
        let original_name = field.file_name().map(ToOwned::to_owned);
        let mime_type = field.content_type().map(ToOwned::to_owned);
        tracing::info!(
            "got a new file under {:?} of type {:?} named {:?}",
            field_name,
            mime_type,
            original_name,
        );

        self.ensure_upload_dir().await?;
        let file_name = unique_file_name(&field_name);
        let disk_path = self.upload_dir().join(&file_name);

        let file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&disk_path)
            .await
            .with_context(|| format!("Cannot save file to {:?}", &disk_path))?;
        let mut writer = file.compat_write();

        let reader =
            field.map_err(|err| std::io::Error::new(ErrorKind::Other, format!("{err:?}")));
        let size_b = futures::io::copy_buf(reader.into_async_read(), &mut writer)
            .await
            .with_context(|| format!("Cannot write upload to {:?}", &disk_path))?;

        writer
            .into_inner()
            .sync_all()
            .await
            .with_context(|| format!("Cannot sync all to {:?}", &disk_path))?;

        tracing::info!("stored {}Kib at {:?}", size_b / 1024, &disk_path);

        Ok(StoredFile {
            field_name,
            original_name,
            mime_type,
            path: format!("{UPLOAD_DIR}/{file_name}"),
            size_b,
        })
    }
}

/// `<field>-<unix millis>-<random int>`, unique enough for a single directory
/// without any coordination between requests.
pub(crate) fn unique_file_name(field_name: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{field_name}-{millis}-{suffix}")
}
