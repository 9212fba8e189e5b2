use parking_lot::RwLock;
use std::sync::Arc;
use tera::Tera;

use crate::{db::DBService, error::Result, upload::LocalFsUploader};

#[derive(Debug, Clone)]
pub struct AppState {
    pub(crate) templates: Arc<RwLock<Tera>>,
    pub db: DBService,
    pub storage_fs: LocalFsUploader,
}

impl AppState {
    pub async fn new(template_path: &str, db_path: &str, storage_path: &str) -> Result<Self> {
        let tera = Arc::new(RwLock::new(Tera::new(template_path)?));
        let db = DBService::new(db_path).await?;
        let storage_fs = LocalFsUploader::new(storage_path);
        storage_fs.ensure_upload_dir().await?;

        Ok(Self {
            templates: tera,
            db,
            storage_fs,
        })
    }

    pub(crate) fn render(&self, template: &str, ctx: &tera::Context) -> Result<String> {
        Ok(self.templates.read().render(template, ctx)?)
    }
}
