use std::sync::Arc;

use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::{
    config::AppConfig,
    db,
    inquiry::mailer::{EmailJsMailer, Mailer},
    products::repo::{PgProductStore, ProductStore},
    storage::{Storage, StorageClient},
    users::repo::{PgUserStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub storage: Arc<dyn StorageClient>,
    pub mailer: Option<Arc<dyn Mailer>>,
}

impl AppState {
    /// Wires the production collaborators. A failed first database
    /// connection is fatal in production; elsewhere the server starts on a
    /// lazy pool and keeps logging.
    pub async fn init(config: AppConfig) -> anyhow::Result<(Self, PgPool)> {
        let config = Arc::new(config);

        let db = match db::connect(&config.database_url).await {
            Ok(pool) => {
                info!("database connected");
                pool
            }
            Err(e) if config.environment.is_production() => return Err(e),
            Err(e) => {
                error!(error = %e, "database connection failed; continuing with a lazy pool");
                db::connect_lazy(&config.database_url)?
            }
        };

        let storage = Arc::new(Storage::new(&config.s3).await?) as Arc<dyn StorageClient>;

        let mailer = match config.mail.clone() {
            Some(mail) => Some(Arc::new(EmailJsMailer::new(mail)?) as Arc<dyn Mailer>),
            None => {
                warn!("EMAILJS_* not set; /api/inquiry will answer 503");
                None
            }
        };

        let state = Self::from_parts(
            config,
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(PgProductStore::new(db.clone())),
            storage,
            mailer,
        );
        Ok((state, db))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        products: Arc<dyn ProductStore>,
        storage: Arc<dyn StorageClient>,
        mailer: Option<Arc<dyn Mailer>>,
    ) -> Self {
        Self {
            config,
            users,
            products,
            storage,
            mailer,
        }
    }
}
