//! In-memory collaborators for handler and service tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    app::build_app,
    auth::{jwt::JwtKeys, password::hash_password},
    config::{AppConfig, Environment, JwtConfig, MailConfig, S3Config},
    error::{AppError, AppResult},
    inquiry::mailer::{Mailer, OutboundMail},
    pagination::{Page, PageRequest},
    products::{
        repo::ProductStore,
        repo_types::{Category, NewProduct, Product, ProductChanges},
    },
    state::AppState,
    storage::{object_key, StorageClient, StoredObject, UploadedFile},
    users::{
        repo::{UserStore, DUPLICATE_EMAIL_MESSAGE},
        repo_types::{NewUser, Role, User, UserChanges},
    },
};

pub const TEST_PASSWORD: &str = "password123";

pub fn test_config() -> AppConfig {
    AppConfig {
        environment: Environment::Development,
        host: "127.0.0.1".into(),
        port: 0,
        database_url: "postgres://unused".into(),
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "storefront-api".into(),
            audience: "storefront-users".into(),
            ttl_days: 7,
        },
        cors_origins: vec!["http://localhost:5173".into()],
        s3: S3Config {
            bucket: "test".into(),
            region: "us-east-1".into(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            public_url: Some("https://fake.local".into()),
        },
        mail: None,
        allow_admin_signup: false,
    }
}

fn page_of<T: Clone>(items: &[T], page: PageRequest) -> Page<T> {
    let items_newest_first: Vec<T> = items.iter().rev().cloned().collect();
    Page {
        total: items.len() as i64,
        items: items_newest_first
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect(),
    }
}

/// Insertion-ordered; `list` walks it backwards for newest-first.
#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, u: NewUser) -> AppResult<User> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|x| x.email == u.email) {
            return Err(AppError::DuplicateEmail(DUPLICATE_EMAIL_MESSAGE.into()));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: u.email,
            password_hash: u.password_hash,
            first_name: u.first_name,
            last_name: u.last_name,
            phone: u.phone,
            age: u.age,
            gender: u.gender,
            birth_date: u.birth_date,
            role: u.role,
            profile_picture: None,
            profile_picture_key: None,
            created_at: now,
            updated_at: now,
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, c: UserChanges) -> AppResult<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(email) = c.email.as_deref() {
            if rows.iter().any(|x| x.id != id && x.email == email) {
                return Err(AppError::DuplicateEmail(DUPLICATE_EMAIL_MESSAGE.into()));
            }
        }
        let Some(user) = rows.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(v) = c.email {
            user.email = v;
        }
        if let Some(v) = c.password_hash {
            user.password_hash = v;
        }
        if let Some(v) = c.first_name {
            user.first_name = v;
        }
        if let Some(v) = c.last_name {
            user.last_name = v;
        }
        if let Some(v) = c.phone {
            user.phone = v;
        }
        if let Some(v) = c.age {
            user.age = v;
        }
        if let Some(v) = c.gender {
            user.gender = v;
        }
        if let Some(v) = c.birth_date {
            user.birth_date = v;
        }
        if let Some(v) = c.role {
            user.role = v;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn set_profile_picture(
        &self,
        id: Uuid,
        picture: Option<StoredObject>,
    ) -> AppResult<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(user) = rows.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        let (url, key) = match picture {
            Some(p) => (Some(p.url), Some(p.key)),
            None => (None, None),
        };
        user.profile_picture = url;
        user.profile_picture_key = key;
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .position(|u| u.id == id)
            .map(|i| rows.remove(i)))
    }

    async fn list(&self, page: PageRequest) -> AppResult<Page<User>> {
        Ok(page_of(&self.rows.lock().unwrap(), page))
    }
}

#[derive(Default)]
pub struct MemoryProductStore {
    rows: Mutex<Vec<Product>>,
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.rows.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, p: NewProduct, image: Option<StoredObject>) -> AppResult<Product> {
        let now = OffsetDateTime::now_utc();
        let (image_url, image_key) = match image {
            Some(o) => (Some(o.url), Some(o.key)),
            None => (None, None),
        };
        let product = Product {
            id: Uuid::new_v4(),
            name: p.name,
            description: p.description,
            price: p.price,
            category: p.category,
            brand: p.brand,
            stock: p.stock,
            image_url,
            image_key,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        id: Uuid,
        c: ProductChanges,
        image: Option<StoredObject>,
    ) -> AppResult<Option<Product>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(p) = rows.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(v) = c.name {
            p.name = v;
        }
        if let Some(v) = c.description {
            p.description = v;
        }
        if let Some(v) = c.price {
            p.price = v;
        }
        if let Some(v) = c.category {
            p.category = v;
        }
        if let Some(v) = c.brand {
            p.brand = v;
        }
        if let Some(v) = c.stock {
            p.stock = v;
        }
        if let Some(o) = image {
            p.image_url = Some(o.url);
            p.image_key = Some(o.key);
        }
        p.updated_at = OffsetDateTime::now_utc();
        Ok(Some(p.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<Option<Product>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .position(|p| p.id == id)
            .map(|i| rows.remove(i)))
    }

    async fn list(&self, page: PageRequest) -> AppResult<Page<Product>> {
        Ok(page_of(&self.rows.lock().unwrap(), page))
    }
}

/// Records every call in order. Puts and deletes can be made to fail
/// independently; a failed call is still logged as attempted.
#[derive(Default)]
pub struct RecordingStorage {
    calls: Mutex<Vec<StorageCall>>,
    puts: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    fail_put: Mutex<bool>,
    fail_delete: Mutex<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    Put(String),
    Delete(String),
}

impl RecordingStorage {
    /// Keys that were stored successfully.
    pub fn put_keys(&self) -> Vec<String> {
        self.puts.lock().unwrap().clone()
    }

    /// Keys that were removed successfully.
    pub fn deleted_keys(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    /// Every attempted call, failed ones included. `Put` carries the folder.
    pub fn calls(&self) -> Vec<StorageCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.set_put_failing(fail);
        self.set_delete_failing(fail);
    }

    pub fn set_put_failing(&self, fail: bool) {
        *self.fail_put.lock().unwrap() = fail;
    }

    pub fn set_delete_failing(&self, fail: bool) {
        *self.fail_delete.lock().unwrap() = fail;
    }
}

#[async_trait]
impl StorageClient for RecordingStorage {
    async fn put_object(&self, folder: &str, file: UploadedFile) -> anyhow::Result<StoredObject> {
        self.calls
            .lock()
            .unwrap()
            .push(StorageCall::Put(folder.to_string()));
        if *self.fail_put.lock().unwrap() {
            anyhow::bail!("storage unavailable");
        }
        let key = object_key(folder, &file, OffsetDateTime::now_utc());
        self.puts.lock().unwrap().push(key.clone());
        Ok(StoredObject {
            url: format!("https://fake.local/{key}"),
            key,
        })
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(StorageCall::Delete(key.to_string()));
        if *self.fail_delete.lock().unwrap() {
            anyhow::bail!("storage unavailable");
        }
        self.deletes.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutboundMail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutboundMail) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

pub fn test_mail_config() -> MailConfig {
    MailConfig {
        api_url: "http://127.0.0.1:9/api/v1.0/email/send".into(),
        service_id: "svc".into(),
        admin_template_id: "tpl_admin".into(),
        user_template_id: "tpl_user".into(),
        public_key: "pub".into(),
        private_key: None,
    }
}

/// A fully wired state over in-memory collaborators, plus handles to inspect them.
pub struct TestContext {
    pub state: AppState,
    pub storage: Arc<RecordingStorage>,
    pub mailer: Arc<RecordingMailer>,
    password_hash: String,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with(test_config(), false)
    }

    pub fn with_mailer() -> Self {
        let mut config = test_config();
        config.mail = Some(test_mail_config());
        Self::with(config, true)
    }

    fn with(config: AppConfig, mailer_enabled: bool) -> Self {
        let storage = Arc::new(RecordingStorage::default());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::from_parts(
            Arc::new(config),
            Arc::new(MemoryUserStore::default()),
            Arc::new(MemoryProductStore::default()),
            storage.clone(),
            mailer_enabled.then(|| mailer.clone() as Arc<dyn Mailer>),
        );
        Self {
            state,
            storage,
            mailer,
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
        }
    }

    pub fn app(&self) -> Router {
        build_app(self.state.clone())
    }

    /// Inserts a user whose password is [`TEST_PASSWORD`].
    pub async fn seed_user(&self, email: &str, role: Role) -> User {
        self.state
            .users
            .create(NewUser {
                email: email.to_string(),
                password_hash: self.password_hash.clone(),
                first_name: "Test".into(),
                last_name: "User".into(),
                phone: None,
                age: None,
                gender: None,
                birth_date: None,
                role,
            })
            .await
            .unwrap()
    }

    pub async fn seed_product(&self, name: &str, image: Option<StoredObject>) -> Product {
        self.state
            .products
            .create(
                NewProduct {
                    name: name.to_string(),
                    description: "A thing worth buying".into(),
                    price: 9.5,
                    category: Category::Books,
                    brand: None,
                    stock: 3,
                },
                image,
            )
            .await
            .unwrap()
    }

    pub fn token_for(&self, user: &User) -> String {
        JwtKeys::new(&self.state.config.jwt).issue(user).unwrap()
    }
}

pub async fn body_json(res: axum::response::Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    (status, body_json(res).await)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    req.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    req.body(Body::empty()).unwrap()
}

pub const BOUNDARY: &str = "----storefront-test-boundary";

/// Hand-built `multipart/form-data` body.
pub fn multipart_request(
    method: &str,
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &str, &[u8])>,
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((field, file_name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}
