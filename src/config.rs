use anyhow::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (MinIO, localstack). `None` means AWS proper.
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Base used to build public object URLs; derived from bucket/region when unset.
    pub public_url: Option<String>,
}

impl S3Config {
    pub fn public_base_url(&self) -> String {
        if let Some(base) = &self.public_url {
            return base.trim_end_matches('/').to_string();
        }
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub service_id: String,
    pub admin_template_id: String,
    pub user_template_id: String,
    pub public_key: String,
    pub private_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub cors_origins: Vec<String>,
    pub s3: S3Config,
    pub mail: Option<MailConfig>,
    /// Lets `register` honour a requested `admin` role. Off unless bootstrapping.
    pub allow_admin_signup: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: env_or("JWT_ISSUER", "storefront-api"),
            audience: env_or("JWT_AUDIENCE", "storefront-users"),
            ttl_days: std::env::var("JWT_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
        };

        let s3 = S3Config {
            bucket: std::env::var("S3_BUCKET").context("S3_BUCKET is not set")?,
            region: env_or("S3_REGION", "us-east-1"),
            endpoint: env_opt("S3_ENDPOINT"),
            access_key: env_opt("S3_ACCESS_KEY"),
            secret_key: env_opt("S3_SECRET_KEY"),
            public_url: env_opt("S3_PUBLIC_URL"),
        };

        let mail = match (
            env_opt("EMAILJS_SERVICE_ID"),
            env_opt("EMAILJS_ADMIN_TEMPLATE_ID"),
            env_opt("EMAILJS_USER_TEMPLATE_ID"),
            env_opt("EMAILJS_PUBLIC_KEY"),
        ) {
            (Some(service_id), Some(admin_template_id), Some(user_template_id), Some(public_key)) => {
                Some(MailConfig {
                    api_url: env_or(
                        "EMAILJS_API_URL",
                        "https://api.emailjs.com/api/v1.0/email/send",
                    ),
                    service_id,
                    admin_template_id,
                    user_template_id,
                    public_key,
                    private_key: env_opt("EMAILJS_PRIVATE_KEY"),
                })
            }
            _ => None,
        };

        let cors_origins = match env_opt("CORS_ORIGINS") {
            Some(list) => parse_origins(&list),
            None => vec![
                env_or("FRONTEND_URL", "http://localhost:5173"),
                "http://localhost:5174".to_string(),
            ],
        };

        Ok(Self {
            environment: Environment::parse(&env_or("APP_ENV", "development")),
            host: env_or("APP_HOST", "0.0.0.0"),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            database_url,
            jwt,
            cors_origins,
            s3,
            mail,
            allow_admin_signup: std::env::var("ALLOW_ADMIN_SIGNUP")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_defaults_to_development() {
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse(" PROD "), Environment::Production);
        assert_eq!(Environment::parse("staging"), Environment::Development);
        assert_eq!(Environment::parse(""), Environment::Development);
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let origins = parse_origins("http://a.test/, http://b.test ,,");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn public_base_url_variants() {
        let mut s3 = S3Config {
            bucket: "pics".into(),
            region: "eu-west-1".into(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            public_url: None,
        };
        assert_eq!(s3.public_base_url(), "https://pics.s3.eu-west-1.amazonaws.com");

        s3.endpoint = Some("http://localhost:9000/".into());
        assert_eq!(s3.public_base_url(), "http://localhost:9000/pics");

        s3.public_url = Some("https://cdn.example.com/".into());
        assert_eq!(s3.public_base_url(), "https://cdn.example.com");
    }
}
