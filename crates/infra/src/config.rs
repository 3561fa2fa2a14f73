use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_env: String,
    pub port: u16,
    pub log_level: String,
    pub cors_allowed_origin: String,
    pub frontend_url: String,
    pub data_backend: String,
    pub surreal_endpoint: String,
    pub surreal_ns: String,
    pub surreal_db: String,
    pub surreal_user: String,
    pub surreal_pass: String,
    pub jwt_secret: String,
    pub auth_dev_bypass_enabled: bool,
    pub media_upload_url: String,
    pub media_api_key: String,
    pub media_api_secret: String,
    pub media_folder: String,
    pub media_timeout_ms: u64,
    pub mail_enabled: bool,
    pub mail_relay_url: String,
    pub mail_relay_token: String,
    pub mail_from: String,
    pub mail_timeout_ms: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let cfg = config::Config::builder()
            .set_default("app_env", "development")?
            .set_default("port", 3000)?
            .set_default("log_level", "info")?
            .set_default("cors_allowed_origin", "http://localhost:4200")?
            .set_default("frontend_url", "http://localhost:4200")?
            .set_default("data_backend", "memory")?
            .set_default("surreal_endpoint", "ws://127.0.0.1:8000")?
            .set_default("surreal_ns", "patitas")?
            .set_default("surreal_db", "marketplace")?
            .set_default("surreal_user", "root")?
            .set_default("surreal_pass", "root")?
            .set_default("jwt_secret", "dev-secret")?
            .set_default("auth_dev_bypass_enabled", false)?
            .set_default(
                "media_upload_url",
                "https://api.cloudinary.com/v1_1/patitas-dev/image/upload",
            )?
            .set_default("media_api_key", "")?
            .set_default("media_api_secret", "")?
            .set_default("media_folder", "patitas/dogs")?
            .set_default("media_timeout_ms", 10_000)?
            .set_default("mail_enabled", false)?
            .set_default("mail_relay_url", "http://127.0.0.1:2500/send")?
            .set_default("mail_relay_token", "")?
            .set_default("mail_from", "Patitas <no-reply@patitas.pe>")?
            .set_default("mail_timeout_ms", 5_000)?
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        cfg.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn uses_surreal_backend(&self) -> bool {
        self.data_backend.eq_ignore_ascii_case("surreal")
    }
}
