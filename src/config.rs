use serde::{Deserialize, Serialize};
use std::env;

use crate::entities::DiscountType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 为空时允许所有来源
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

/// 推荐券默认模板，创建批次时未指定的字段使用这里的值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    #[serde(default = "default_coupon_code_prefix")]
    pub coupon_code_prefix: String,
    #[serde(default = "default_discount_type")]
    pub default_discount_type: DiscountType,
    #[serde(default = "default_discount_value")]
    pub default_discount_value: i64,
    #[serde(default)]
    pub default_max_discount: Option<i64>,
    #[serde(default = "default_coupon_valid_days")]
    pub default_coupon_valid_days: i32,
    /// 余额清零 CAS 冲突时的最大重试次数
    #[serde(default = "default_debit_max_attempts")]
    pub debit_max_attempts: u32,
}

fn default_coupon_code_prefix() -> String {
    "REF".to_string()
}

fn default_discount_type() -> DiscountType {
    DiscountType::Percentage
}

fn default_discount_value() -> i64 {
    10
}

fn default_coupon_valid_days() -> i32 {
    30
}

fn default_debit_max_attempts() -> u32 {
    5
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            coupon_code_prefix: default_coupon_code_prefix(),
            default_discount_type: default_discount_type(),
            default_discount_value: default_discount_value(),
            default_max_discount: None,
            default_coupon_valid_days: default_coupon_valid_days(),
            debit_max_attempts: default_debit_max_attempts(),
        }
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::from_toml_str(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env_defaults()?,
            Err(e) => {
                return Err(format!("Cannot read config file {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        toml::from_str(config_str).map_err(|e| format!("Failed to parse config file: {e}").into())
    }

    fn from_env_defaults() -> Result<Self, Box<dyn std::error::Error>> {
        fn get_env(name: &str) -> Option<String> {
            env::var(name).ok()
        }
        fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
            env::var(name)
                .ok()
                .and_then(|v| v.parse::<T>().ok())
                .unwrap_or(default)
        }

        // 数据库 URL 在无配置文件时必须提供
        let database_url = get_env("DATABASE_URL")
            .ok_or("DATABASE_URL is not set and no config.toml was found")?;

        Ok(Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 8080u16),
                allowed_origins: Vec::new(),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET")
                    .unwrap_or_else(|| "change-me-in-production".to_string()),
                access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
            },
            rewards: RewardsConfig::default(),
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("CORS_ALLOWED_ORIGINS") {
            self.server.allowed_origins = v
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }

        // Rewards
        if let Ok(v) = env::var("REFERRAL_COUPON_PREFIX") {
            self.rewards.coupon_code_prefix = v;
        }
        if let Ok(v) = env::var("REFERRAL_COUPON_VALUE")
            && let Ok(n) = v.parse()
        {
            self.rewards.default_discount_value = n;
        }
        if let Ok(v) = env::var("REFERRAL_COUPON_VALID_DAYS")
            && let Ok(n) = v.parse()
        {
            self.rewards.default_coupon_valid_days = n;
        }
    }
}
