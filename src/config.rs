use crate::application::DEFAULT_MAX_TRANSACTION_ATTEMPTS;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/library";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

/// 設定読み込みのエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 値を解釈できない
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// レコードストアのバックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// PostgreSQL（本番用）
    Postgres,
    /// プロセス内メモリ（開発・テスト用、再起動で消える）
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

/// アプリケーション設定
///
/// 起動時に環境変数から一度だけ読み込まれ、ストアのハンドル構築に使われる。
#[derive(Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    /// 競合時のトランザクション試行回数（1以上）
    pub max_transaction_attempts: u32,
}

// database_url に資格情報が含まれうるため伏せる
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("storage_backend", &self.storage_backend)
            .field("database_url", &"[REDACTED]")
            .field("database_max_connections", &self.database_max_connections)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("max_transaction_attempts", &self.max_transaction_attempts)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::Postgres,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_transaction_attempts: DEFAULT_MAX_TRANSACTION_ATTEMPTS,
        }
    }
}

impl AppConfig {
    /// プロセスの環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 未設定の項目は既定値を使う。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let storage_backend =
            parse_or("STORAGE_BACKEND", &lookup, defaults.storage_backend)?;
        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);
        let database_max_connections = parse_or(
            "DATABASE_MAX_CONNECTIONS",
            &lookup,
            defaults.database_max_connections,
        )?;
        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = parse_or("PORT", &lookup, defaults.port)?;
        let max_transaction_attempts = parse_or(
            "LOAN_MAX_TRANSACTION_ATTEMPTS",
            &lookup,
            defaults.max_transaction_attempts,
        )?;

        if max_transaction_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                name: "LOAN_MAX_TRANSACTION_ATTEMPTS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if database_max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                name: "DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            storage_backend,
            database_url,
            database_max_connections,
            host,
            port,
            max_transaction_attempts,
        })
    }

    /// 待ち受けアドレス（host:port）
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, F>(name: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue {
                name,
                reason: e.to_string(),
                value,
            }),
    }
}
