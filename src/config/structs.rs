use serde::{Deserialize, Serialize};

use crate::errors::{GeoHeadersError, Result};

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 环境变量前缀，例如 GEOHEADERS__GEOIP__DEBUG=true
pub const ENV_PREFIX: &str = "GEOHEADERS";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - server: 监听地址、端口、worker 数量
/// - logging: 日志配置
/// - geoip: 数据库路径、排除列表、转发头
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub geoip: GeoIpConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config file > 默认值
    ///
    /// An explicitly given path must exist; the default `config.toml` is
    /// optional.
    pub fn load(path: Option<&str>) -> Result<Self> {
        use config::{Config, Environment, File};

        let (path, required) = match path {
            Some(p) => (p, true),
            None => (DEFAULT_CONFIG_PATH, false),
        };

        let settings = Config::builder()
            .add_source(File::with_name(path).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("geoip.exclude_ips")
                    .with_list_parse_key("geoip.forwarded_headers"),
            )
            .build()?;

        let config = settings.try_deserialize::<StaticConfig>()?;
        Ok(config)
    }

    /// Parse a TOML document directly (no environment overlay).
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| GeoHeadersError::config(format!("Failed to parse config: {}", e)))
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// GeoIP middleware configuration
///
/// Immutable once the middleware is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoIpConfig {
    /// MaxMindDB 文件路径 (GeoLite2-City.mmdb or GeoLite2-Country.mmdb)
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Log skipped exclusion entries and lookup errors
    #[serde(default)]
    pub debug: bool,

    /// IPs or CIDR blocks that are never looked up
    #[serde(default)]
    pub exclude_ips: Vec<String>,

    /// Forwarding headers consulted in order before the peer address
    #[serde(default = "default_forwarded_headers")]
    pub forwarded_headers: Vec<String>,

    /// Instance name used in log output
    #[serde(default = "default_instance_name")]
    pub name: String,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_database_path() -> String {
    "GeoLite2-Country.mmdb".to_string()
}

fn default_forwarded_headers() -> Vec<String> {
    vec!["X-Forwarded-For".to_string()]
}

fn default_instance_name() -> String {
    "geoip".to_string()
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            workers: default_workers(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            debug: false,
            exclude_ips: Vec::new(),
            forwarded_headers: default_forwarded_headers(),
            name: default_instance_name(),
        }
    }
}
