use std::fmt;

#[derive(Debug, Clone)]
pub enum GeoHeadersError {
    Config(String),
    DatabaseNotFound(String),
    InvalidDatabase(String),
    Lookup(String),
    AddressParse(String),
    Logging(String),
}

impl GeoHeadersError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            GeoHeadersError::Config(_) => "E001",
            GeoHeadersError::DatabaseNotFound(_) => "E002",
            GeoHeadersError::InvalidDatabase(_) => "E003",
            GeoHeadersError::Lookup(_) => "E004",
            GeoHeadersError::AddressParse(_) => "E005",
            GeoHeadersError::Logging(_) => "E006",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            GeoHeadersError::Config(_) => "Configuration Error",
            GeoHeadersError::DatabaseNotFound(_) => "GeoIP Database Not Found",
            GeoHeadersError::InvalidDatabase(_) => "Invalid GeoIP Database",
            GeoHeadersError::Lookup(_) => "GeoIP Lookup Error",
            GeoHeadersError::AddressParse(_) => "Address Parse Error",
            GeoHeadersError::Logging(_) => "Logging Setup Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            GeoHeadersError::Config(msg) => msg,
            GeoHeadersError::DatabaseNotFound(msg) => msg,
            GeoHeadersError::InvalidDatabase(msg) => msg,
            GeoHeadersError::Lookup(msg) => msg,
            GeoHeadersError::AddressParse(msg) => msg,
            GeoHeadersError::Logging(msg) => msg,
        }
    }

    /// Construction-time errors abort startup; everything else degrades per request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GeoHeadersError::Config(_)
                | GeoHeadersError::DatabaseNotFound(_)
                | GeoHeadersError::InvalidDatabase(_)
                | GeoHeadersError::Logging(_)
        )
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for GeoHeadersError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GeoHeadersError {}

// 便捷的构造函数
impl GeoHeadersError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        GeoHeadersError::Config(msg.into())
    }

    pub fn database_not_found<T: Into<String>>(msg: T) -> Self {
        GeoHeadersError::DatabaseNotFound(msg.into())
    }

    pub fn invalid_database<T: Into<String>>(msg: T) -> Self {
        GeoHeadersError::InvalidDatabase(msg.into())
    }

    pub fn lookup<T: Into<String>>(msg: T) -> Self {
        GeoHeadersError::Lookup(msg.into())
    }

    pub fn address_parse<T: Into<String>>(msg: T) -> Self {
        GeoHeadersError::AddressParse(msg.into())
    }

    pub fn logging<T: Into<String>>(msg: T) -> Self {
        GeoHeadersError::Logging(msg.into())
    }
}

impl From<maxminddb::MaxMindDbError> for GeoHeadersError {
    fn from(err: maxminddb::MaxMindDbError) -> Self {
        GeoHeadersError::Lookup(err.to_string())
    }
}

impl From<config::ConfigError> for GeoHeadersError {
    fn from(err: config::ConfigError) -> Self {
        GeoHeadersError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeoHeadersError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            GeoHeadersError::config("a"),
            GeoHeadersError::database_not_found("b"),
            GeoHeadersError::invalid_database("c"),
            GeoHeadersError::lookup("d"),
            GeoHeadersError::address_parse("e"),
            GeoHeadersError::logging("f"),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_format_simple() {
        let err = GeoHeadersError::database_not_found("./missing");
        assert_eq!(err.format_simple(), "GeoIP Database Not Found: ./missing");
        assert_eq!(err.to_string(), err.format_simple());
    }

    #[test]
    fn test_fatality() {
        assert!(GeoHeadersError::invalid_database("x").is_fatal());
        assert!(GeoHeadersError::config("x").is_fatal());
        assert!(!GeoHeadersError::lookup("x").is_fatal());
        assert!(!GeoHeadersError::address_parse("x").is_fatal());
    }
}
