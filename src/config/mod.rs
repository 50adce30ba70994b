pub use self::parser::{Config, DatabaseConfig, DbType, LoggingConfig, ServerConfig};
pub use self::validator::ConfigError;

mod parser;
mod validator;
