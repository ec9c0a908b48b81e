use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("block registry: {0}")]
    Registry(String),

    #[error("{0} buffer(s) still alive after teardown")]
    Leaked(usize),

    #[error("logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}
