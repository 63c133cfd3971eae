use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Config file not found. Looked in:\n\
        - CLOUDWEAVE_CONFIG_PATH\n\
        - ./cloudweave.yaml\n\
        - ./.cloudweave/config.yaml\n\
        - ~/.config/cloudweave/config.yaml"
    )]
    ConfigFileNotFound,

    #[error("Connection '{0}' is not defined in the config file")]
    ConnectionNotFound(String),

    #[error("Credential '{key}' references ${{{var}}}, which is not set")]
    MissingEnvVar { key: String, var: String },

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
