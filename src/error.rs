/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the application
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    /// The document-assembly plugin was not registered before this plugin.
    PluginOrder,
    /// Functions with http events that are neither documented, opted out
    /// (`documentation: ~`) nor private. Collected across the whole scan.
    UndocumentedFunctions(Vec<String>),
    /// A required model name did not resolve to any exported type declaration.
    RootTypeNotFound(String),
    /// An operation in the assembled document has an `operationId` that does
    /// not trace back to any declared function.
    UnknownOperation(String),
    ConfigError(String),
    SerializationError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::PluginOrder => write!(
                f,
                "Please configure your plugins list so openapi-typegen is registered AFTER the OpenAPI document assembly plugin"
            ),
            Error::UndocumentedFunctions(names) => write!(
                f,
                "Some functions have http events which are not documented: {}. \
                 Please add a documentation attribute. If you wish to keep a function \
                 undocumented, explicitly set documentation: ~",
                names.join(", ")
            ),
            Error::RootTypeNotFound(name) => write!(f, "No root type \"{}\" found", name),
            Error::UnknownOperation(operation_id) => write!(
                f,
                "Operation \"{}\" does not match any declared function",
                operation_id
            ),
            Error::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML serialization error: {}", err))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigError(format!("invalid typegen config: {}", err))
    }
}
