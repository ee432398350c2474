use thiserror::Error;

/// Which of the three input sources a message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Entities,
    Addresses,
    Programs,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Entities => "entities",
            Self::Addresses => "addresses",
            Self::Programs => "programs",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Required {kind} source '{path}' could not be loaded: {reason}")]
    MissingRequiredSource {
        kind: SourceKind,
        path: String,
        reason: String,
    },

    #[error("Table '{table}' is missing required column '{column}'")]
    SchemaViolation { table: String, column: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    pub fn schema(table: &str, column: &str) -> Self {
        Self::SchemaViolation {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    /// An owned copy for reporting the same failure on a derived view.
    /// Structured variants are kept; the rest keep their message.
    pub fn reissue(&self) -> Self {
        match self {
            Self::MissingRequiredSource { kind, path, reason } => Self::MissingRequiredSource {
                kind: *kind,
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::SchemaViolation { table, column } => Self::schema(table, column),
            Self::InvalidConfig(msg) => Self::InvalidConfig(msg.clone()),
            other => Self::Other(anyhow::anyhow!(other.to_string())),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
