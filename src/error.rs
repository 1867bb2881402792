use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenexprError {
    #[error("Invalid root: {0}")]
    InvalidRoot(String),

    #[error("No usable variables: at least one bounded or comparable variable is required")]
    NoUsableVariables,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No expression eligible for value mutation")]
    CantMutate,

    #[error("Invalid tree shape: {0}")]
    InvalidTreeShape(String),

    #[error("Variable {0} has no bounds")]
    MissingBounds(String),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GenexprError>;
