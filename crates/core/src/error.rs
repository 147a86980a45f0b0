#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A remote call failed or returned a non-2xx status.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A required setting (e.g. the budget code length) is unset.
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    /// A label could not be resolved and policy offers no way out.
    #[error("No {kind} matches '{label}'")]
    NoMatch { kind: &'static str, label: String },

    #[error("Internal error: {0}")]
    Internal(String),
}
