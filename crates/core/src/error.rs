use thiserror::Error;

/// Errors raised while turning request input into a record
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// Input violates a schema constraint (required field, closed enum, ...)
    #[error("{0}")]
    Validation(String),

    /// A value could not be coerced to the field's type (dates, numbers, ...)
    #[error("{0}")]
    TypeCoercion(String),

    /// An identity token is not a valid resource id
    #[error("{0}")]
    MalformedId(String),
}
