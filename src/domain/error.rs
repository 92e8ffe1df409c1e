use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("feed record {index} is missing `{field}`")]
    MissingIdentifier { index: usize, field: &'static str },
}

impl DomainError {
    pub fn missing_identifier(index: usize, field: &'static str) -> Self {
        Self::MissingIdentifier { index, field }
    }
}
