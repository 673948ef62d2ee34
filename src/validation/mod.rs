use std::fmt;

/// Backend identifiers are Mongo-style object ids: 24 hexadecimal characters.
pub const PRODUCT_ID_LEN: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Whether `id` can be used to mutate a cart line. Lines whose product id fails
/// this check are display-only.
pub fn is_well_formed_product_id(id: &str) -> bool {
    id.len() == PRODUCT_ID_LEN && id.chars().all(|ch| ch.is_ascii_hexdigit())
}

pub fn validate_present(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

/// Accepts what a UI numeric field yields and rejects negatives without
/// touching any state. The confirmed range fits comfortably in a `u32`.
pub fn validate_quantity(quantity: i64) -> Result<u32, ValidationError> {
    if quantity < 0 {
        return Err(ValidationError::new("quantity", "must not be negative"));
    }

    u32::try_from(quantity)
        .map_err(|_| ValidationError::new("quantity", "is too large"))
}
