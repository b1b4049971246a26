use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Missing fields deserialize as empty strings and are reported by validation.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
#[serde(default)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, max = 100, message = "Enter your name (at most 100 characters)"))]
    pub name: String,
    #[validate(
        email(message = "Enter a valid email address"),
        length(max = 254, message = "Email is too long")
    )]
    pub email: String,
    #[validate(length(min = 1, max = 20, message = "Enter a phone number (at most 20 characters)"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Enter a shipping address"))]
    pub address: String,
}

impl CheckoutRequest {
    /// Trim surrounding whitespace before validation so blank fields are caught.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, phone: &str, address: &str) -> CheckoutRequest {
        CheckoutRequest {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            address: address.into(),
        }
        .normalized()
    }

    #[test]
    fn complete_form_is_valid() {
        assert!(request("Ann", "ann@example.com", "555-0100", "1 Main St").validate().is_ok());
    }

    #[test]
    fn blank_and_malformed_fields_are_reported() {
        let errors = request("  ", "not-an-email", "", "   ").validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("address"));
    }

    #[test]
    fn missing_fields_fail_validation_by_name() {
        let form: CheckoutRequest = serde_json::from_str(r#"{"name":"Ann"}"#).unwrap();
        let errors = form.normalized().validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(!fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("address"));
    }

    #[test]
    fn long_phone_is_rejected() {
        let errors = request("Ann", "ann@example.com", &"9".repeat(21), "1 Main St")
            .validate()
            .unwrap_err();
        assert!(errors.field_errors().contains_key("phone"));
    }
}
