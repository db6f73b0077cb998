use shared::{domain::AddressId, error::ApiError};

pub const MAX_NAME_CHARS: usize = 255;
pub const MAX_EMAIL_CHARS: usize = 255;
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Trimmed name and email of a client aggregate write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFields {
    pub name: String,
    pub email: String,
}

pub fn client_fields(name: &str, email: &str, address_id: AddressId) -> Result<ClientFields, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ApiError::validation(format!(
            "name must be at most {MAX_NAME_CHARS} characters"
        )));
    }

    let email = email.trim();
    if email.chars().count() > MAX_EMAIL_CHARS || !looks_like_email(email) {
        return Err(ApiError::validation("email must be a valid address"));
    }

    if address_id.0 <= 0 {
        return Err(ApiError::validation("address_id must be positive"));
    }

    Ok(ClientFields {
        name: name.to_string(),
        email: email.to_string(),
    })
}

pub fn password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::validation(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn trims_accepted_fields() {
        let fields = client_fields("  Ana Lima ", " ana@example.com ", AddressId(1)).expect("valid");
        assert_eq!(fields.name, "Ana Lima");
        assert_eq!(fields.email, "ana@example.com");
    }

    #[test]
    fn rejects_blank_name() {
        let err = client_fields("   ", "ana@example.com", AddressId(1)).expect_err("blank");
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["", "ana", "@example.com", "ana@", "ana@@example.com", "a na@example.com"] {
            assert!(
                client_fields("Ana", email, AddressId(1)).is_err(),
                "accepted {email:?}"
            );
        }
    }

    #[test]
    fn rejects_non_positive_address() {
        assert!(client_fields("Ana", "ana@example.com", AddressId(0)).is_err());
    }

    #[test]
    fn enforces_minimum_password_length() {
        assert!(password("short").is_err());
        assert!(password("long enough").is_ok());
    }
}
