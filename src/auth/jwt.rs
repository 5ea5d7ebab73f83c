use crate::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Tokens are issued by the identity service; this side only verifies them.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
pub(crate) fn issue_test_token(
    user_id: u64,
    role: u8,
    employee_id: Option<u64>,
    token_type: crate::models::TokenType,
    secret: &str,
) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let claims = Claims {
        user_id,
        sub: format!("user{user_id}"),
        role,
        exp: chrono::Utc::now().timestamp() as usize + 3600,
        jti: String::new(),
        token_type,
        employee_id,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenType;

    #[test]
    fn valid_token_round_trips_claims() {
        let token = issue_test_token(7, 3, Some(1000), TokenType::Access, "secret");
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.role, 3);
        assert_eq!(claims.employee_id, Some(1000));
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_test_token(7, 3, None, TokenType::Access, "secret");
        assert!(verify_token(&token, "other").is_err());
    }
}
