/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`jwt`]: JWT token generation and validation
/// - [`middleware`]: Axum bearer-token middleware
/// - [`authorization`]: Per-task permission engine and role gates
///
/// # Example
///
/// ```
/// use teamtask_shared::auth::jwt::{create_token, validate_access_token, Claims, TokenType};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::new("user-id", TokenType::Access);
/// let token = create_token(&claims, "secret-key-that-is-long-enough!!")?;
/// assert_eq!(validate_access_token(&token, "secret-key-that-is-long-enough!!")?.sub, "user-id");
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod authorization;
