//! 인증/인가 모듈.
//!
//! JWT 발급/검증, Argon2 비밀번호 해싱, Bearer 토큰 추출기를 제공합니다.

pub mod extractor;
pub mod jwt;
pub mod password;

pub use extractor::AuthUser;
pub use jwt::{create_token, decode_token, Claims, JwtError};
pub use password::{hash_password, validate_password_strength, verify_password, PasswordError};
