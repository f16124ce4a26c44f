//! 자산 대시보드 공통 프리미티브.
//!
//! 전체 워크스페이스에서 공유하는 기능을 제공합니다:
//! - 에러 타입 (`error`)
//! - 자격증명 암호화/복호화 (`crypto`)
//! - 민감 값 마스킹 (`mask`)
//! - tracing 기반 로깅 부트스트랩 (`logging`)

pub mod crypto;
pub mod error;
pub mod logging;
pub mod mask;

pub use crypto::{generate_master_key, CredentialEncryptor, CryptoError};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_from_env, LogConfig, LogFormat};
pub use mask::mask_value;
