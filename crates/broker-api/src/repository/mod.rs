//! 데이터베이스 Repository 모듈.
//!
//! Repository는 유닛 구조체의 정적 메서드로 `&PgPool` 위에서
//! 동작합니다.

pub mod credentials;
pub mod snapshots;
pub mod users;

pub use credentials::{CredentialRepository, CredentialRow};
pub use snapshots::{SnapshotRepository, SnapshotRow};
pub use users::{User, UserRepository};
