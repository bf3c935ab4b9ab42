//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod chat_repo;
pub mod community_repo;
pub mod job_fair_repo;
pub mod notification_repo;
pub mod user_repo;

pub use chat_repo::ChatRepo;
pub use community_repo::CommunityRepo;
pub use job_fair_repo::JobFairRepo;
pub use notification_repo::NotificationRepo;
pub use user_repo::UserRepo;
