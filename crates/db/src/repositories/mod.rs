//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Writes that must join a
//! caller's transaction take `&mut PgConnection` instead.

pub mod notification_dispatch_repo;
pub mod notification_outbox_repo;
pub mod notification_repo;
pub mod notification_setting_repo;
pub mod notification_target_repo;
pub mod notification_type_repo;
pub mod push_device_repo;
pub mod user_repo;

pub use notification_dispatch_repo::NotificationDispatchRepo;
pub use notification_outbox_repo::NotificationOutboxRepo;
pub use notification_repo::NotificationRepo;
pub use notification_setting_repo::NotificationSettingRepo;
pub use notification_target_repo::NotificationTargetRepo;
pub use notification_type_repo::NotificationTypeRepo;
pub use push_device_repo::PushDeviceRepo;
pub use user_repo::UserRepo;
