//! Runtime tags: stable string keys identifying notification types.
//!
//! These must match `notification_types.runtime_tag` seed data. Each
//! registered notification resource declares exactly one of them.

// Chats
pub const NEW_MESSAGE: &str = "new_message";
pub const NEW_CHAT: &str = "new_chat";
pub const NEW_VIDEO_CALL: &str = "new_video_call";
pub const NEW_CHAT_MESSAGE: &str = "new_chat_message";

// Matters
pub const NEW_MATTER: &str = "new_matter";
pub const MATTER_STATUS_UPDATE: &str = "matter_status_update";
pub const NEW_MATTER_SHARED: &str = "new_matter_shared";
pub const NEW_MATTER_REFERRED: &str = "new_matter_referred";
pub const NEW_REFERRAL_DECLINED: &str = "new_referral_declined";
pub const DOCUMENT_UPLOADED_TO_MATTER: &str = "document_uploaded_to_matter";
pub const NEW_BILLING_ITEM: &str = "new_billing_item";
pub const NEW_INVOICE: &str = "new_invoice";
pub const NEW_REFERRAL_ACCEPTED: &str = "new_referral_accepted";
pub const MATTER_STAGE_UPDATE: &str = "matter_stage_update";

// Documents
pub const DOCUMENT_SHARED_BY_ATTORNEY: &str = "document_shared_by_attorney";
pub const DOCUMENT_UPLOADED: &str = "document_uploaded";

// Engagements
pub const NEW_PROPOSAL: &str = "new_proposal";
pub const PROPOSAL_WITHDRAWN: &str = "proposal_withdrawn";
pub const PROPOSAL_ACCEPTED: &str = "proposal_accepted";
pub const POST_DEACTIVATED: &str = "post_deactivated";
pub const POST_REACTIVATED: &str = "post_reactivated";

// Forums
pub const NEW_POST: &str = "new_post";
pub const NEW_ATTORNEY_POST: &str = "new_attorney_post";
pub const NEW_POST_ON_TOPIC: &str = "new_post_on_topic";

// Promotion
pub const NEW_ATTORNEY_EVENT: &str = "new_attorney_event";

// Contacts and users
pub const NEW_OPPORTUNITIES: &str = "new_opportunities";
pub const NEW_REGISTERED_CONTACT_SHARED: &str = "new_registered_contact_shared";
pub const NEW_UNREGISTERED_CONTACT_SHARED: &str = "new_unregistered_contact_shared";
pub const NEW_USER_REGISTERED: &str = "new_user_registered";
