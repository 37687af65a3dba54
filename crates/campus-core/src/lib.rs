//! Core types and utilities for the campus platform.
//!
//! This crate provides the foundational types used throughout campus:
//!
//! - **Identifiers**: `TenantId`, `UserId`, `SubscriptionId`, content ids
//! - **Tenancy**: `Tenant`, slug validation, branding
//! - **Billing**: `BillingTier`, `TenantSubscription`, `UserSubscription`
//! - **Proration**: `prorate`, `remaining_days_in_period`
//! - **Configuration**: `BillingConfiguration` tier catalog
//! - **Content**: `Curriculum`, `Chapter`, `Lesson`, `LessonModule`
//! - **Annotations**: `Progress`, `Note`, `Highlight`, `Bookmark`
//!
//! # Money
//!
//! All persisted monetary amounts are integer minor units (cents), stored
//! as `i64` to avoid floating point drift. Proration intermediates use
//! major-unit daily rates; only the final charge/credit is in cents.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod content;
pub mod error;
pub mod ids;
pub mod progress;
pub mod proration;
pub mod subscription;
pub mod tenant;
pub mod tier;

pub use config::{BillingConfiguration, TierDefinition};
pub use content::{
    AssessmentQuestion, Chapter, Curriculum, Lesson, LessonModule, ModuleBody, ResourceLink,
};
pub use error::{DomainError, FieldError, Result};
pub use ids::{
    ChapterId, CurriculumId, HighlightId, IdError, LessonId, LessonModuleId, SubscriptionId,
    TenantId, TierId, UserId,
};
pub use progress::{Bookmark, Highlight, Note, NoteScope, Progress, ProgressNode};
pub use proration::{prorate, remaining_days_in_period, Proration};
pub use subscription::{
    SubscriptionStatus, TenantSubscription, UserSubscription, UserSubscriptionStatus,
};
pub use tenant::{slug_is_valid, Branding, Tenant, RESERVED_SLUGS};
pub use tier::{BillingTier, TierKind};
