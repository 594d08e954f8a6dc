//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Apply permission rules (owner-only acceptance, own-vote-only changes).
//! - Keep callers decoupled from storage details.

pub mod answer_service;
pub mod comment_service;
pub mod page_service;
pub mod profile_service;
pub mod question_service;
pub mod subscription_service;
pub mod vote_service;
