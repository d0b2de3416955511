// ==============================================================================
// lib.rs - Chat Shredder Library
// ==============================================================================
// Description: Secure deletion of chat attachments and message metadata
// Author: Matt Barham
// Created: 2026-10-12
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

pub mod audit;
pub mod config;
pub mod deleter;
pub mod error;
pub mod models;
pub mod overwrite;
pub mod plan;
pub mod report;
pub mod scrub;
pub mod storage_detect;
pub mod store;
pub mod verify;

pub use config::ShredConfig;
pub use deleter::{BatchReport, FileFailure, SecureDeleter};
pub use error::DeletionError;
pub use models::{DeletionResult, DeletionTarget, StorageMedium};
