// ==============================================================================
// deleter.rs - Secure Deletion Orchestrator
// ==============================================================================
// Description: Selects an overwrite plan per storage medium and deletes single
//              files, message attachments, room folders and the upload root
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-19
// Version: 1.0.0
// Security: Every failure is returned, logged and reported to the room
// ==============================================================================

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::audit::{self, AuditEventType};
use crate::config::ShredConfig;
use crate::error::DeletionError;
use crate::models::{format_file_size, DeletionResult, DeletionTarget, StorageMedium};
use crate::overwrite::OverwritePass;
use crate::plan::{OverwritePlan, PlanStep};
use crate::report::{Broadcaster, FailureReporter};
use crate::scrub::MetadataScrubber;
use crate::storage_detect::StorageTypeDetector;
use crate::store::MessageStore;
use crate::verify::DeletionVerifier;

/// A file that could not be deleted inside a batch
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: DeletionError,
}

/// Outcome of a batch operation (message, room, storage root)
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Files handed to the single-file primitive
    pub attempted: usize,
    pub deleted: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
    pub directories_removed: usize,
    /// Message batches only: the metadata file is gone, so the message
    /// disappears from the chat view even if an attachment failed
    pub primary_removed: bool,
}

impl BatchReport {
    /// True when every file and directory in the batch was removed
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Secure deletion entry point shared by all request handlers.
///
/// Cheap to clone. The storage medium is detected once in the constructor
/// and is the only state shared between concurrent requests.
#[derive(Clone)]
pub struct SecureDeleter {
    inner: Arc<DeleterInner>,
}

struct DeleterInner {
    config: ShredConfig,
    medium: StorageMedium,
    overwrite: OverwritePass,
    scrubber: MetadataScrubber,
    verifier: DeletionVerifier,
    store: Arc<dyn MessageStore>,
    reporter: FailureReporter,
}

impl SecureDeleter {
    pub fn new(
        config: ShredConfig,
        detector: &dyn StorageTypeDetector,
        store: Arc<dyn MessageStore>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        let medium = detector.detect();
        info!("Storage type detected: {}", medium.as_str());

        if !config.enabled {
            warn!("Secure delete disabled: files will be unlinked without overwriting");
        }

        Self {
            inner: Arc::new(DeleterInner {
                overwrite: OverwritePass::new(config.chunk_size),
                scrubber: MetadataScrubber::new(),
                verifier: DeletionVerifier::new(),
                reporter: FailureReporter::new(broadcaster, config.report_errors),
                medium,
                store,
                config,
            }),
        }
    }

    pub fn medium(&self) -> StorageMedium {
        self.inner.medium
    }

    pub fn storage_root(&self) -> &Path {
        &self.inner.config.storage_root
    }

    pub fn plan_for(&self, target: &DeletionTarget) -> OverwritePlan {
        if target.is_symlink {
            return OverwritePlan::unlink_only();
        }
        OverwritePlan::for_target(self.inner.medium, target.length, &self.inner.config.plan_options())
    }

    /// Delete one file. Failures are reported to the target's room.
    pub fn delete_file(&self, target: DeletionTarget) -> DeletionResult {
        let room = target.room.clone();
        let user = target.user.clone();
        let path = target.path.clone();

        let result = self.try_delete_file(target);
        if let Err(e) = &result {
            self.report_failure(room.as_deref(), user.as_deref(), &path, e);
        }
        result.into()
    }

    /// Inspect `path` and delete it, reporting any failure
    pub fn delete_path(
        &self,
        path: &Path,
        room: Option<&str>,
        user: Option<&str>,
    ) -> Result<(), DeletionError> {
        let result = DeletionTarget::inspect(path, room.map(str::to_string), user.map(str::to_string))
            .and_then(|target| self.try_delete_file(target));

        if let Err(e) = &result {
            self.report_failure(room, user, path, e);
        }
        result
    }

    /// Run the deletion state machine for one target without reporting
    pub fn try_delete_file(&self, target: DeletionTarget) -> Result<(), DeletionError> {
        let started = Instant::now();
        let path = target.path.as_path();

        self.ensure_contained(path)?;

        if target.is_symlink {
            return self.remove_symlink(&target);
        }

        if !target.is_regular {
            return Err(DeletionError::NotARegularFile {
                path: path.to_path_buf(),
            });
        }

        let plan = self.plan_for(&target);
        info!(
            "Secure delete started: {:?} ({}, {})",
            path,
            format_file_size(target.length),
            self.inner.medium.as_str()
        );
        debug!("Overwrite plan for {:?}: {}", path, plan.describe());

        let mut bytes_written: u64 = 0;
        for step in plan.steps() {
            match step {
                PlanStep::Overwrite { length, fill } => {
                    bytes_written += self.inner.overwrite.run(path, *length, fill)?;
                }
                PlanStep::Scrub { new_length } => {
                    // Overwritten content is the primary defense; keep going
                    if let Err(e) = self.inner.scrubber.scrub(path, *new_length) {
                        warn!("Continuing after metadata scrub failure: {}", e);
                    }
                }
                PlanStep::Unlink => unlink(path)?,
            }
        }

        self.inner.verifier.check(path)?;

        let elapsed = started.elapsed().as_secs_f64();
        info!("Secure delete complete: {:?} in {:.2}s", path, elapsed);
        audit::log_event(
            AuditEventType::FileDeleted,
            target.room.as_deref(),
            target.user.as_deref(),
            Some(path.display().to_string()),
            serde_json::json!({
                "size": target.length,
                "medium": self.inner.medium.as_str(),
                "passes": plan.overwrite_passes(),
                "bytes_written": bytes_written,
                "seconds": elapsed,
            }),
        );
        Ok(())
    }

    fn remove_symlink(&self, target: &DeletionTarget) -> Result<(), DeletionError> {
        let path = target.path.as_path();
        match std::fs::read_link(path) {
            Ok(link_target) => info!(
                "Symbolic link detected: {:?} -> {:?}, removing link only",
                path, link_target
            ),
            Err(e) => warn!("Symbolic link {:?} target unreadable: {}", path, e),
        }

        unlink(path)?;
        self.inner.verifier.check(path)?;

        audit::log_event(
            AuditEventType::SymlinkRemoved,
            target.room.as_deref(),
            target.user.as_deref(),
            Some(path.display().to_string()),
            serde_json::json!({}),
        );
        Ok(())
    }

    /// Delete a message's metadata file, its referenced attachments and any
    /// file in the user's folder named after the message id.
    ///
    /// Fails only if the user's folder does not exist; per-file failures are
    /// collected in the report.
    pub fn delete_message_files(
        &self,
        room: &str,
        message_id: &str,
        username: &str,
    ) -> Result<BatchReport, DeletionError> {
        let user_dir = self.child_dir(&[room, username])?;
        self.validate_component(message_id)?;

        if !user_dir.is_dir() {
            info!("User directory not found: {:?}", user_dir);
            return Err(DeletionError::DirectoryNotFound { path: user_dir });
        }

        info!(
            "Deleting files of message {} from {} in room {}",
            message_id, username, room
        );

        let mut report = BatchReport::default();
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut primary = user_dir.join(format!("{}.xml", message_id));

        // 1. Metadata file first, then the attachments it references
        match self.inner.store.lookup(room, message_id, username) {
            Ok(Some(record)) => {
                debug!("Found attachment refs: {:?}", record.attachments);
                primary = record.metadata_path.clone();
                if seen.insert(record.metadata_path.clone()) {
                    self.run_one(&mut report, record.metadata_path, Some(room), Some(username));
                }

                for url in &record.attachments {
                    let Some(path) = self.resolve_attachment(&user_dir, url) else {
                        debug!("Ignoring attachment ref outside upload prefix: {}", url);
                        continue;
                    };
                    if std::fs::symlink_metadata(&path).is_ok() && seen.insert(path.clone()) {
                        self.run_one(&mut report, path, Some(room), Some(username));
                    }
                }
            }
            Ok(None) => debug!("No metadata file for message {}", message_id),
            Err(error) => {
                // Keep the metadata file so its attachment refs survive for a retry
                seen.insert(primary.clone());
                self.report_failure(Some(room), Some(username), &primary, &error);
                report.failures.push(FileFailure {
                    path: primary.clone(),
                    error,
                });
            }
        }

        // 2. Files that embed the message id in their name
        match related_files(&user_dir, message_id) {
            Ok(paths) => {
                for path in paths {
                    if seen.insert(path.clone()) {
                        self.run_one(&mut report, path, Some(room), Some(username));
                    }
                }
            }
            Err(source) => {
                let error = DeletionError::Stat {
                    path: user_dir.clone(),
                    source,
                };
                self.report_failure(Some(room), Some(username), &user_dir, &error);
                report.failures.push(FileFailure {
                    path: user_dir.clone(),
                    error,
                });
            }
        }

        report.primary_removed = self.inner.verifier.verify(&primary);

        info!(
            "File deletion completed for message {}: {} deleted, {} failed",
            message_id,
            report.deleted.len(),
            report.failures.len()
        );
        audit::log_event(
            AuditEventType::MessageFilesDeleted,
            Some(room),
            Some(username),
            Some(message_id.to_string()),
            batch_details(&report),
        );
        Ok(report)
    }

    /// Securely delete every file under a room's folder, then the folder
    pub fn delete_room_directory(&self, room: &str) -> Result<BatchReport, DeletionError> {
        let room_dir = self.child_dir(&[room])?;
        info!("Room deletion started: {}", room);

        let report = self.delete_tree(&room_dir, Some(room))?;

        info!(
            "Room deletion complete: {} ({} files, {} failures)",
            room,
            report.deleted.len(),
            report.failures.len()
        );
        audit::log_event(
            AuditEventType::RoomDeleted,
            Some(room),
            None,
            Some(room_dir.display().to_string()),
            batch_details(&report),
        );
        Ok(report)
    }

    /// Securely delete the whole upload root (full server wipe)
    pub fn delete_storage_root(&self) -> Result<BatchReport, DeletionError> {
        let root = self.inner.config.storage_root.clone();
        info!("Upload storage deletion started: {:?}", root);

        let report = self.delete_tree(&root, None)?;

        info!(
            "Upload storage deletion complete ({} files, {} failures)",
            report.deleted.len(),
            report.failures.len()
        );
        audit::log_event(
            AuditEventType::StorageWiped,
            None,
            None,
            Some(root.display().to_string()),
            batch_details(&report),
        );
        Ok(report)
    }

    /// Bottom-up walk: files first, each directory after its contents
    fn delete_tree(&self, dir: &Path, room: Option<&str>) -> Result<BatchReport, DeletionError> {
        // Follows a symlinked top directory; entries below it are never followed
        match std::fs::metadata(dir) {
            Ok(metadata) if metadata.is_dir() => {}
            _ => {
                info!("Directory not found: {:?}", dir);
                return Err(DeletionError::DirectoryNotFound {
                    path: dir.to_path_buf(),
                });
            }
        }
        if let Err(source) = std::fs::read_dir(dir) {
            return Err(match source.kind() {
                ErrorKind::NotFound => DeletionError::DirectoryNotFound {
                    path: dir.to_path_buf(),
                },
                _ => DeletionError::Stat {
                    path: dir.to_path_buf(),
                    source,
                },
            });
        }

        let mut report = BatchReport::default();

        for entry in WalkDir::new(dir).contents_first(true).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                    warn!("Skipping unreadable entry {:?}: {}", path, e);
                    report.failures.push(FileFailure {
                        error: DeletionError::Stat {
                            path: path.clone(),
                            source: e.into(),
                        },
                        path,
                    });
                    continue;
                }
            };

            let path = entry.path();
            if entry.depth() == 0 && entry.path_is_symlink() {
                debug!("Leaving linked directory {:?} in place", path);
            } else if entry.file_type().is_dir() {
                match std::fs::remove_dir(path) {
                    Ok(()) => report.directories_removed += 1,
                    Err(source) => {
                        // Usually a file inside failed and was reported already
                        let error = DeletionError::Unlink {
                            path: path.to_path_buf(),
                            source,
                        };
                        warn!("Directory left behind: {}", error);
                        report.failures.push(FileFailure {
                            path: path.to_path_buf(),
                            error,
                        });
                    }
                }
            } else {
                let file_room = room.map(str::to_string).or_else(|| self.room_of(path));
                self.run_one(&mut report, path.to_path_buf(), file_room.as_deref(), None);
            }
        }

        Ok(report)
    }

    pub async fn delete_file_async(&self, target: DeletionTarget) -> DeletionResult {
        let deleter = self.clone();
        match tokio::task::spawn_blocking(move || deleter.delete_file(target)).await {
            Ok(result) => result,
            Err(e) => DeletionResult::IoError(DeletionError::from(e).to_string()),
        }
    }

    pub async fn delete_message_files_async(
        &self,
        room: String,
        message_id: String,
        username: String,
    ) -> Result<BatchReport, DeletionError> {
        let deleter = self.clone();
        tokio::task::spawn_blocking(move || {
            deleter.delete_message_files(&room, &message_id, &username)
        })
        .await?
    }

    pub async fn delete_room_directory_async(&self, room: String) -> Result<BatchReport, DeletionError> {
        let deleter = self.clone();
        tokio::task::spawn_blocking(move || deleter.delete_room_directory(&room)).await?
    }

    pub async fn delete_storage_root_async(&self) -> Result<BatchReport, DeletionError> {
        let deleter = self.clone();
        tokio::task::spawn_blocking(move || deleter.delete_storage_root()).await?
    }

    fn run_one(&self, report: &mut BatchReport, path: PathBuf, room: Option<&str>, user: Option<&str>) {
        report.attempted += 1;
        match self.delete_path(&path, room, user) {
            Ok(()) => report.deleted.push(path),
            Err(error) => report.failures.push(FileFailure { path, error }),
        }
    }

    fn report_failure(&self, room: Option<&str>, user: Option<&str>, path: &Path, error: &DeletionError) {
        self.inner.reporter.report(room, path, error);
        audit::log_event(
            AuditEventType::FileDeleteFailed,
            room,
            user,
            Some(path.display().to_string()),
            serde_json::json!({
                "stage": format!("{:?}", error.stage()),
                "error": error.to_string(),
            }),
        );
    }

    /// Map an attachment URL to a file in the user's folder by its last segment
    fn resolve_attachment(&self, user_dir: &Path, url: &str) -> Option<PathBuf> {
        if !url.starts_with(&self.inner.config.attachment_url_prefix) {
            return None;
        }
        let name = url.rsplit('/').next()?;
        if name.is_empty() || name == "." || name == ".." {
            return None;
        }
        Some(user_dir.join(name))
    }

    /// First path component below the storage root, if the path is inside a room
    fn room_of(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.inner.config.storage_root).ok()?;
        let mut components = relative.components();
        let first = components.next()?;
        components.next()?;
        match first {
            Component::Normal(name) => Some(name.to_string_lossy().to_string()),
            _ => None,
        }
    }

    fn child_dir(&self, parts: &[&str]) -> Result<PathBuf, DeletionError> {
        let mut dir = self.inner.config.storage_root.clone();
        for part in parts {
            self.validate_component(part)?;
            dir.push(part);
        }
        Ok(dir)
    }

    /// Room, user and message ids must be plain single path components
    fn validate_component(&self, name: &str) -> Result<(), DeletionError> {
        let mut components = Path::new(name).components();
        let valid = !name.is_empty()
            && !name.contains(['/', '\\', '\0'])
            && matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none();

        if valid {
            Ok(())
        } else {
            Err(DeletionError::OutsideStorageRoot {
                path: self.inner.config.storage_root.join(name),
            })
        }
    }

    /// Refuse to touch anything that does not resolve inside the storage root
    fn ensure_contained(&self, path: &Path) -> Result<(), DeletionError> {
        let outside = || DeletionError::OutsideStorageRoot {
            path: path.to_path_buf(),
        };

        let root = self.inner.config.storage_root.canonicalize().map_err(|_| outside())?;
        let name = path.file_name().ok_or_else(outside)?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        // Canonicalize the parent only, so a symlink is judged by where it lives
        let resolved = parent.canonicalize().map_err(|_| outside())?.join(name);

        if resolved.starts_with(&root) && resolved != root {
            Ok(())
        } else {
            warn!("Refusing to delete {:?}: outside storage root {:?}", path, root);
            Err(outside())
        }
    }
}

fn unlink(path: &Path) -> Result<(), DeletionError> {
    std::fs::remove_file(path).map_err(|source| DeletionError::Unlink {
        path: path.to_path_buf(),
        source,
    })
}

/// Files in `dir` named after `message_id`, excluding other messages' metadata
fn related_files(dir: &Path, message_id: &str) -> std::io::Result<Vec<PathBuf>> {
    let own_metadata = format!("{}.xml", message_id);
    let dashed = format!("-{}-", message_id);
    let underscored = format!("_{}_", message_id);

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();

        let related = name.starts_with(message_id)
            || name.contains(&dashed)
            || name.contains(&underscored);
        if related && (!name.ends_with(".xml") || name == own_metadata) {
            paths.push(entry.path());
        }
    }

    paths.sort();
    Ok(paths)
}

fn batch_details(report: &BatchReport) -> serde_json::Value {
    serde_json::json!({
        "attempted": report.attempted,
        "deleted": report.deleted.len(),
        "failed": report.failures.len(),
        "directories_removed": report.directories_removed,
    })
}
