use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::models::DownloadJob;
use crate::services::ServiceError;

/// Final import step: place a finished download into the library.
#[async_trait]
pub trait Importer: Send + Sync {
    /// Move `entry` under `target_root`, renamed to the job's clean name.
    /// Returns the final path.
    async fn import(
        &self,
        entry: &Path,
        target_root: &Path,
        job: &DownloadJob,
    ) -> Result<PathBuf, ServiceError>;
}

/// Default importer: rename to the derived clean name and move into a
/// per-magazine folder. No file conversion is attempted.
pub struct LibraryImporter;

#[async_trait]
impl Importer for LibraryImporter {
    async fn import(
        &self,
        entry: &Path,
        target_root: &Path,
        job: &DownloadJob,
    ) -> Result<PathBuf, ServiceError> {
        let folder = magazine_folder(job);
        let clean = derive_clean_name(job);

        let dest_dir = target_root.join(&folder);
        std::fs::create_dir_all(&dest_dir)?;

        let file_name = match entry.extension().and_then(|e| e.to_str()) {
            Some(ext) if entry.is_file() => format!("{}.{}", clean, ext),
            _ => clean.clone(),
        };
        let destination = resolve_destination(dest_dir.join(file_name));

        move_entry(entry, &destination)?;
        tracing::info!(
            job_id = job.id,
            destination = %destination.display(),
            "imported download into library"
        );

        Ok(destination)
    }
}

/// Library folder for a job's magazine.
pub fn magazine_folder(job: &DownloadJob) -> String {
    let raw = job
        .magazine_title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("Magazine");
    sanitize_filename(raw)
}

/// Human-readable name the imported files are renamed to.
///
/// Built from the magazine title plus whatever issue identity survived
/// parsing: issue number, month, or digits lifted from the issue code.
pub fn derive_clean_name(job: &DownloadJob) -> String {
    let base = job
        .magazine_title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(&job.title);

    let mut parts = vec![base.to_string()];

    let issue_token = if let Some(number) = job.issue_number {
        Some(format!("{:02}", number))
    } else if let Some(month) = job.issue_month {
        Some(format!("{:02}", month))
    } else {
        code_digits(job.issue_code.as_deref(), 4, 6)
    };
    if let Some(token) = issue_token {
        parts.push(token);
    }

    let year_token = if let Some(year) = job.issue_year {
        Some(format!("{:04}", year))
    } else {
        code_digits(job.issue_code.as_deref(), 0, 4)
    };
    if let Some(token) = year_token {
        parts.push(token);
    }

    sanitize_filename(&parts.join(" "))
}

/// Slice of the digit run inside an issue code, if long enough.
fn code_digits(code: Option<&str>, start: usize, end: usize) -> Option<String> {
    let digits: String = code?.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() >= end {
        Some(digits[start..end].to_string())
    } else {
        None
    }
}

/// Strip characters that are unsafe in file names.
///
/// Keeps alphanumerics, whitespace, dots, dashes and underscores;
/// everything else becomes a space. Never returns an empty string.
pub fn sanitize_filename(name: &str) -> String {
    let mapped: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '.' | '_') {
                c
            } else {
                ' '
            }
        })
        .collect();
    let collapsed = mapped.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| matches!(c, ' ' | '.' | '-' | '_'));
    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Find a free path by suffixing `-1`, `-2`, ... before the extension
/// for files, or at the end of the name for directories.
pub fn resolve_destination(path: PathBuf) -> PathBuf {
    if !path.exists() {
        return path;
    }

    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".to_string());
    let extension = path.extension().map(|e| e.to_string_lossy().to_string());

    for counter in 1.. {
        let name = match &extension {
            Some(ext) => format!("{}-{}.{}", stem, counter, ext),
            None => format!("{}-{}", stem, counter),
        };
        let candidate = parent.join(name);
        if !candidate.exists() {
            return candidate;
        }
    }

    unreachable!("counter loop always yields a free path")
}

/// Move with a copy fallback for cross-device renames.
pub fn move_entry(source: &Path, destination: &Path) -> std::io::Result<()> {
    match std::fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(_) if source.is_file() => {
            std::fs::copy(source, destination)?;
            std::fs::remove_file(source)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::DownloadStatus;

    fn job(magazine: Option<&str>) -> DownloadJob {
        DownloadJob {
            id: 1,
            engine_id: Some("nzo".to_string()),
            title: "raw.release.name".to_string(),
            magazine_title: magazine.map(str::to_string),
            link: None,
            content_name: None,
            status: DownloadStatus::Completed,
            engine_status: None,
            progress: 100.0,
            time_remaining: None,
            message: None,
            clean_name: None,
            staging_path: None,
            issue_code: None,
            issue_label: None,
            issue_year: None,
            issue_month: None,
            issue_number: None,
            last_seen: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
            moved_at: None,
        }
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("PC Gamer: Issue #345!"), "PC Gamer Issue 345");
        assert_eq!(sanitize_filename("..--__.."), "download");
        assert_eq!(sanitize_filename("  a   b  "), "a b");
        assert_eq!(sanitize_filename("Fernsehwoche März"), "Fernsehwoche März");
    }

    #[test]
    fn test_derive_clean_name_prefers_issue_number() {
        let mut j = job(Some("PC Gamer"));
        j.issue_number = Some(7);
        j.issue_year = Some(2024);
        assert_eq!(derive_clean_name(&j), "PC Gamer 07 2024");
    }

    #[test]
    fn test_derive_clean_name_from_month_and_code() {
        let mut j = job(Some("Stereoplay"));
        j.issue_month = Some(3);
        j.issue_code = Some("2024-03-01".to_string());
        // Month token from the field, year lifted from the code digits.
        assert_eq!(derive_clean_name(&j), "Stereoplay 03 2024");
    }

    #[test]
    fn test_derive_clean_name_without_identity_falls_back_to_title() {
        let j = job(None);
        assert_eq!(derive_clean_name(&j), "raw.release.name");
        assert_eq!(magazine_folder(&j), "Magazine");
    }

    #[test]
    fn test_resolve_destination_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mag.pdf");
        assert_eq!(resolve_destination(path.clone()), path);

        std::fs::write(&path, b"x").unwrap();
        assert_eq!(resolve_destination(path.clone()), dir.path().join("mag-1.pdf"));

        std::fs::write(dir.path().join("mag-1.pdf"), b"x").unwrap();
        assert_eq!(resolve_destination(path), dir.path().join("mag-2.pdf"));

        let sub = dir.path().join("folder");
        std::fs::create_dir(&sub).unwrap();
        assert_eq!(resolve_destination(sub), dir.path().join("folder-1"));
    }

    #[tokio::test]
    async fn test_import_renames_and_moves() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("pc.gamer.345.pdf");
        std::fs::write(&source, b"pdf bytes").unwrap();
        let library = dir.path().join("library");

        let mut j = job(Some("PC Gamer"));
        j.issue_number = Some(345);
        j.issue_year = Some(2025);

        let dest = LibraryImporter
            .import(&source, &library, &j)
            .await
            .unwrap();

        assert_eq!(dest, library.join("PC Gamer").join("PC Gamer 345 2025.pdf"));
        assert!(dest.is_file());
        assert!(!source.exists());
    }
}
