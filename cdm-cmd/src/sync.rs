//! Copy monthly index files from their producer directories into the
//! data directory read by the map.

use crate::config::SyncFamily;
use log::{debug, error, info, warn};
use std::fs::{self, File};
use std::path::Path;
use std::time::SystemTime;

/// Outcome of syncing one family.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct SyncReport {
    pub family: String,
    pub copied: usize,
    pub skipped: usize,
    pub errors: usize,
}

enum FileOutcome {
    Copied,
    UpToDate,
}

/// Sync every family; fails when any file or directory could not be handled.
pub fn run_sync(families: &[SyncFamily]) -> anyhow::Result<Vec<SyncReport>> {
    info!("Syncing {} index families", families.len());
    let reports: Vec<SyncReport> = families.iter().map(sync_family).collect();
    for report in &reports {
        info!(
            "{}: {} copied, {} up to date, {} errors",
            report.family, report.copied, report.skipped, report.errors
        );
    }
    let errors: usize = reports.iter().map(|r| r.errors).sum();
    if errors > 0 {
        anyhow::bail!("index sync finished with {} errors", errors);
    }
    Ok(reports)
}

pub fn sync_family(family: &SyncFamily) -> SyncReport {
    let mut report = SyncReport {
        family: family.name.clone(),
        ..SyncReport::default()
    };

    if !family.source.is_dir() {
        error!("Source directory does not exist: {}", family.source.display());
        report.errors += 1;
        return report;
    }
    if !family.destination.is_dir() {
        if let Err(e) = fs::create_dir_all(&family.destination) {
            error!(
                "Could not create destination {}: {}",
                family.destination.display(),
                e
            );
            report.errors += 1;
            return report;
        }
        info!("Created destination {}", family.destination.display());
    }

    let pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&family.source.to_string_lossy()),
        family.pattern
    );
    let paths = match glob::glob(&pattern) {
        Ok(paths) => paths,
        Err(e) => {
            error!("Invalid pattern {}: {}", family.pattern, e);
            report.errors += 1;
            return report;
        }
    };

    let mut found = 0;
    for entry in paths {
        let source = match entry {
            Ok(path) if path.is_file() => path,
            Ok(_) => continue,
            Err(e) => {
                error!("Unreadable entry in {}: {}", family.source.display(), e);
                report.errors += 1;
                continue;
            }
        };
        found += 1;
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let destination = family.destination.join(file_name);
        match sync_file(&source, &destination) {
            Ok(FileOutcome::Copied) => {
                info!("Copied {}", destination.display());
                report.copied += 1;
            }
            Ok(FileOutcome::UpToDate) => {
                debug!("Up to date, skipping {}", destination.display());
                report.skipped += 1;
            }
            Err(e) => {
                error!("Failed to copy {}: {}", source.display(), e);
                report.errors += 1;
            }
        }
    }
    if found == 0 {
        warn!(
            "No files matching '{}' in {}",
            family.pattern,
            family.source.display()
        );
    }
    report
}

fn modified(path: &Path) -> std::io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

fn sync_file(source: &Path, destination: &Path) -> std::io::Result<FileOutcome> {
    let source_time = modified(source)?;
    if destination.exists() && source_time <= modified(destination)? {
        return Ok(FileOutcome::UpToDate);
    }
    fs::copy(source, destination)?;
    File::options()
        .write(true)
        .open(destination)?
        .set_modified(source_time)?;
    Ok(FileOutcome::Copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn family(source: PathBuf, destination: PathBuf) -> SyncFamily {
        SyncFamily {
            name: "spi".to_string(),
            source,
            destination,
            pattern: "*.txt".to_string(),
        }
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn test_copies_new_files_and_preserves_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("prueba/spi");
        let destination = dir.path().join("salida/spi/txt");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("2024_04_indices.txt"), "Estacion,3\nE1,0.1\n").unwrap();
        fs::write(source.join("notes.md"), "ignored").unwrap();
        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        set_mtime(&source.join("2024_04_indices.txt"), stamp);

        let report = sync_family(&family(source, destination.clone()));
        assert_eq!(report.copied, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.errors, 0);

        let copied = destination.join("2024_04_indices.txt");
        assert_eq!(fs::read_to_string(&copied).unwrap(), "Estacion,3\nE1,0.1\n");
        assert_eq!(modified(&copied).unwrap(), stamp);
        assert!(!destination.join("notes.md").exists());
    }

    #[test]
    fn test_skips_up_to_date_and_refreshes_stale() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let destination = dir.path().join("dst");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&destination).unwrap();
        let old = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        let new = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);

        fs::write(source.join("a.txt"), "a").unwrap();
        fs::write(destination.join("a.txt"), "a-old").unwrap();
        set_mtime(&source.join("a.txt"), old);
        set_mtime(&destination.join("a.txt"), new);

        fs::write(source.join("b.txt"), "b-new").unwrap();
        fs::write(destination.join("b.txt"), "b-old").unwrap();
        set_mtime(&source.join("b.txt"), new);
        set_mtime(&destination.join("b.txt"), old);

        let report = sync_family(&family(source, destination.clone()));
        assert_eq!((report.copied, report.skipped, report.errors), (1, 1, 0));
        assert_eq!(fs::read_to_string(destination.join("a.txt")).unwrap(), "a-old");
        assert_eq!(fs::read_to_string(destination.join("b.txt")).unwrap(), "b-new");
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let families = vec![family(dir.path().join("nope"), dir.path().join("dst"))];
        let report = sync_family(&families[0]);
        assert_eq!(report.errors, 1);
        assert!(run_sync(&families).is_err());
        assert!(!dir.path().join("dst").exists());
    }

    #[test]
    fn test_empty_source_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        fs::create_dir_all(&source).unwrap();
        let reports = run_sync(&[family(source, dir.path().join("dst"))]).unwrap();
        assert_eq!(reports[0], SyncReport { family: "spi".to_string(), ..SyncReport::default() });
        assert!(dir.path().join("dst").is_dir());
    }
}
