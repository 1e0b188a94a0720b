//! ndjson feed storage
//!
//! Each product has one feed file with one release record per line.
//! Loaded records keep their original line text so a save re-encodes
//! only the lines a merge actually touched; a feed nothing changed in
//! is never rewritten at all.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::domain::{Release, Version};

/// Outcome of upserting one release into a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// New version, appended at the end
    Added,
    /// Existing version, artifact list changed
    Merged,
    /// Existing version, nothing to change
    Unchanged,
}

#[derive(Debug)]
struct Record {
    raw: String,
    release: Release,
    dirty: bool,
}

/// In-memory contents of one feed, loaded once and saved back at most once
#[derive(Debug, Default)]
pub struct Feed {
    records: Vec<Record>,
}

impl Feed {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True once any upsert changed a record
    pub fn is_dirty(&self) -> bool {
        self.records.iter().any(|r| r.dirty)
    }

    pub fn releases(&self) -> impl Iterator<Item = &Release> {
        self.records.iter().map(|r| &r.release)
    }

    pub fn get(&self, version: &Version) -> Option<&Release> {
        self.records
            .iter()
            .find(|r| &r.release.version == version)
            .map(|r| &r.release)
    }

    /// Applies one incoming release: appends a new version at the end,
    /// or merges into the existing record in place
    pub fn upsert(&mut self, release: Release) -> Upsert {
        match self
            .records
            .iter_mut()
            .find(|r| r.release.version == release.version)
        {
            Some(record) => {
                if record.release.merge_artifacts(&release) {
                    record.dirty = true;
                    Upsert::Merged
                } else {
                    Upsert::Unchanged
                }
            }
            None => {
                self.records.push(Record {
                    raw: String::new(),
                    release,
                    dirty: true,
                });
                Upsert::Added
            }
        }
    }
}

/// Store for one product's release feed
pub struct FeedStore {
    path: PathBuf,
}

impl FeedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the feed file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the feed; an absent file is an empty feed
    pub fn load(&self) -> Result<Feed> {
        let mut feed = Feed::default();

        if !self.path.exists() {
            return Ok(feed);
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open feed: {}", self.path.display()))?;
        let reader = BufReader::new(file);

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            let release: Release = serde_json::from_str(&line).with_context(|| {
                format!(
                    "Failed to parse release at line {} of {}",
                    line_num + 1,
                    self.path.display()
                )
            })?;

            if feed.get(&release.version).is_some() {
                bail!(
                    "Duplicate version {} at line {} of {}",
                    release.version,
                    line_num + 1,
                    self.path.display()
                );
            }

            feed.records.push(Record {
                raw: line,
                release,
                dirty: false,
            });
        }

        Ok(feed)
    }

    /// Writes the feed back. Untouched records are written from their
    /// original lines; merged and added records are re-encoded. The
    /// write goes to a temp file first and is renamed into place.
    pub fn save(&self, feed: &Feed) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let temp_path = self.path.with_extension("ndjson.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            let mut writer = BufWriter::new(file);

            for record in &feed.records {
                if record.dirty {
                    let line = serde_json::to_string(&record.release)
                        .context("Failed to serialize release")?;
                    writeln!(writer, "{}", line).context("Failed to write release")?;
                } else {
                    writeln!(writer, "{}", record.raw).context("Failed to write release")?;
                }
            }

            writer.flush().context("Failed to flush feed")?;
        }

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Artifact, Checksum};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn make_release(version: &str, platforms: &[&str]) -> Release {
        let artifacts = platforms
            .iter()
            .map(|platform| Artifact {
                platform: platform.to_string(),
                variant: None,
                url: format!("https://dl.example/{}/{}.tar.gz", version, platform),
                archive_format: "tar.gz".to_string(),
                sha256: Checksum::Digest("abc123".to_string()),
            })
            .collect();
        Release::new(
            version.parse().unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            artifacts,
        )
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FeedStore::new(dir.path().join("uv.ndjson"));

        let feed = store.load().unwrap();
        assert!(feed.is_empty());
    }

    #[test]
    fn upsert_and_save_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FeedStore::new(dir.path().join("uv.ndjson"));

        let mut feed = store.load().unwrap();
        assert_eq!(feed.upsert(make_release("1.0.0", &["x86"])), Upsert::Added);
        assert_eq!(feed.upsert(make_release("1.1.0", &["x86"])), Upsert::Added);
        store.save(&feed).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        let versions: Vec<_> = loaded.releases().map(|r| r.version.to_string()).collect();
        assert_eq!(versions, vec!["1.0.0", "1.1.0"]);
    }

    #[test]
    fn republishing_identical_content_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = FeedStore::new(dir.path().join("uv.ndjson"));

        let mut feed = store.load().unwrap();
        feed.upsert(make_release("1.0.0", &["x86"]));
        store.save(&feed).unwrap();
        let before = fs::read(store.path()).unwrap();

        let mut feed = store.load().unwrap();
        assert_eq!(
            feed.upsert(make_release("1.0.0", &["x86"])),
            Upsert::Unchanged
        );
        assert!(!feed.is_dirty());

        // Nothing changed, so the caller skips save and the bytes stay put
        let after = fs::read(store.path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn merge_unions_disjoint_platforms() {
        let dir = TempDir::new().unwrap();
        let store = FeedStore::new(dir.path().join("uv.ndjson"));

        let mut feed = store.load().unwrap();
        feed.upsert(make_release("1.0.0", &["x86"]));
        store.save(&feed).unwrap();

        let mut feed = store.load().unwrap();
        assert_eq!(
            feed.upsert(make_release("1.0.0", &["aarch64"])),
            Upsert::Merged
        );
        store.save(&feed).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        let release = loaded.get(&"1.0.0".parse().unwrap()).unwrap();
        let platforms: Vec<_> = release.artifacts.iter().map(|a| a.platform.as_str()).collect();
        assert_eq!(platforms, vec!["x86", "aarch64"]);
    }

    #[test]
    fn untouched_lines_survive_byte_for_byte() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uv.ndjson");

        // A hand-edited line with spacing serde would not produce
        let original = r#"{"version": "0.9.0",  "date": "2025-01-01T00:00:00Z", "artifacts": [{"platform": "x86", "url": "https://x/a.tar.gz", "archive_format": "tar.gz", "sha256": "abc"}]}"#;
        fs::write(&path, format!("{}\n", original)).unwrap();

        let store = FeedStore::new(&path);
        let mut feed = store.load().unwrap();
        assert_eq!(feed.upsert(make_release("1.0.0", &["x86"])), Upsert::Added);
        store.save(&feed).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], original);
    }

    #[test]
    fn merging_reencodes_only_the_touched_line() {
        let dir = TempDir::new().unwrap();
        let store = FeedStore::new(dir.path().join("uv.ndjson"));

        let mut feed = store.load().unwrap();
        feed.upsert(make_release("1.0.0", &["x86"]));
        feed.upsert(make_release("1.1.0", &["x86"]));
        store.save(&feed).unwrap();
        let first_line_before = fs::read_to_string(store.path())
            .unwrap()
            .lines()
            .next()
            .unwrap()
            .to_string();

        let mut feed = store.load().unwrap();
        feed.upsert(make_release("1.1.0", &["aarch64"]));
        store.save(&feed).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], first_line_before);
        assert!(lines[1].contains("aarch64"));
    }

    #[test]
    fn every_saved_line_is_valid_json() {
        let dir = TempDir::new().unwrap();
        let store = FeedStore::new(dir.path().join("uv.ndjson"));

        let mut feed = store.load().unwrap();
        feed.upsert(make_release("1.0.0", &["x86", "aarch64"]));
        feed.upsert(make_release("1.1.0", &["x86"]));
        store.save(&feed).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        for line in content.lines() {
            let parsed: Release = serde_json::from_str(line).unwrap();
            assert!(!parsed.artifacts.is_empty());
        }
    }

    #[test]
    fn blank_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uv.ndjson");
        fs::write(
            &path,
            "\n{\"version\":\"1.0.0\",\"date\":\"2025-01-01T00:00:00Z\",\"artifacts\":[{\"platform\":\"x\",\"url\":\"https://x\",\"archive_format\":\"zip\",\"sha256\":\"ab\"}]}\n\n",
        )
        .unwrap();

        let feed = FeedStore::new(&path).load().unwrap();
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn parse_error_names_the_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uv.ndjson");
        fs::write(
            &path,
            "{\"version\":\"1.0.0\",\"date\":\"2025-01-01T00:00:00Z\",\"artifacts\":[{\"platform\":\"x\",\"url\":\"https://x\",\"archive_format\":\"zip\",\"sha256\":\"ab\"}]}\nnot json\n",
        )
        .unwrap();

        let err = FeedStore::new(&path).load().unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn duplicate_version_in_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uv.ndjson");
        let line = "{\"version\":\"1.0.0\",\"date\":\"2025-01-01T00:00:00Z\",\"artifacts\":[{\"platform\":\"x\",\"url\":\"https://x\",\"archive_format\":\"zip\",\"sha256\":\"ab\"}]}";
        fs::write(&path, format!("{}\n{}\n", line, line)).unwrap();

        let err = FeedStore::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("Duplicate version 1.0.0"));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = FeedStore::new(dir.path().join("v1").join("uv.ndjson"));

        let mut feed = Feed::default();
        feed.upsert(make_release("1.0.0", &["x86"]));
        store.save(&feed).unwrap();

        assert!(store.path().exists());
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = FeedStore::new(dir.path().join("uv.ndjson"));

        let mut feed = Feed::default();
        feed.upsert(make_release("1.0.0", &["x86"]));
        store.save(&feed).unwrap();

        assert!(!store.path().with_extension("ndjson.tmp").exists());
    }
}
