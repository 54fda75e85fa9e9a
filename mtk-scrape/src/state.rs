//! Persistent scrape state
//!
//! Three append-only files survive between runs: the JSON lines record log,
//! the blacklist of ids that returned 404 and the whitelist of captured ids.
//! Every append is flushed before the call returns, so an interrupted run
//! loses at most the request in flight.

use mtk_common::config::ScrapeConfig;
use mtk_common::dataset::{append_log, LogRecord};
use mtk_common::Result;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

fn open_append(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Set of ids backed by a one-id-per-line file
pub struct IdList {
    ids: HashSet<i64>,
    file: File,
}

impl IdList {
    /// Load the existing list (lines that are not plain integers are ignored)
    pub fn open(path: &Path) -> Result<Self> {
        let mut ids = HashSet::new();
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            for line in reader.lines() {
                let line = line?;
                let trimmed = line.trim();
                if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(id) = trimmed.parse() {
                        ids.insert(id);
                    }
                } else if !trimmed.is_empty() {
                    debug!(path = %path.display(), line = %trimmed, "Ignoring id list line");
                }
            }
        }

        Ok(Self {
            ids,
            file: open_append(path)?,
        })
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.ids.iter().copied()
    }

    /// Add and persist an id; `false` when it was already listed
    pub fn insert(&mut self, id: i64) -> Result<bool> {
        if !self.ids.insert(id) {
            return Ok(false);
        }
        writeln!(self.file, "{}", id)?;
        self.file.flush()?;
        Ok(true)
    }
}

/// Record log, blacklist and whitelist of one scrape target
pub struct ScrapeState {
    log: File,
    log_path: PathBuf,
    bad: IdList,
    good: IdList,
}

impl ScrapeState {
    pub fn open(config: &ScrapeConfig) -> Result<Self> {
        let state = Self {
            log: open_append(&config.data_file)?,
            log_path: config.data_file.clone(),
            bad: IdList::open(&config.bad_ids_file)?,
            good: IdList::open(&config.good_ids_file)?,
        };
        info!(
            blacklisted = state.bad.len(),
            completed = state.good.len(),
            log = %state.log_path.display(),
            "Scrape state loaded"
        );
        Ok(state)
    }

    /// Already blacklisted or captured
    pub fn is_known(&self, id: i64) -> bool {
        self.bad.contains(id) || self.good.contains(id)
    }

    /// Distinct known ids within `[low, high]`
    pub fn known_in_range(&self, low: i64, high: i64) -> u64 {
        let in_range = |id: &i64| (low..=high).contains(id);
        let bad = self.bad.iter().filter(in_range).count();
        let good_only = self
            .good
            .iter()
            .filter(in_range)
            .filter(|id| !self.bad.contains(*id))
            .count();
        (bad + good_only) as u64
    }

    pub fn blacklist(&self) -> &IdList {
        &self.bad
    }

    pub fn whitelist(&self) -> &IdList {
        &self.good
    }

    /// Permanently blacklist an id
    pub fn mark_not_found(&mut self, id: i64) -> Result<bool> {
        self.bad.insert(id)
    }

    /// Append the record to the log, then whitelist its id
    pub fn record_success(&mut self, id: i64, record: &LogRecord) -> Result<bool> {
        append_log(&mut self.log, record)?;
        self.log.flush()?;
        self.good.insert(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> ScrapeConfig {
        ScrapeConfig {
            data_file: dir.path().join("data.jsonl"),
            bad_ids_file: dir.path().join("bad.txt"),
            good_ids_file: dir.path().join("good.txt"),
            ..Default::default()
        }
    }

    #[test]
    fn test_id_list_ignores_non_integer_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.txt");
        fs::write(&path, "12\n  7 \n\nabc\n-3\n4.5\n12\n").unwrap();

        let list = IdList::open(&path).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains(12));
        assert!(list.contains(7));
        assert!(!list.contains(-3));
    }

    #[test]
    fn test_insert_appends_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ids.txt");
        fs::write(&path, "1\n").unwrap();

        let mut list = IdList::open(&path).unwrap();
        assert!(list.insert(2).unwrap());
        assert!(!list.insert(1).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "1\n2\n");

        let reopened = IdList::open(&path).unwrap();
        assert!(reopened.contains(2));
    }

    #[test]
    fn test_state_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        {
            let mut state = ScrapeState::open(&config).unwrap();
            state.mark_not_found(5).unwrap();
            let record = LogRecord {
                id: Some(9),
                title: Some("Monster".to_string()),
                score: Some(8.9),
                members: Some(250_000),
                demographic: Some("Seinen".to_string()),
                tags: vec!["Drama".to_string()],
            };
            state.record_success(9, &record).unwrap();
        }

        let state = ScrapeState::open(&config).unwrap();
        assert!(state.is_known(5));
        assert!(state.is_known(9));
        assert!(!state.is_known(6));
        assert_eq!(state.known_in_range(1, 6), 1);

        let log = mtk_common::dataset::read_log_file(&config.data_file).unwrap();
        assert_eq!(log.records.len(), 1);
        assert_eq!(log.records[0].title.as_deref(), Some("Monster"));
    }
}
