use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

pub type Snapshot = BTreeMap<PathBuf, SystemTime>;

/// Modification times of every file under `dirs`. Missing directories are skipped.
pub fn snapshot(dirs: &[&Path]) -> Snapshot {
    let mut snap = Snapshot::new();
    for dir in dirs {
        collect(dir, &mut snap);
    }
    snap
}

fn collect(dir: &Path, snap: &mut Snapshot) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if meta.is_dir() {
            collect(&path, snap);
        } else if let Ok(modified) = meta.modified() {
            snap.insert(path, modified);
        }
    }
}

/// Files added, removed or touched between two snapshots.
pub fn changed_paths(before: &Snapshot, after: &Snapshot) -> Vec<PathBuf> {
    let mut changed: Vec<PathBuf> = after
        .iter()
        .filter(|(path, mtime)| before.get(*path) != Some(*mtime))
        .map(|(path, _)| path.clone())
        .collect();
    changed.extend(
        before
            .keys()
            .filter(|path| !after.contains_key(*path))
            .cloned(),
    );
    changed.sort();
    changed
}

/// Poll `dirs` every `interval` and call `regenerate` once per tick that saw
/// changes. Returns when Ctrl-C is received.
pub async fn watch<F>(dirs: &[&Path], interval: Duration, mut regenerate: F) -> anyhow::Result<()>
where
    F: FnMut() -> anyhow::Result<()>,
{
    let mut last = snapshot(dirs);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    for dir in dirs {
        info!("Watching {}", dir.display());
    }
    println!("Watching for changes (Ctrl-C to stop)...");

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res?;
                info!("Stopping watcher");
                return Ok(());
            }
            _ = ticker.tick() => {
                let current = snapshot(dirs);
                let changed = changed_paths(&last, &current);
                last = current;
                if changed.is_empty() {
                    continue;
                }
                for path in &changed {
                    debug!("changed: {}", path.display());
                }
                info!("{} file(s) changed, regenerating", changed.len());
                if let Err(e) = regenerate() {
                    error!("Regeneration failed: {:#}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_added_modified_and_removed_files() {
        let t0 = SystemTime::UNIX_EPOCH;
        let t1 = t0 + Duration::from_secs(10);
        let before: Snapshot = [
            (PathBuf::from("data/news.json"), t0),
            (PathBuf::from("data/old.json"), t0),
            (PathBuf::from("data/personal.json"), t0),
        ]
        .into_iter()
        .collect();
        let after: Snapshot = [
            (PathBuf::from("data/news.json"), t1),
            (PathBuf::from("data/personal.json"), t0),
            (PathBuf::from("templates/news.html"), t0),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            changed_paths(&before, &after),
            vec![
                PathBuf::from("data/news.json"),
                PathBuf::from("data/old.json"),
                PathBuf::from("templates/news.html"),
            ]
        );
        assert!(changed_paths(&after, &after).is_empty());
    }

    #[test]
    fn snapshot_walks_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("nested/b.html"), "").unwrap();
        let missing = dir.path().join("missing");

        let snap = snapshot(&[dir.path(), missing.as_path()]);
        assert_eq!(snap.len(), 2);
        assert!(snap.contains_key(&dir.path().join("nested/b.html")));
    }
}
