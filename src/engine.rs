use crate::config::DiffConfig;
use crate::diff::{self, Collection, DiffJob, DiffMap};
use crate::ui::layout::{self, LogicalLines};
use anyhow::{Context, Result};

/// The computations the viewer delegates: tree comparison, line diffing,
/// text detection and layout. Shared with worker threads.
pub trait Engine: Send + Sync {
    fn build_collection(&self, left: &str, right: &str) -> Result<Collection>;
    fn is_text_path(&self, path: &str) -> bool;
    fn diff(&self, jobs: &[DiffJob], context: usize) -> Result<DiffMap>;
    fn layout(
        &self,
        collection: &Collection,
        diff_map: &DiffMap,
        columns: usize,
    ) -> Result<LogicalLines>;
}

/// Engine working on the local filesystem
pub struct FsEngine {
    config: DiffConfig,
    ignore: Vec<glob::Pattern>,
}

impl FsEngine {
    pub fn new(config: DiffConfig) -> Result<Self> {
        let ignore = config
            .ignore_name
            .iter()
            .map(|p| glob::Pattern::new(p).with_context(|| format!("Invalid ignore_name pattern '{}'", p)))
            .collect::<Result<Vec<_>>>()?;
        Ok(FsEngine { config, ignore })
    }
}

impl Engine for FsEngine {
    fn build_collection(&self, left: &str, right: &str) -> Result<Collection> {
        let collection = diff::build_collection(left, right, &self.ignore)?;
        log::debug!("collection built: {} entries", collection.len());
        Ok(collection)
    }

    fn is_text_path(&self, path: &str) -> bool {
        diff::is_text_path(path)
    }

    fn diff(&self, jobs: &[DiffJob], context: usize) -> Result<DiffMap> {
        let map = diff::diff(jobs, context)?;
        log::debug!("diffed {} file pairs with {} context lines", jobs.len(), context);
        Ok(map)
    }

    fn layout(
        &self,
        collection: &Collection,
        diff_map: &DiffMap,
        columns: usize,
    ) -> Result<LogicalLines> {
        Ok(layout::render(collection, diff_map, columns, &self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_ignore_pattern_is_rejected() {
        let config = DiffConfig {
            ignore_name: vec!["[".to_string()],
            ..DiffConfig::default()
        };
        assert!(FsEngine::new(config).is_err());
    }

    #[test]
    fn end_to_end_on_two_directories() {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        std::fs::write(left.path().join("a.txt"), "one\ntwo\n").unwrap();
        std::fs::write(right.path().join("a.txt"), "one\n2\nthree\n").unwrap();
        std::fs::write(left.path().join("skip.log"), "x\n").unwrap();

        let engine = FsEngine::new(DiffConfig {
            ignore_name: vec!["*.log".to_string()],
            ..DiffConfig::default()
        })
        .unwrap();
        let collection = engine
            .build_collection(left.path().to_str().unwrap(), right.path().to_str().unwrap())
            .unwrap();
        assert_eq!(collection.len(), 1);

        let entry = collection.iter().next().unwrap();
        let job = DiffJob::new(entry.path.clone(), entry.counterpart().unwrap());
        assert!(engine.is_text_path(&job.left));
        let map = engine.diff(std::slice::from_ref(&job), 3).unwrap();
        assert_eq!(map[&job.key()].added_count, 2);
        assert_eq!(map[&job.key()].removed_count, 1);

        let lines = engine.layout(&collection, &map, 60).unwrap();
        assert!(!lines.is_empty());
    }
}
