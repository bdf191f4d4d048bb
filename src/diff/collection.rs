use super::text::{count_lines, is_text_path, read_text};
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// How an entry differs between the two sides
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Added,
    Removed,
    /// Present on both sides with different content; holds the right-hand path
    Changed(String),
    /// Same content under a different name; holds the right-hand path
    Renamed(String),
}

impl Change {
    pub fn symbol(&self) -> &'static str {
        match self {
            Change::Added => "+",
            Change::Removed => "-",
            Change::Changed(_) => "~",
            Change::Renamed(_) => "R",
        }
    }
}

/// One classified entry of a comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Left-hand path, or the right-hand path for `Added`
    pub path: String,
    /// Path relative to its root, for display
    pub name: String,
    pub change: Change,
}

impl Entry {
    /// The right-hand path for changed and renamed entries
    pub fn counterpart(&self) -> Option<&str> {
        match &self.change {
            Change::Changed(p) | Change::Renamed(p) => Some(p),
            Change::Added | Change::Removed => None,
        }
    }
}

/// The classified comparison of two files or directory trees.
/// Unchanged entries are not recorded.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    entries: Vec<Entry>,
    /// Lines in added text files
    pub added_count: usize,
    /// Lines in removed text files
    pub removed_count: usize,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Entries in display order
    pub fn iter(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compare `left` and `right`, which must both be files or both be directories.
/// Names matching any of `ignore` are skipped while walking.
pub fn build(left: &str, right: &str, ignore: &[glob::Pattern]) -> Result<Collection> {
    let (lp, rp) = (Path::new(left), Path::new(right));
    let (lmeta, rmeta) = (
        std::fs::metadata(lp).with_context(|| format!("Cannot access '{}'", left))?,
        std::fs::metadata(rp).with_context(|| format!("Cannot access '{}'", right))?,
    );

    let mut collection = Collection::new();
    match (lmeta.is_dir(), rmeta.is_dir()) {
        (false, false) => {
            if hash_file(lp)? != hash_file(rp)? {
                collection.push(Entry {
                    path: left.to_string(),
                    name: pair_name(lp, rp),
                    change: Change::Changed(right.to_string()),
                });
            }
        }
        (true, true) => compare_trees(&mut collection, lp, rp, ignore)?,
        _ => anyhow::bail!(
            "Cannot compare a file with a directory: '{}' and '{}'",
            left,
            right
        ),
    }
    Ok(collection)
}

fn pair_name(left: &Path, right: &Path) -> String {
    let l = left.to_string_lossy();
    let r = right.to_string_lossy();
    if left.file_name() == right.file_name() {
        left.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| l.to_string())
    } else {
        format!("{} → {}", l, r)
    }
}

fn compare_trees(
    collection: &mut Collection,
    left: &Path,
    right: &Path,
    ignore: &[glob::Pattern],
) -> Result<()> {
    let left_files = walk(left, ignore)?;
    let right_files = walk(right, ignore)?;

    let mut entries = Vec::new();
    // Removed candidates keyed by content hash, for rename detection
    let mut removed_by_hash: HashMap<[u8; 32], Vec<String>> = HashMap::new();
    let mut removed: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut added: BTreeMap<String, PathBuf> = BTreeMap::new();

    for (name, lpath) in &left_files {
        match right_files.get(name) {
            Some(rpath) => {
                if hash_file(lpath)? != hash_file(rpath)? {
                    entries.push(Entry {
                        path: path_str(lpath)?,
                        name: name.clone(),
                        change: Change::Changed(path_str(rpath)?),
                    });
                }
            }
            None => {
                removed_by_hash.entry(hash_file(lpath)?).or_default().push(name.clone());
                removed.insert(name.clone(), lpath.clone());
            }
        }
    }
    for (name, rpath) in &right_files {
        if !left_files.contains_key(name) {
            added.insert(name.clone(), rpath.clone());
        }
    }

    for (name, rpath) in std::mem::take(&mut added) {
        let hash = hash_file(&rpath)?;
        let origin = removed_by_hash.get_mut(&hash).and_then(|names| names.pop());
        match origin.and_then(|old| removed.remove(&old).map(|p| (old, p))) {
            Some((old_name, lpath)) => entries.push(Entry {
                path: path_str(&lpath)?,
                name: format!("{} → {}", old_name, name),
                change: Change::Renamed(path_str(&rpath)?),
            }),
            None => {
                let path = path_str(&rpath)?;
                collection.added_count += text_line_count(&path)?;
                entries.push(Entry { path, name, change: Change::Added });
            }
        }
    }
    for (name, lpath) in removed {
        let path = path_str(&lpath)?;
        collection.removed_count += text_line_count(&path)?;
        entries.push(Entry { path, name, change: Change::Removed });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    for entry in entries {
        collection.push(entry);
    }
    Ok(())
}

/// All regular files below `root`, keyed by their `/`-separated relative path
fn walk(root: &Path, ignore: &[glob::Pattern]) -> Result<BTreeMap<String, PathBuf>> {
    let patterns = ignore.to_vec();
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .filter_entry(move |e| {
            let name = e.file_name().to_string_lossy();
            !patterns.iter().any(|p| p.matches(&name))
        })
        .build();

    let mut files = BTreeMap::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk '{}'", root.display()))?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let name = rel
            .components()
            .map(|c| {
                c.as_os_str()
                    .to_str()
                    .ok_or_else(|| anyhow::anyhow!("Non UTF-8 path: {}", entry.path().display()))
            })
            .collect::<Result<Vec<_>>>()?
            .join("/");
        files.insert(name, entry.path().to_path_buf());
    }
    Ok(files)
}

fn path_str(path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Non UTF-8 path: {}", path.display()))
}

fn hash_file(path: &Path) -> Result<[u8; 32]> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    Ok(Sha256::digest(&data).into())
}

fn text_line_count(path: &str) -> Result<usize> {
    if !is_text_path(path) {
        return Ok(0);
    }
    Ok(count_lines(&read_text(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn kinds(c: &Collection) -> Vec<(String, &'static str)> {
        c.iter().map(|e| (e.name.clone(), e.change.symbol())).collect()
    }

    #[test]
    fn classifies_added_removed_changed_and_renamed() {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        write(left.path(), "same.txt", "x\n");
        write(right.path(), "same.txt", "x\n");
        write(left.path(), "src/edit.rs", "a\nb\n");
        write(right.path(), "src/edit.rs", "a\nc\n");
        write(left.path(), "gone.txt", "1\n2\n3\n");
        write(right.path(), "new.txt", "n\n");
        write(left.path(), "old_name.txt", "moved content\n");
        write(right.path(), "new_name.txt", "moved content\n");

        let c = build(
            left.path().to_str().unwrap(),
            right.path().to_str().unwrap(),
            &[],
        )
        .unwrap();

        assert_eq!(
            kinds(&c),
            vec![
                ("gone.txt".to_string(), "-"),
                ("new.txt".to_string(), "+"),
                ("old_name.txt → new_name.txt".to_string(), "R"),
                ("src/edit.rs".to_string(), "~"),
            ]
        );
        assert_eq!(c.added_count, 1);
        assert_eq!(c.removed_count, 3);

        let edit = c.iter().find(|e| e.name == "src/edit.rs").unwrap();
        assert!(edit.path.ends_with("edit.rs"));
        assert!(edit.counterpart().unwrap().starts_with(right.path().to_str().unwrap()));
    }

    #[test]
    fn binary_added_files_do_not_count_lines() {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        fs::write(right.path().join("blob.bin"), [0u8, 1, 2, b'\n', 3]).unwrap();

        let c = build(
            left.path().to_str().unwrap(),
            right.path().to_str().unwrap(),
            &[],
        )
        .unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c.added_count, 0);
    }

    #[test]
    fn ignore_patterns_skip_files_and_directories() {
        let left = tempfile::tempdir().unwrap();
        let right = tempfile::tempdir().unwrap();
        write(right.path(), "keep.txt", "k\n");
        write(right.path(), "cache.pyc", "junk\n");
        write(right.path(), "target/out.txt", "junk\n");

        let ignore = vec![
            glob::Pattern::new("*.pyc").unwrap(),
            glob::Pattern::new("target").unwrap(),
        ];
        let c = build(
            left.path().to_str().unwrap(),
            right.path().to_str().unwrap(),
            &ignore,
        )
        .unwrap();
        assert_eq!(kinds(&c), vec![("keep.txt".to_string(), "+")]);
    }

    #[test]
    fn two_files_compare_as_a_single_pair() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/conf.ini", "x=1\n");
        write(dir.path(), "b/conf.ini", "x=2\n");
        let a = dir.path().join("a/conf.ini");
        let b = dir.path().join("b/conf.ini");

        let c = build(a.to_str().unwrap(), b.to_str().unwrap(), &[]).unwrap();
        assert_eq!(kinds(&c), vec![("conf.ini".to_string(), "~")]);

        let same = build(a.to_str().unwrap(), a.to_str().unwrap(), &[]).unwrap();
        assert!(same.is_empty());
    }

    #[test]
    fn file_against_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "f.txt", "x\n");
        let f = dir.path().join("f.txt");
        assert!(build(f.to_str().unwrap(), dir.path().to_str().unwrap(), &[]).is_err());
    }
}
