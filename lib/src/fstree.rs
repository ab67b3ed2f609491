use std::sync::Arc;
use std::path::Path;
use std::{fs, fmt};

use rustc_hash::FxHashMap;

use crate::error::Result;

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct EntryId(pub(crate) usize);

/// An in-memory snapshot of a directory tree.
///
/// Entries are discovered in parallel but stored in a deterministic order:
/// siblings are sorted by file name. [`FsTree::build()`] skips hidden (dot)
/// files and directories entirely; [`FsTree::build_all()`] keeps them.
#[derive(Debug)]
pub struct FsTree {
    entries: Vec<Entry>,
    map: FxHashMap<Arc<Path>, EntryId>,
}

#[derive(Debug)]
pub struct Entry {
    pub id: EntryId,
    pub path: Arc<Path>,
    pub metadata: fs::Metadata,
    pub file_name: String,
    pub parent: Option<EntryId>,
    pub children: Vec<EntryId>,
    pub depth: usize,
}

#[derive(Default, Debug)]
struct FsMetadata(Option<fs::Metadata>);

impl FsTree {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            entries: vec![],
        }
    }

    /// Walks `root`, skipping hidden entries. Fails if `root` doesn't exist
    /// or can't be read.
    pub fn build<P: AsRef<Path>>(root: P) -> Result<Self> {
        Self::walk(root.as_ref(), true)
    }

    /// Like [`FsTree::build()`] but keeps hidden entries.
    pub fn build_all<P: AsRef<Path>>(root: P) -> Result<Self> {
        Self::walk(root.as_ref(), false)
    }

    fn walk(root: &Path, skip_hidden: bool) -> Result<Self> {
        use jwalk::WalkDirGeneric;

        let walker = WalkDirGeneric::<FsMetadata>::new(root)
            .sort(true)
            .skip_hidden(skip_hidden)
            .follow_links(true)
            .process_read_dir(|_, _, _, entries| {
                entries.iter_mut()
                    .filter_map(|e| e.as_mut().ok())
                    .for_each(|e| e.client_state = FsMetadata(e.metadata().ok()))
            });

        let mut tree = FsTree::new();
        for entry in walker.into_iter() {
            match entry {
                Ok(e) if e.depth == 0 => match fs::metadata(root) {
                    Ok(metadata) => { tree.insert(e, metadata); },
                    Err(error) => return Err(error.into()),
                },
                Ok(mut e) => match e.client_state.0.take() {
                    Some(metadata) => { tree.insert(e, metadata); },
                    None => tracing::debug!(path = %e.path().display(), "skipping unreadable entry"),
                },
                Err(error) if error.depth() == 0 => {
                    return err! {
                        "failed to read directory",
                        "search root" => root.display(),
                        error,
                    }
                }
                Err(error) => tracing::debug!(%error, "skipping unreadable entry"),
            }
        }

        if tree.len() == 0 {
            return err! {
                "directory does not exist or cannot be read",
                "search root" => root.display(),
            }
        }

        if !tree.root().metadata.is_dir() {
            return err! {
                "path is not a directory",
                "search root" => root.display(),
            }
        }

        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn root(&self) -> &Entry {
        &self[self.root_id()]
    }

    pub fn root_id(&self) -> EntryId {
        EntryId(0)
    }

    #[inline]
    pub fn get<R, P>(&self, root: R, path: P) -> Option<&Entry>
        where R: Into<Option<EntryId>>, P: AsRef<Path>
    {
        self.get_id(root.into(), path.as_ref()).map(|id| &self[id])
    }

    /// Like [`FsTree::get()`] but only returns regular files.
    pub fn get_file<R, P>(&self, root: R, path: P) -> Option<&Entry>
        where R: Into<Option<EntryId>>, P: AsRef<Path>
    {
        self.get(root, path).filter(|e| e.metadata.is_file())
    }

    pub fn get_id<R, P>(&self, root: R, path: P) -> Option<EntryId>
        where R: Into<Option<EntryId>>, P: AsRef<Path>
    {
        let root = root.into().unwrap_or(self.root_id());
        let full_path = self[root].path.join(path.as_ref());
        self.map.get(&*full_path).cloned()
    }

    /// The direct children of `id`, in file name order.
    pub fn children(&self, id: EntryId) -> impl Iterator<Item = &Entry> + '_ {
        self[id].children.iter().map(move |&child| &self[child])
    }

    /// Visits `root` and its descendants, parents first. Descends into an
    /// entry's children only if `progress` returns `true` for it.
    pub fn depth_first_search<'a, F>(&'a self, root: EntryId, mut progress: F)
        where F: FnMut(&'a Entry) -> bool
    {
        fn _dfs<'a, F>(tree: &'a FsTree, root: EntryId, progress: &mut F)
            where F: FnMut(&'a Entry) -> bool
        {
            let entry = &tree[root];
            if progress(entry) {
                for &child in &entry.children {
                    _dfs(tree, child, progress)
                }
            }
        }

        _dfs(self, root, &mut progress)
    }

    /// All regular files under `root`, parents before children.
    pub fn files(&self, root: EntryId) -> Vec<&Entry> {
        let mut files = vec![];
        self.depth_first_search(root, |entry| {
            if entry.metadata.is_file() {
                files.push(entry);
            }

            true
        });

        files
    }

    fn insert(&mut self, entry: jwalk::DirEntry<FsMetadata>, metadata: fs::Metadata) -> EntryId {
        let entry = Entry {
            id: EntryId(self.entries.len()),
            path: Arc::from(entry.path().into_boxed_path()),
            metadata,
            file_name: entry.file_name.to_string_lossy().into_owned(),
            parent: self.map.get(&entry.parent_path).cloned(),
            children: vec![],
            depth: entry.depth,
        };

        self.map.insert(entry.path.clone(), entry.id);
        if let Some(parent) = entry.parent {
            self.entries[parent.0].children.push(entry.id);
        }

        let id = entry.id;
        self.entries.push(entry);
        id
    }
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }

    /// Path relative to `other`. `self` must be a descendant of `other`.
    pub fn path_relative_to(&self, other: &Entry) -> Option<&Path> {
        self.path.strip_prefix(&other.path).ok()
    }
}

impl jwalk::ClientState for FsMetadata {
    type ReadDirState = ();
    type DirEntryState = Self;
}

impl std::ops::Index<EntryId> for FsTree {
    type Output = Entry;

    fn index(&self, index: EntryId) -> &Self::Output {
        &self.entries[index.0]
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
