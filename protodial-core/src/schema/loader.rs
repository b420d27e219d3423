use super::Registry;
use prost_reflect::{DescriptorError, DescriptorPool, FileDescriptor};
use prost_types::{FileDescriptorProto, FileDescriptorSet};
use protox::Compiler;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading a schema from `.proto` sources.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Could not resolve '{}' against import paths {import_paths:?}", file.display())]
    Resolution {
        file: PathBuf,
        import_paths: Vec<PathBuf>,
    },
    #[error("Failed to parse proto sources: '{0}'")]
    Parse(#[from] protox::Error),
    #[error("Invalid descriptor set: '{0}'")]
    Descriptor(#[from] DescriptorError),
}

/// A proto file located inside one of the import roots.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedFile {
    /// Canonical import root containing the file.
    root: PathBuf,
    /// Canonical path on disk.
    path: PathBuf,
    /// Import-relative name, always `/` separated (e.g. `foo/bar.proto`).
    name: String,
}

/// Loads `.proto` files into a [`Registry`].
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    import_paths: Vec<PathBuf>,
}

impl SchemaLoader {
    pub fn new(import_paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            import_paths: import_paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn import_paths(&self) -> &[PathBuf] {
        &self.import_paths
    }

    /// Parses `proto_file` and all of its transitive imports and builds a new [`Registry`].
    ///
    /// The file must live under one of the import paths. Imports that the given paths do
    /// not satisfy are looked up in the file's own directory and in the import root that
    /// resolved it, in that order, after the explicit paths.
    pub fn load(&self, proto_file: &Path) -> Result<Registry, LoadError> {
        let resolved = resolve(&self.import_paths, proto_file)?;

        tracing::debug!(
            file = %resolved.path.display(),
            name = %resolved.name,
            root = %resolved.root.display(),
            "Resolved proto file"
        );

        let includes = include_paths(&self.import_paths, &resolved);

        let mut compiler = Compiler::new(&includes)?;
        compiler.include_imports(true);
        compiler.open_file(&resolved.path)?;

        let pool = compiler.descriptor_pool();
        let root = pool
            .get_file_by_name(&resolved.name)
            .ok_or_else(|| LoadError::Resolution {
                file: proto_file.to_path_buf(),
                import_paths: includes.clone(),
            })?;

        let fd_set = flatten(&root);

        tracing::debug!(files = fd_set.file.len(), "Flattened descriptor set");

        let pool = DescriptorPool::from_file_descriptor_set(fd_set.clone())?;

        Ok(Registry::new(pool, fd_set))
    }
}

/// Shorthand for `SchemaLoader::new(import_paths).load(proto_file)`.
pub fn load_registry(import_paths: &[PathBuf], proto_file: &Path) -> Result<Registry, LoadError> {
    SchemaLoader::new(import_paths.iter().cloned()).load(proto_file)
}

fn resolve(import_paths: &[PathBuf], proto_file: &Path) -> Result<ResolvedFile, LoadError> {
    let not_found = || LoadError::Resolution {
        file: proto_file.to_path_buf(),
        import_paths: import_paths.to_vec(),
    };

    let roots: Vec<PathBuf> = if import_paths.is_empty() {
        let parent = match proto_file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        vec![parent]
    } else {
        import_paths.to_vec()
    };

    let roots: Vec<PathBuf> = roots
        .iter()
        .filter_map(|root| root.canonicalize().ok())
        .collect();

    // A relative file name is first interpreted as an import name.
    if proto_file.is_relative() {
        for root in &roots {
            let candidate = root.join(proto_file);
            if !candidate.is_file() {
                continue;
            }
            if let Some(resolved) = candidate
                .canonicalize()
                .ok()
                .and_then(|path| within(root, path))
            {
                return Ok(resolved);
            }
        }
    }

    let path = proto_file.canonicalize().map_err(|_| not_found())?;
    if !path.is_file() {
        return Err(not_found());
    }

    roots
        .iter()
        .find_map(|root| within(root, path.clone()))
        .ok_or_else(not_found)
}

fn within(root: &Path, path: PathBuf) -> Option<ResolvedFile> {
    let relative = path.strip_prefix(root).ok()?;
    let name = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    Some(ResolvedFile {
        root: root.to_path_buf(),
        path,
        name,
    })
}

/// Explicit import paths first, then the inferred roots.
fn include_paths(import_paths: &[PathBuf], resolved: &ResolvedFile) -> Vec<PathBuf> {
    let mut includes: Vec<PathBuf> = Vec::new();

    let explicit = import_paths.iter().filter_map(|p| p.canonicalize().ok());
    let inferred = [
        Some(resolved.root.clone()),
        resolved.path.parent().map(Path::to_path_buf),
    ]
    .into_iter()
    .flatten();

    for path in explicit.chain(inferred) {
        if !includes.contains(&path) {
            includes.push(path);
        }
    }

    includes
}

/// Collects `root` and its transitive dependencies, each file exactly once.
///
/// Dependencies are emitted before the files importing them.
pub(crate) fn flatten(root: &FileDescriptor) -> FileDescriptorSet {
    let mut seen = HashSet::new();
    let mut file = Vec::new();
    walk(root, &mut seen, &mut file);
    FileDescriptorSet { file }
}

fn walk(fd: &FileDescriptor, seen: &mut HashSet<String>, out: &mut Vec<FileDescriptorProto>) {
    if !seen.insert(fd.name().to_string()) {
        return;
    }

    for dependency in fd.dependencies() {
        walk(&dependency, seen, out);
    }

    out.push(fd.file_descriptor_proto().clone());
}
