use crate::config::{LoaderKind, SplitConfig};
use crate::error::{Result, SplitError};
use crate::imports::{self, PackageScope};
use crate::syntax::{self, SyntaxTree};
use ignore::WalkBuilder;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Files belonging to one package (or one test variant of it)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPackage {
    pub id: String,
    pub files: Vec<PathBuf>,
}

/// Source of package file lists
pub trait PackageLoader {
    /// Load every package matched by `pattern`, interpreted relative to `dir`,
    /// test-only files included
    fn load(&self, pattern: &str, dir: &Path) -> Result<Vec<LoadedPackage>>;

    /// Package names declared by `paths`, for whichever paths the loader can
    /// answer; best effort
    fn import_names(&self, _paths: &[String], _dir: &Path) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// The target file located inside its package
#[derive(Debug)]
pub struct ResolvedSource {
    pub package_id: String,
    pub tree: SyntaxTree,
    /// Every absolute path inspected, in load order
    pub seen: Vec<PathBuf>,
    /// Package-level names and known import names for import pruning
    pub scope: PackageScope,
}

/// Build the loader selected by the configuration
pub fn loader_for(config: &SplitConfig) -> Box<dyn PackageLoader> {
    match config.loader {
        LoaderKind::Auto => Box::new(AutoLoader {
            go_list: GoListLoader::new(&config.go_binary),
        }),
        LoaderKind::GoList => Box::new(GoListLoader::new(&config.go_binary)),
        LoaderKind::Dir => Box::new(DirectoryLoader),
    }
}

/// Load the package and find the syntax tree of `file` among its sources
pub fn resolve(loader: &dyn PackageLoader, pattern: &str, file: &Path) -> Result<ResolvedSource> {
    let target = canonical(file)?;
    let dir = target
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| SplitError::load(format!("{} has no parent directory", target.display())))?;

    let packages = loader.load(pattern, &dir)?;

    let mut seen = Vec::new();
    let mut seen_set = BTreeSet::new();
    for package in &packages {
        for candidate in &package.files {
            let absolute = canonical(candidate)?;
            if seen_set.insert(absolute.clone()) {
                seen.push(absolute.clone());
            }
            if absolute == target {
                log::debug!("found {} in package {}", target.display(), package.id);
                let tree = SyntaxTree::parse_file(&target)
                    .map_err(|e| SplitError::load(e.to_string()))?;
                let scope = package_scope(loader, &tree, package, &dir);
                return Ok(ResolvedSource {
                    package_id: package.id.clone(),
                    tree,
                    seen,
                    scope,
                });
            }
        }
    }

    Err(SplitError::NotFound { target, seen })
}

/// Names declared across the target's package plus whatever the loader
/// knows about the target's imports
fn package_scope(
    loader: &dyn PackageLoader,
    tree: &SyntaxTree,
    package: &LoadedPackage,
    dir: &Path,
) -> PackageScope {
    let mut declared: BTreeSet<String> = tree
        .decls()
        .flat_map(|(_, d)| d.declares.iter().cloned())
        .collect();
    for file in &package.files {
        if canonical(file).ok().as_deref() == Some(tree.path()) {
            continue;
        }
        match SyntaxTree::parse_file(file) {
            Ok(sibling) => declared.extend(sibling.decls().flat_map(|(_, d)| d.declares.iter().cloned())),
            Err(e) => log::debug!("skipping {} for package scope: {e}", file.display()),
        }
    }

    let external: Vec<String> = tree
        .imports()
        .iter()
        .map(|spec| spec.path.clone())
        .filter(|path| !imports::is_standard(path))
        .collect();
    let import_names = if external.is_empty() {
        BTreeMap::new()
    } else {
        loader.import_names(&external, dir)
    };

    PackageScope {
        declared,
        import_names,
    }
}

/// Canonical path when the file exists, plain absolute path otherwise
fn canonical(path: &Path) -> Result<PathBuf> {
    match std::fs::canonicalize(path) {
        Ok(path) => Ok(path),
        Err(_) => std::path::absolute(path).map_err(|e| SplitError::io(path, e)),
    }
}

/// Asks the Go toolchain via `go list -json -test`
#[derive(Debug, Clone)]
pub struct GoListLoader {
    go: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListPackage {
    import_path: String,
    dir: PathBuf,
    #[serde(default)]
    go_files: Vec<String>,
    #[serde(default)]
    cgo_files: Vec<String>,
    #[serde(default)]
    test_go_files: Vec<String>,
    #[serde(default)]
    x_test_go_files: Vec<String>,
}

impl GoListLoader {
    pub fn new(go: impl Into<PathBuf>) -> Self {
        Self { go: go.into() }
    }

    fn run(&self, pattern: &str, dir: &Path) -> io::Result<Output> {
        Command::new(&self.go)
            .args(["list", "-json", "-test", "--", pattern])
            .current_dir(dir)
            .output()
    }

    fn parse_output(output: Output) -> Result<Vec<LoadedPackage>> {
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SplitError::load(format!(
                "go list failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        let stream = serde_json::Deserializer::from_slice(&output.stdout).into_iter::<GoListPackage>();
        let mut packages = Vec::new();
        for record in stream {
            let record =
                record.map_err(|e| SplitError::load(format!("invalid go list output: {e}")))?;
            let files = record
                .go_files
                .iter()
                .chain(&record.cgo_files)
                .chain(&record.test_go_files)
                .chain(&record.x_test_go_files)
                .map(|name| record.dir.join(name))
                .collect();
            packages.push(LoadedPackage {
                id: record.import_path,
                files,
            });
        }
        Ok(packages)
    }

    fn list_names(&self, paths: &[String], dir: &Path) -> io::Result<Output> {
        Command::new(&self.go)
            .args(["list", "-e", "-f", "{{.ImportPath}} {{.Name}}", "--"])
            .args(paths)
            .current_dir(dir)
            .output()
    }

    /// `import/path name` lines; packages that failed to load have no name
    fn parse_names(stdout: &[u8]) -> BTreeMap<String, String> {
        String::from_utf8_lossy(stdout)
            .lines()
            .filter_map(|line| line.trim().split_once(' '))
            .filter(|(_, name)| !name.is_empty())
            .map(|(path, name)| (path.to_string(), name.to_string()))
            .collect()
    }
}

impl PackageLoader for GoListLoader {
    fn load(&self, pattern: &str, dir: &Path) -> Result<Vec<LoadedPackage>> {
        let output = self
            .run(pattern, dir)
            .map_err(|e| SplitError::load(format!("running {}: {e}", self.go.display())))?;
        Self::parse_output(output)
    }

    fn import_names(&self, paths: &[String], dir: &Path) -> BTreeMap<String, String> {
        match self.list_names(paths, dir) {
            Ok(output) if output.status.success() => Self::parse_names(&output.stdout),
            Ok(output) => {
                log::warn!(
                    "go list could not name imports ({}): {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                BTreeMap::new()
            }
            Err(e) => {
                log::debug!("running {} for import names: {e}", self.go.display());
                BTreeMap::new()
            }
        }
    }
}

/// `go list` when the toolchain is installed, a directory scan otherwise
#[derive(Debug, Clone)]
pub struct AutoLoader {
    go_list: GoListLoader,
}

impl PackageLoader for AutoLoader {
    fn import_names(&self, paths: &[String], dir: &Path) -> BTreeMap<String, String> {
        self.go_list.import_names(paths, dir)
    }

    fn load(&self, pattern: &str, dir: &Path) -> Result<Vec<LoadedPackage>> {
        match self.go_list.run(pattern, dir) {
            Ok(output) => GoListLoader::parse_output(output),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!(
                    "{} not found, scanning directories instead of running go list",
                    self.go_list.go.display()
                );
                DirectoryLoader.load(pattern, dir)
            }
            Err(e) => Err(SplitError::load(format!(
                "running {}: {e}",
                self.go_list.go.display()
            ))),
        }
    }
}

/// Reads packages straight from disk, one directory per package
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryLoader;

impl DirectoryLoader {
    /// Directories named by a pattern: `dir/...` walks, an existing directory
    /// is taken as is, anything else (an import path) means `dir` itself
    fn package_dirs(pattern: &str, dir: &Path) -> Result<(Vec<PathBuf>, bool)> {
        if let Some(root) = pattern.strip_suffix("...") {
            let root = root.trim_end_matches('/');
            let root = if root.is_empty() { dir.to_path_buf() } else { dir.join(root) };
            return Ok((Self::walk(&root)?, true));
        }

        let candidate = dir.join(pattern);
        if !pattern.is_empty() && candidate.is_dir() {
            return Ok((vec![candidate], false));
        }
        Ok((vec![dir.to_path_buf()], false))
    }

    fn walk(root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(SplitError::load(format!("{} is not a directory", root.display())));
        }

        let mut dirs = Vec::new();
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(true)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .sort_by_file_name(|a, b| a.cmp(b));
        let root_owned = root.to_path_buf();
        builder.filter_entry(move |entry| {
            entry.path() == root_owned || !Self::is_skipped_dir(entry.file_name())
        });

        for result in builder.build() {
            let entry = result.map_err(|e| SplitError::load(format!("walking {}: {e}", root.display())))?;
            if entry.file_type().is_some_and(|t| t.is_dir()) {
                dirs.push(entry.into_path());
            }
        }
        Ok(dirs)
    }

    fn is_skipped_dir(name: &std::ffi::OsStr) -> bool {
        let name = name.to_string_lossy();
        name == "testdata" || name == "vendor" || name.starts_with('_') || name.starts_with('.')
    }

    fn go_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(dir).map_err(|e| SplitError::load(format!("{}: {e}", dir.display())))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SplitError::load(format!("{}: {e}", dir.display())))?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.ends_with(".go") || name.starts_with('.') || name.starts_with('_') {
                continue;
            }
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Group one directory's files into the package and its external test package
    fn load_dir(dir: &Path) -> Result<Option<Vec<LoadedPackage>>> {
        let files = Self::go_files(dir)?;
        if files.is_empty() {
            return Ok(None);
        }

        let mut named = Vec::with_capacity(files.len());
        for file in files {
            let source = std::fs::read_to_string(&file)
                .map_err(|e| SplitError::load(format!("{}: {e}", file.display())))?;
            let package = syntax::package_name(&source).ok_or_else(|| {
                SplitError::load(format!("{}: expected package clause", file.display()))
            })?;
            let is_test = file.to_string_lossy().ends_with(syntax::TEST_FILE_SUFFIX);
            named.push((file, package, is_test));
        }

        let base = Self::base_package(dir, &named)?;
        let external = format!("{base}_test");

        let mut internal_files = Vec::new();
        let mut external_files = Vec::new();
        for (file, package, is_test) in named {
            if package == base {
                internal_files.push(file);
            } else if is_test && package == external {
                external_files.push(file);
            } else {
                return Err(SplitError::load(format!(
                    "found packages {base} and {package} ({}) in {}",
                    file.display(),
                    dir.display()
                )));
            }
        }

        let id = dir.display().to_string();
        let mut packages = vec![LoadedPackage {
            id: id.clone(),
            files: internal_files,
        }];
        if !external_files.is_empty() {
            packages.push(LoadedPackage {
                id: format!("{id} [{external}]"),
                files: external_files,
            });
        }
        Ok(Some(packages))
    }

    /// Name declared by the non-test files, or by the test files when there are none
    fn base_package(dir: &Path, named: &[(PathBuf, String, bool)]) -> Result<String> {
        let mut names: BTreeSet<&str> = named
            .iter()
            .filter(|(_, _, is_test)| !is_test)
            .map(|(_, package, _)| package.as_str())
            .collect();
        if names.is_empty() {
            names = named
                .iter()
                .map(|(_, package, _)| package.strip_suffix("_test").unwrap_or(package))
                .collect();
        }

        let mut names = names.into_iter();
        match (names.next(), names.next()) {
            (Some(base), None) => Ok(base.to_string()),
            (Some(a), Some(b)) => Err(SplitError::load(format!(
                "found packages {a} and {b} in {}",
                dir.display()
            ))),
            (None, _) => Err(SplitError::load(format!("no Go files in {}", dir.display()))),
        }
    }
}

impl PackageLoader for DirectoryLoader {
    fn load(&self, pattern: &str, dir: &Path) -> Result<Vec<LoadedPackage>> {
        let (dirs, recursive) = Self::package_dirs(pattern, dir)?;
        let mut packages = Vec::new();
        for package_dir in &dirs {
            match Self::load_dir(package_dir)? {
                Some(found) => packages.extend(found),
                None if !recursive => {
                    return Err(SplitError::load(format!(
                        "no Go files in {}",
                        package_dir.display()
                    )));
                }
                None => {}
            }
        }
        log::debug!(
            "loaded {} package(s) for {pattern:?} from {} director(ies)",
            packages.len(),
            dirs.len()
        );
        Ok(packages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_resolve_finds_target_among_test_variants() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        write(root, "p.go", "package p\n");
        write(root, "p_test.go", "package p\n\nfunc TestA() {}\n");
        let target = write(root, "x_test.go", "package p_test\n\nfunc TestB() {}\n");

        let resolved = resolve(&DirectoryLoader, ".", &target).unwrap();
        assert_eq!(resolved.tree.package(), "p_test");
        assert!(resolved.package_id.ends_with("[p_test]"));
        assert_eq!(resolved.seen.len(), 3);
    }

    #[test]
    fn test_resolve_reports_every_seen_path() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        write(root, "p.go", "package p\n");
        write(root, "p_test.go", "package p\n");

        let err = resolve(&DirectoryLoader, ".", &root.join("missing_test.go")).unwrap_err();
        match err {
            SplitError::NotFound { target, seen } => {
                assert!(target.ends_with("missing_test.go"));
                let names: Vec<_> = seen
                    .iter()
                    .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
                    .collect();
                assert_eq!(names, vec!["p.go", "p_test.go"]);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_mixed_packages_are_a_load_error() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        write(root, "a.go", "package a\n");
        let target = write(root, "b_test.go", "package b\n");

        let err = resolve(&DirectoryLoader, ".", &target).unwrap_err();
        assert!(matches!(err, SplitError::LoadError(_)), "{err:?}");
    }

    #[test]
    fn test_target_with_syntax_error_is_a_load_error() {
        let temp = tempdir().unwrap();
        let target = write(temp.path(), "a_test.go", "package a\n\nfunc TestA( {\n");

        let err = resolve(&DirectoryLoader, ".", &target).unwrap_err();
        assert!(matches!(err, SplitError::LoadError(_)), "{err:?}");
    }

    #[test]
    fn test_recursive_pattern_skips_testdata_and_hidden() {
        let temp = tempdir().unwrap();
        let root = &temp.path().join("module");
        write(root, "a.go", "package a\n");
        write(root, "sub/b.go", "package b\n");
        write(root, "testdata/c.go", "package c\n");
        write(root, ".hidden/d.go", "package d\n");
        write(root, "_skip/e.go", "package e\n");

        let packages = DirectoryLoader.load("./...", root).unwrap();
        let files: Vec<_> = packages
            .iter()
            .flat_map(|p| p.files.iter())
            .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(files, vec!["a.go", "b.go"]);
    }

    #[test]
    fn test_import_path_pattern_scans_target_dir() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        write(root, "a_test.go", "package a\n");

        let packages = DirectoryLoader.load("github.com/acme/a", root).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].files.len(), 1);
    }

    #[test]
    fn test_go_list_output_is_streamed() {
        let stdout = br#"{"ImportPath":"example.com/p","Dir":"/src/p","GoFiles":["p.go"],"TestGoFiles":["p_test.go"]}
{"ImportPath":"example.com/p_test [example.com/p.test]","Dir":"/src/p","XTestGoFiles":["x_test.go"]}"#;
        let output = Output {
            status: success_status(),
            stdout: stdout.to_vec(),
            stderr: Vec::new(),
        };
        let packages = GoListLoader::parse_output(output).unwrap();
        assert_eq!(packages.len(), 2);
        assert_eq!(
            packages[0].files,
            vec![PathBuf::from("/src/p/p.go"), PathBuf::from("/src/p/p_test.go")]
        );
        assert_eq!(packages[1].files, vec![PathBuf::from("/src/p/x_test.go")]);
    }

    #[test]
    fn test_go_list_names_skip_unloadable_packages() {
        let stdout = b"k8s.io/api/core/v1 v1\nexample.com/missing \ngopkg.in/yaml.v3 yaml\n";
        let names = GoListLoader::parse_names(stdout);
        assert_eq!(names.len(), 2);
        assert_eq!(names["k8s.io/api/core/v1"], "v1");
        assert_eq!(names["gopkg.in/yaml.v3"], "yaml");
    }

    #[test]
    fn test_resolve_collects_package_level_names() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        write(root, "p.go", "package p\n\nvar log = newLogger()\n\ntype (\n\tA int\n\tB int\n)\n");
        write(root, "x_test.go", "package p_test\n\nvar other = 1\n");
        let target = write(root, "p_test.go", "package p\n\nfunc helper() {}\n\nfunc TestA() {}\n");

        let resolved = resolve(&DirectoryLoader, ".", &target).unwrap();
        let declared: Vec<_> = resolved.scope.declared.iter().cloned().collect();
        assert_eq!(declared, vec!["A", "B", "TestA", "helper", "log"]);
        assert!(resolved.scope.import_names.is_empty());
    }

    #[test]
    fn test_missing_go_binary_is_a_load_error() {
        let temp = tempdir().unwrap();
        let loader = GoListLoader::new("/nonexistent/bin/go");
        let err = loader.load(".", temp.path()).unwrap_err();
        assert!(matches!(err, SplitError::LoadError(_)));
    }

    #[test]
    fn test_auto_loader_falls_back_without_go() {
        let temp = tempdir().unwrap();
        write(temp.path(), "a_test.go", "package a\n");
        let loader = AutoLoader {
            go_list: GoListLoader::new("/nonexistent/bin/go"),
        };
        let packages = loader.load(".", temp.path()).unwrap();
        assert_eq!(packages.len(), 1);
    }

    #[cfg(unix)]
    fn success_status() -> std::process::ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(0)
    }

    #[cfg(windows)]
    fn success_status() -> std::process::ExitStatus {
        use std::os::windows::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(0)
    }
}
