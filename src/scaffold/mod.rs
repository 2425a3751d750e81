//! Materializes a project skeleton of directories and empty placeholder files.

pub mod manifest;

use std::fs::{self, File};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use crate::error::{Error, Result};

pub use manifest::{DEFAULT_PROJECT_NAME, Manifest};

#[derive(Clone, Copy, Debug, Default)]
pub struct GenerateOptions {
    /// Report what would happen without touching the filesystem.
    pub dry_run: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The file was missing or zero-length and is now an empty file.
    Created,
    /// The file already had content and was left alone.
    Skipped,
}

#[derive(Debug, Default)]
pub struct Report {
    pub directories: Vec<Utf8PathBuf>,
    pub files: Vec<(Utf8PathBuf, Outcome)>,
}

impl Report {
    pub fn created(&self) -> usize {
        self.count(Outcome::Created)
    }

    pub fn skipped(&self) -> usize {
        self.count(Outcome::Skipped)
    }

    fn count(&self, outcome: Outcome) -> usize {
        self.files.iter().filter(|(_, o)| *o == outcome).count()
    }
}

/// Create every manifest entry under `root`.
///
/// Existing non-empty files are never modified. The first filesystem error
/// aborts the remaining entries.
pub fn generate(root: &Utf8Path, manifest: &Manifest, options: GenerateOptions) -> Result<Report> {
    let mut report = Report::default();
    let verb = if options.dry_run { "Would create" } else { "Created" };

    for entry in manifest.entries() {
        let relative = Utf8Path::new(entry);
        let filename = relative.file_name().unwrap_or(entry.as_str());
        let target = root.join(relative);

        if let Some(dir) = relative.parent().filter(|dir| !dir.as_str().is_empty()) {
            let dir_path = root.join(dir);
            if !options.dry_run {
                fs::create_dir_all(&dir_path).map_err(|source| Error::io(&dir_path, source))?;
            }
            info!(path = %dir_path, "{} directory {} for the file {}", verb, dir, filename);
            if !report.directories.contains(&dir_path) {
                report.directories.push(dir_path);
            }
        }

        let outcome = if needs_placeholder(&target)? {
            if !options.dry_run {
                File::create(&target).map_err(|source| Error::io(&target, source))?;
            }
            info!(path = %target, "{} file {}", verb, relative);
            Outcome::Created
        } else {
            info!(path = %target, "{} already exists", filename);
            Outcome::Skipped
        };
        report.files.push((target, outcome));
    }

    Ok(report)
}

/// Missing and zero-length files get (re)written; anything else is kept.
fn needs_placeholder(path: &Utf8Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len() == 0),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(source) => Err(Error::io(path, source)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    use tempfile::TempDir;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn logged<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        (out, buffer.contents())
    }

    fn scratch() -> (TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    fn small_manifest() -> Manifest {
        Manifest::new(
            "demo",
            vec!["a/b/file1.txt".to_owned(), "file2.txt".to_owned()],
        )
        .unwrap()
    }

    #[test]
    fn creates_directories_and_empty_files() {
        let (_guard, root) = scratch();
        let report = generate(&root, &small_manifest(), GenerateOptions::default()).unwrap();

        assert!(root.join("a/b").is_dir());
        assert_eq!(fs::read(root.join("a/b/file1.txt")).unwrap(), b"");
        assert_eq!(fs::read(root.join("file2.txt")).unwrap(), b"");
        assert_eq!(report.created(), 2);
        assert_eq!(report.skipped(), 0);
        assert_eq!(report.directories, vec![root.join("a/b")]);
    }

    #[test]
    fn rerun_preserves_non_empty_files() {
        let (_guard, root) = scratch();
        let manifest = small_manifest();
        generate(&root, &manifest, GenerateOptions::default()).unwrap();

        fs::write(root.join("file2.txt"), "hello").unwrap();
        fs::remove_file(root.join("a/b/file1.txt")).unwrap();

        let report = generate(&root, &manifest, GenerateOptions::default()).unwrap();
        assert_eq!(fs::read_to_string(root.join("file2.txt")).unwrap(), "hello");
        assert!(root.join("a/b/file1.txt").is_file());
        assert_eq!(
            report.files,
            vec![
                (root.join("a/b/file1.txt"), Outcome::Created),
                (root.join("file2.txt"), Outcome::Skipped),
            ]
        );
    }

    #[test]
    fn zero_length_files_count_as_missing() {
        let (_guard, root) = scratch();
        fs::write(root.join("file2.txt"), "").unwrap();
        let report = generate(&root, &small_manifest(), GenerateOptions::default()).unwrap();
        assert_eq!(report.created(), 2);
    }

    #[test]
    fn dry_run_touches_nothing() {
        let (_guard, root) = scratch();
        let report = generate(&root, &small_manifest(), GenerateOptions { dry_run: true }).unwrap();
        assert_eq!(report.created(), 2);
        assert!(!root.join("a").exists());
        assert!(!root.join("file2.txt").exists());
    }

    #[test]
    fn dry_run_logs_what_would_happen() {
        let (_guard, root) = scratch();
        let manifest = small_manifest();

        let (report, logs) =
            logged(|| generate(&root, &manifest, GenerateOptions { dry_run: true }));
        report.unwrap();
        assert!(logs.contains("Would create directory a/b for the file file1.txt"));
        assert!(logs.contains("Would create file file2.txt"));
        assert!(!logs.contains("Created"));

        let (report, logs) = logged(|| generate(&root, &manifest, GenerateOptions::default()));
        report.unwrap();
        assert!(logs.contains("Created directory a/b"));
        assert!(logs.contains("Created file a/b/file1.txt"));
        assert!(!logs.contains("Would create"));
    }

    #[test]
    fn first_error_aborts_remaining_entries() {
        let (_guard, root) = scratch();
        // A regular file where a directory is expected.
        fs::write(root.join("a"), "not a dir").unwrap();
        let manifest = Manifest::new(
            "demo",
            vec!["a/b/file1.txt".to_owned(), "file2.txt".to_owned()],
        )
        .unwrap();

        let err = generate(&root, &manifest, GenerateOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(!root.join("file2.txt").exists());
    }

    #[test]
    fn datascience_skeleton() {
        let (_guard, root) = scratch();
        let manifest = Manifest::datascience("wine").unwrap();
        let report = generate(&root, &manifest, GenerateOptions::default()).unwrap();

        assert_eq!(report.created(), manifest.entries().len());
        assert!(root.join(".github/workflows/.gitkeep").is_file());
        assert!(root.join("src/wine/components/__init__.py").is_file());
        assert!(root.join("research/research.ipynb").is_file());
        assert!(root.join("Dockerfile").is_file());
    }
}
