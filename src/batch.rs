use std::fmt;
use std::path::PathBuf;

use bitvec::vec::BitVec;

#[cfg(feature = "rayon")]
use rayon::prelude::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

use crate::bind::{bind, directory_prefix};
use crate::compile::compile;
use crate::error::{FsError, RenameError};
use crate::evaluate::evaluate;
use crate::fs::FileSystem;
use crate::value::Value;

/// One file's planned rename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenamePlan {
    pub from: PathBuf,
    pub to: PathBuf,
    /// The evaluated formula, i.e. the file name part of `to`.
    pub new_name: String,
}

/// Compiles `expression` once and evaluates it for every path.
///
/// Each file is bound with its position in `paths` as `$index`. The new name
/// replaces the file name and keeps the directory. Nothing touches the file
/// system; the first failing file fails the whole plan.
pub fn plan_batch(expression: &[Value], paths: &[String]) -> Result<Vec<RenamePlan>, RenameError> {
    let rpn = compile(expression)?;
    tracing::debug!(files = paths.len(), program_len = rpn.len(), "planning batch");

    #[cfg(feature = "rayon")]
    let plans: Result<Vec<RenamePlan>, RenameError> = paths
        .par_iter()
        .enumerate()
        .map(|(index, path)| plan_file(&rpn, index, path))
        .collect();
    #[cfg(not(feature = "rayon"))]
    let plans: Result<Vec<RenamePlan>, RenameError> = paths
        .iter()
        .enumerate()
        .map(|(index, path)| plan_file(&rpn, index, path))
        .collect();

    plans
}

fn plan_file(rpn: &[Value], index: usize, path: &str) -> Result<RenamePlan, RenameError> {
    let new_name = evaluate(&bind(rpn, index as i64, path)?)?;
    if !is_valid_file_name(&new_name) {
        return Err(FsError::InvalidName(new_name).into());
    }
    let to = format!("{}{}", directory_prefix(path), new_name);
    tracing::trace!(index, from = %path, to = %to, "planned rename");
    Ok(RenamePlan {
        from: PathBuf::from(path),
        to: PathBuf::from(to),
        new_name,
    })
}

fn is_valid_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

/// Renames files in plan order, stopping at the first failure.
///
/// Renames that already happened stay in place.
pub fn apply_batch<F: FileSystem + ?Sized>(fs: &F, plans: &[RenamePlan]) -> BatchOutcome {
    let mut outcome = BatchOutcome {
        total: plans.len(),
        renamed: BitVec::repeat(false, plans.len()),
        renaming_started: true,
        error: None,
    };

    for (index, plan) in plans.iter().enumerate() {
        if let Err(err) = rename_file(fs, plan) {
            tracing::warn!(%err, renamed = outcome.renamed_count(), "batch stopped");
            outcome.error = Some(err.into());
            break;
        }
        outcome.renamed.set(index, true);
    }
    outcome
}

fn rename_file<F: FileSystem + ?Sized>(fs: &F, plan: &RenamePlan) -> Result<(), FsError> {
    if !fs.exists(&plan.from) {
        return Err(FsError::SourceMissing(plan.from.clone()));
    }
    if fs.exists(&plan.to) {
        return Err(FsError::DestinationExists(plan.to.clone()));
    }
    fs.rename(&plan.from, &plan.to).map_err(|err| FsError::Io {
        from: plan.from.clone(),
        to: plan.to.clone(),
        message: err.to_string(),
    })
}

/// Plans and applies a batch. Renaming only starts if every file planned.
pub fn run_batch<F: FileSystem + ?Sized>(
    fs: &F,
    expression: &[Value],
    paths: &[String],
) -> BatchOutcome {
    match plan_batch(expression, paths) {
        Ok(plans) => apply_batch(fs, &plans),
        Err(err) => {
            tracing::warn!(%err, "batch failed before renaming");
            BatchOutcome {
                total: paths.len(),
                renamed: BitVec::repeat(false, paths.len()),
                renaming_started: false,
                error: Some(err),
            }
        }
    }
}

/// What a finished batch did.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchOutcome {
    total: usize,
    /// Bit `i` is set once file `i` has been renamed.
    renamed: BitVec,
    renaming_started: bool,
    error: Option<RenameError>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn renamed_count(&self) -> usize {
        self.renamed.count_ones()
    }

    pub fn is_renamed(&self, index: usize) -> bool {
        self.renamed.get(index).map(|bit| *bit).unwrap_or(false)
    }

    pub fn error(&self) -> Option<&RenameError> {
        self.error.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// The status line shown to the user.
impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error, self.renaming_started) {
            (Some(err), false) => write!(f, "{err}"),
            (Some(err), true) => write!(
                f,
                "renamed {} of {} files; {err}",
                self.renamed_count(),
                self.total
            ),
            (None, _) => write!(f, "renamed {} of {} files", self.renamed_count(), self.total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompileError, EvalError};
    use crate::fs::LocalFileSystem;
    use crate::Expression;

    use std::io;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn touch(dir: &Path, names: &[&str]) -> Vec<String> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                std::fs::write(&path, name).unwrap();
                path.to_string_lossy().into_owned()
            })
            .collect()
    }

    fn formula(text: &str) -> Vec<Value> {
        Expression::parse(text).unwrap().values().to_vec()
    }

    #[test]
    fn plan_keeps_directories_and_order() {
        let paths = vec!["/p/one.jpg".to_string(), r"C:\q\two.jpg".to_string()];
        let plans = plan_batch(&formula(r#""IMG_" + $index * #3"#), &paths).unwrap();
        assert_eq!(plans[0].to, PathBuf::from("/p/IMG_000"));
        assert_eq!(plans[1].to, PathBuf::from(r"C:\q\IMG_001"));
        assert_eq!(plans[1].from, PathBuf::from(r"C:\q\two.jpg"));
        assert_eq!(plans[1].new_name, "IMG_001");
    }

    #[test]
    fn plan_rejects_names_with_separators() {
        let paths = vec!["/p/a".to_string()];
        let err = plan_batch(&formula(r#""sub/" + $name"#), &paths).unwrap_err();
        assert_eq!(err, RenameError::Fs(FsError::InvalidName("sub/a".into())));

        let err = plan_batch(&formula(r#""""#), &paths).unwrap_err();
        assert_eq!(err, RenameError::Fs(FsError::InvalidName(String::new())));
    }

    #[test]
    fn renames_every_file() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = touch(tmp.path(), &["a.txt", "b.txt", "c.txt"]);
        let outcome = run_batch(
            &LocalFileSystem::new(),
            &formula(r#"$index + "_" + $name"#),
            &paths,
        );
        assert!(outcome.is_success(), "{outcome}");
        assert_eq!(outcome.to_string(), "renamed 3 of 3 files");
        for (i, name) in ["a.txt", "b.txt", "c.txt"].into_iter().enumerate() {
            assert!(outcome.is_renamed(i));
            let renamed = tmp.path().join(format!("{i}_{name}"));
            assert_eq!(std::fs::read_to_string(renamed).unwrap(), name);
        }
    }

    #[test]
    fn collision_stops_the_batch_without_rollback() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = touch(tmp.path(), &["a", "b", "c"]);
        touch(tmp.path(), &["new1"]);

        let outcome = run_batch(&LocalFileSystem::new(), &formula(r#""new" + $index"#), &paths);

        assert_eq!(outcome.renamed_count(), 1);
        assert!(outcome.is_renamed(0));
        assert!(!outcome.is_renamed(1));
        assert!(!outcome.is_renamed(2));
        assert!(matches!(
            outcome.error(),
            Some(RenameError::Fs(FsError::DestinationExists(_)))
        ));
        assert!(outcome.to_string().starts_with("renamed 1 of 3 files; destination already exists"));

        assert!(tmp.path().join("new0").exists());
        assert!(tmp.path().join("b").exists());
        assert!(tmp.path().join("c").exists());
        assert!(!tmp.path().join("new2").exists());
        assert_eq!(std::fs::read_to_string(tmp.path().join("new1")).unwrap(), "new1");
    }

    /// Lets the first rename through and refuses every later one.
    struct DenyAfterFirst {
        inner: LocalFileSystem,
        renames: AtomicUsize,
    }

    impl FileSystem for DenyAfterFirst {
        fn exists(&self, path: &Path) -> bool {
            self.inner.exists(path)
        }

        fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            if self.renames.fetch_add(1, Ordering::SeqCst) > 0 {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "access is denied"));
            }
            self.inner.rename(from, to)
        }
    }

    #[test]
    fn rename_failure_keeps_earlier_renames() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = touch(tmp.path(), &["a", "b", "c"]);
        let fs = DenyAfterFirst {
            inner: LocalFileSystem::new(),
            renames: AtomicUsize::new(0),
        };

        let outcome = run_batch(&fs, &formula(r#""r" + $index"#), &paths);

        assert_eq!(outcome.renamed_count(), 1);
        assert!(outcome.is_renamed(0));
        assert!(!outcome.is_renamed(1));
        assert!(!outcome.is_renamed(2));
        assert!(matches!(
            outcome.error(),
            Some(RenameError::Fs(FsError::Io { .. }))
        ));
        let status = outcome.to_string();
        assert!(status.starts_with("renamed 1 of 3 files; failed to rename"), "{status}");
        assert!(status.contains("access is denied"), "{status}");

        assert!(tmp.path().join("r0").exists());
        assert!(tmp.path().join("b").exists());
        assert!(tmp.path().join("c").exists());
        assert_eq!(fs.renames.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_source_stops_the_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let mut paths = touch(tmp.path(), &["a"]);
        paths.insert(0, tmp.path().join("gone").to_string_lossy().into_owned());

        let outcome = run_batch(&LocalFileSystem::new(), &formula(r#"$name + ".bak""#), &paths);
        assert_eq!(outcome.renamed_count(), 0);
        assert!(matches!(
            outcome.error(),
            Some(RenameError::Fs(FsError::SourceMissing(_)))
        ));
        assert!(tmp.path().join("a").exists());
    }

    #[test]
    fn compile_errors_skip_renaming() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = touch(tmp.path(), &["a"]);
        let outcome = run_batch(&LocalFileSystem::new(), &formula("( 1 + 2"), &paths);
        assert_eq!(
            outcome.error(),
            Some(&RenameError::Compile(CompileError::BracketMismatch))
        );
        assert_eq!(outcome.to_string(), "bracket mismatch");
        assert_eq!(outcome.total(), 1);
        assert!(tmp.path().join("a").exists());
    }

    #[test]
    fn evaluation_errors_skip_renaming() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = touch(tmp.path(), &["a", "b"]);
        let outcome = run_batch(&LocalFileSystem::new(), &formula("$name - 1"), &paths);
        assert!(matches!(
            outcome.error(),
            Some(RenameError::Eval(EvalError::Type(_)))
        ));
        assert!(outcome.to_string().starts_with("illegal operator Sub"));
        assert_eq!(outcome.renamed_count(), 0);
        assert!(tmp.path().join("a").exists());
        assert!(tmp.path().join("b").exists());
    }

    #[test]
    fn empty_file_set() {
        let outcome = run_batch(&LocalFileSystem::new(), &formula("$index"), &[]);
        assert!(outcome.is_success());
        assert_eq!(outcome.to_string(), "renamed 0 of 0 files");
    }
}
