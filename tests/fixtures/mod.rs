//! Test fixtures for end-to-end command tests
//!
//! `sample_repo/` is a small monorepo with a SERVICEOWNERS file and a
//! services catalog. Tests work on a temporary copy so they can write.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serviceowners::{CliOverrides, Workspace};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Path to the checked-in sample repository
pub fn sample_repo_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_repo")
}

/// A temporary repository
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Empty repository
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Copy of `sample_repo/`
    pub fn sample() -> Self {
        let repo = Self::empty();
        let src = sample_repo_path();
        for entry in WalkDir::new(&src) {
            let entry = entry.expect("walk fixture");
            let rel = entry.path().strip_prefix(&src).expect("under fixture root");
            let dest = repo.root().join(rel);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest).expect("create dir");
            } else {
                fs::copy(entry.path(), &dest).expect("copy file");
            }
        }
        repo
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, content: &str) -> &Self {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, content).expect("write file");
        self
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root().join(rel)).expect("read file")
    }

    /// Load with the given overrides layered over repo settings
    pub fn workspace(&self, overrides: &CliOverrides) -> Workspace {
        let settings = Workspace::settings(self.root(), overrides)
            .expect("settings")
            .settings;
        Workspace::load(self.root(), settings).expect("workspace")
    }

    pub fn lenient_workspace(&self, overrides: &CliOverrides) -> Workspace {
        let settings = Workspace::settings(self.root(), overrides)
            .expect("settings")
            .settings;
        Workspace::load_lenient(self.root(), settings).expect("workspace")
    }
}
