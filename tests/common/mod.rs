#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use git2::{IndexAddOption, Oid, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

/// A scratch repository whose primary branch is `main`
pub struct Fixture {
    pub dir: TempDir,
    pub repo: Repository,
}

impl Fixture {
    /// Repository with one commit on `main` holding a README and a source file
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts).unwrap();

        let fixture = Self { dir, repo };
        fixture.write("README.md", "# Demo\n\nA small project.\n");
        fixture.write("src/lib.rs", "pub fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n");
        fixture.commit("Initial commit");
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.dir.path().join(rel)).unwrap();
    }

    /// Stage everything in the working tree and commit it on HEAD
    pub fn commit(&self, message: &str) -> Oid {
        let mut index = self.repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.update_all(["*"].iter(), None).unwrap();
        index.write().unwrap();

        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Test User", "test@example.com").unwrap();

        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    /// Create a branch at HEAD and switch to it
    pub fn branch(&self, name: &str) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo.branch(name, &head, false).unwrap();
        self.repo.set_head(&format!("refs/heads/{name}")).unwrap();
    }

    /// Feature branch with one commit fixing a crash and adding tests,
    /// plus an uncommitted README edit
    pub fn with_feature_work() -> Self {
        let fixture = Self::new();
        fixture.branch("feature/tokenizer");
        fixture.write(
            "src/lib.rs",
            "pub fn add(a: i32, b: i32) -> i32 {\n    a.saturating_add(b)\n}\n",
        );
        fixture.write(
            "tests/tokenizer.rs",
            "#[test]\nfn adds() {\n    assert_eq!(demo::add(1, 2), 3);\n}\n",
        );
        fixture.commit("Fix overflow crash in add");
        fixture.write("README.md", "# Demo\n\nA small project.\n\nNow overflow-safe.\n");
        fixture
    }
}

/// Executable shell script standing in for `git`
#[cfg(unix)]
pub fn git_wrapper(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("git-wrapper.sh");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
