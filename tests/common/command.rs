use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use derive_new::new;
use rstest::fixture;
use std::path::Path;

pub const AUTHOR_NAME: &str = "Jane Doe";
pub const AUTHOR_EMAIL: &str = "jane@example.com";
pub const FIXED_TIME: &str = "1700000000";

/// An empty repository as `git init` leaves it, HEAD on `master`
#[fixture]
pub fn repository_dir() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    init_git_dir(&dir.path().join(".git"));
    dir
}

pub fn init_git_dir(git_dir: &Path) {
    for sub_dir in ["objects", "refs/heads", "refs/tags"] {
        std::fs::create_dir_all(git_dir.join(sub_dir))
            .unwrap_or_else(|e| panic!("Failed to create {sub_dir}: {e}"));
    }
    write_file(FileSpec::new(
        git_dir.join("HEAD"),
        "ref: refs/heads/master\n".to_string(),
    ));
    write_file(FileSpec::new(
        git_dir.join("config"),
        "[core]\n\trepositoryformatversion = 0\n\tbare = false\n".to_string(),
    ));
}

/// `bitar` run from `dir`, isolated from the user's git configuration
pub fn run_bitar_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("bitar").expect("Failed to find bitar binary");
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env("BITAR_LOG", "info")
        .env_remove("GIT_AUTHOR_NAME")
        .env_remove("GIT_AUTHOR_EMAIL")
        .env_remove("GIT_COMMITTER_NAME")
        .env_remove("GIT_COMMITTER_EMAIL");
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

/// Import with a fixed identity and time, so commit ids are reproducible
pub fn bitar_import(dir: &Path, sources: &[String], message: &str) -> Command {
    let mut cmd = run_bitar_command(dir, &[]);
    cmd.args(sources)
        .args(["--author-time", FIXED_TIME, "--author-timezone", "+0000"])
        .args(["--commit-time", FIXED_TIME, "--commit-timezone", "+0000"])
        .args(["-m", message])
        .envs(vec![
            ("GIT_AUTHOR_NAME", AUTHOR_NAME),
            ("GIT_AUTHOR_EMAIL", AUTHOR_EMAIL),
            ("GIT_COMMITTER_NAME", AUTHOR_NAME),
            ("GIT_COMMITTER_EMAIL", AUTHOR_EMAIL),
        ]);
    cmd
}

/// Run an import that must succeed and return the printed commit id
pub fn import_successfully(dir: &Path, sources: &[String], message: &str) -> String {
    let output = bitar_import(dir, sources, message)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    String::from_utf8(output)
        .expect("Commit id is not UTF-8")
        .trim()
        .to_string()
}

#[derive(Debug, Clone, new)]
pub struct RandomAuthor {
    pub name: String,
    pub email: String,
}

pub fn generate_random_author() -> RandomAuthor {
    use fake::Fake;
    use fake::faker::internet::en::FreeEmail;
    use fake::faker::name::en::Name;

    // quotes and other punctuation would need escaping in a config file
    let name = std::iter::repeat_with(|| Name().fake::<String>())
        .find(|name| name.chars().all(|c| c.is_ascii_alphabetic() || c == ' '))
        .expect("Failed to generate a name");
    let email = FreeEmail().fake::<String>();
    RandomAuthor::new(name, email)
}

pub fn source(scheme: &str, path: &Path) -> String {
    format!("{scheme}:{}", path.display())
}
