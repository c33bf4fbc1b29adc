use assert_cmd::prelude::*;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use flate2::read::GzDecoder;
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::process::Command;

fn have(tool: &str) -> bool {
    Command::new(tool)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// A jcz command isolated from the user's settings file.
fn jcz(temp: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("jcz"));
    cmd.env("XDG_CONFIG_HOME", temp.path().join("config"))
        .env("HOME", temp.path())
        .env_remove("JCDBG")
        .current_dir(temp.path());
    cmd
}

fn tar_members<R: Read>(reader: R) -> Vec<String> {
    let mut archive = tar::Archive::new(reader);
    let mut names: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| {
            e.unwrap()
                .path()
                .unwrap()
                .to_string_lossy()
                .trim_end_matches('/')
                .to_string()
        })
        .collect();
    names.sort();
    names
}

fn gunzip(path: &Path) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(File::open(path).unwrap())
        .read_to_end(&mut out)
        .unwrap();
    out
}

#[test]
fn invalid_codec() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    temp.child("f.txt").write_str("hello")?;

    jcz(&temp)
        .args(["-c", "zip", "f.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Compress command 'zip' is invalid"));
    Ok(())
}

#[test]
fn missing_input() -> anyhow::Result<()> {
    let temp = TempDir::new()?;

    jcz(&temp)
        .args(["-c", "gzip", "foo/bar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not found"));
    jcz(&temp)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No input files"));
    Ok(())
}

#[test]
fn level_out_of_range() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    temp.child("f.txt").write_str("hello")?;

    jcz(&temp)
        .args(["-c", "gzip", "-l", "0", "f.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Compression level 0 is out of range for GZIP"));
    temp.child("f.txt.gz").assert(predicate::path::missing());
    Ok(())
}

#[test]
fn collect_flags_conflict() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    temp.child("f.txt").write_str("hello")?;

    jcz(&temp)
        .args(["-a", "one", "-A", "two", "f.txt"])
        .assert()
        .code(2);
    Ok(())
}

#[test]
fn same_name_with_relocation() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    temp.child("a/report").write_str("first")?;
    temp.child("b/report").write_str("second")?;
    temp.child("dest").create_dir_all()?;

    jcz(&temp)
        .args(["-c", "gzip", "-C", "dest", "a/report", "b/report"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("same name: report"));
    assert_eq!(fs::read_dir(temp.path().join("dest"))?.count(), 0);
    temp.child("a/report.gz").assert(predicate::path::missing());
    Ok(())
}

#[test]
fn gzip_keeps_original() -> anyhow::Result<()> {
    if !have("gzip") {
        return Ok(());
    }
    let temp = TempDir::new()?;
    temp.child("notes.txt").write_str("some notes\n")?;

    jcz(&temp)
        .args(["-c", "gzip", "-s", "notes.txt"])
        .assert()
        .success()
        .stderr(predicate::str::contains("notes.txt.gz"));
    temp.child("notes.txt").assert("some notes\n");
    assert_eq!(gunzip(&temp.path().join("notes.txt.gz")), b"some notes\n");
    Ok(())
}

#[test]
fn default_command_archives_directories() -> anyhow::Result<()> {
    if !have("gzip") || !have("tar") {
        return Ok(());
    }
    let temp = TempDir::new()?;
    temp.child("docs/a.txt").write_str("a")?;
    temp.child("docs/sub/b.txt").write_str("b")?;

    jcz(&temp).arg("docs/").assert().success();

    let archive = temp.path().join("docs.tar.gz");
    temp.child("docs.tar").assert(predicate::path::missing());
    let members = tar_members(GzDecoder::new(File::open(archive)?));
    assert_eq!(members, ["docs", "docs/a.txt", "docs/sub", "docs/sub/b.txt"]);
    Ok(())
}

#[test]
fn partial_failure_keeps_going() -> anyhow::Result<()> {
    if !have("gzip") {
        return Ok(());
    }
    let temp = TempDir::new()?;
    temp.child("ok.txt").write_str("fine")?;
    temp.child("dir").create_dir_all()?;

    jcz(&temp)
        .args(["-c", "gzip", "dir", "ok.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("is a directory"))
        .stderr(predicate::str::contains("1 of 2 jobs failed"));
    temp.child("ok.txt.gz").assert(predicate::path::exists());
    Ok(())
}

#[test]
fn decompress_into_directory() -> anyhow::Result<()> {
    if !have("gzip") || !have("tar") {
        return Ok(());
    }
    let temp = TempDir::new()?;
    temp.child("proj/main.rs").write_str("fn main() {}\n")?;
    temp.child("out").create_dir_all()?;

    jcz(&temp).args(["-c", "tgz", "proj"]).assert().success();
    jcz(&temp)
        .args(["-d", "-C", "out", "proj.tar.gz"])
        .assert()
        .success()
        .stderr(predicate::str::contains("may overwrite"));

    temp.child("out/proj/main.rs").assert("fn main() {}\n");
    temp.child("proj.tar").assert(predicate::path::missing());
    temp.child("out/proj.tar").assert(predicate::path::missing());
    temp.child("proj.tar.gz").assert(predicate::path::exists());
    Ok(())
}

#[test]
fn decompress_rejects_unknown_suffix() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    temp.child("plain.txt").write_str("x")?;

    jcz(&temp)
        .args(["-d", "plain.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("suffix is not"));
    Ok(())
}

#[test]
fn collect_under_package_directory() -> anyhow::Result<()> {
    if !have("bzip2") || !have("tar") {
        return Ok(());
    }
    let temp = TempDir::new()?;
    temp.child("a.txt").write_str("a")?;
    temp.child("lib/b.txt").write_str("b")?;

    jcz(&temp)
        .args(["-c", "tbz2", "-a", "bundle", "a.txt", "lib"])
        .assert()
        .success();

    let archive = File::open(temp.path().join("bundle.tar.bz2"))?;
    let members = tar_members(bzip2::read::BzDecoder::new(archive));
    assert_eq!(
        members,
        ["bundle", "bundle/a.txt", "bundle/lib", "bundle/lib/b.txt"]
    );
    temp.child("bundle").assert(predicate::path::missing());
    temp.child("bundle.tar").assert(predicate::path::missing());
    Ok(())
}

#[test]
fn collect_flat_into_directory() -> anyhow::Result<()> {
    if !have("tar") {
        return Ok(());
    }
    let temp = TempDir::new()?;
    temp.child("a.txt").write_str("a")?;
    temp.child("b.txt").write_str("b")?;
    temp.child("dest").create_dir_all()?;

    jcz(&temp)
        .args(["-c", "tar", "-A", "flat", "-C", "dest", "a.txt", "b.txt"])
        .assert()
        .success();

    let members = tar_members(File::open(temp.path().join("dest/flat.tar"))?);
    assert_eq!(members, ["a.txt", "b.txt"]);
    Ok(())
}

#[test]
fn collect_refuses_existing_name() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    temp.child("a.txt").write_str("a")?;
    temp.child("bundle").create_dir_all()?;

    jcz(&temp)
        .args(["-c", "tar", "-a", "bundle", "a.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("can not be used as package name"));
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn settings_file_provides_defaults() -> anyhow::Result<()> {
    if !have("xz") {
        return Ok(());
    }
    let temp = TempDir::new()?;
    temp.child("config/jcz/config.toml")
        .write_str("codec = \"xz\"\nlevel = 1\n")?;
    temp.child("data.bin").write_binary(&[7u8; 4096])?;

    jcz(&temp).arg("data.bin").assert().success();

    let mut out = Vec::new();
    xz2::read::XzDecoder::new(File::open(temp.path().join("data.bin.xz"))?).read_to_end(&mut out)?;
    assert_eq!(out, vec![7u8; 4096]);
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn broken_settings_file() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    temp.child("config/jcz/config.toml")
        .write_str("colour = \"blue\"\n")?;
    temp.child("f.txt").write_str("x")?;

    jcz(&temp)
        .arg("f.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error parsing config file"));
    Ok(())
}

#[test]
fn same_file_given_twice_runs_once() -> anyhow::Result<()> {
    if !have("gzip") {
        return Ok(());
    }
    let temp = TempDir::new()?;
    temp.child("a").write_str("alpha")?;

    jcz(&temp)
        .args(["-c", "gzip", "a", "./a"])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 of 1 jobs finished successfully"));
    assert_eq!(gunzip(&temp.path().join("a.gz")), b"alpha");
    Ok(())
}
