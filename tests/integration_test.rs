use assert_cmd::Command;
use assert_cmd::cargo;
use flate2::Compression;
use flate2::write::GzEncoder;
use mockito::Server;
use predicates::prelude::*;
use std::io::prelude::*;
use std::path::Path;
use tar::Builder;
use tempfile::{TempDir, tempdir};

fn create_tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
    let mut tar_builder = Builder::new(Vec::new());
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_path(name).unwrap();
        header.set_mode(0o644);
        header.set_cksum();
        tar_builder.append(&header, content.as_bytes()).unwrap();
    }
    let tar = tar_builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

fn create_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// `pkgsource` with a clean environment and a private cache directory.
fn pkgsource(cache: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("pkgsource"));
    cmd.env_remove("PKGSOURCE_ROOT")
        .env_remove("PKGSOURCE_TOKEN")
        .env("XDG_CACHE_HOME", cache.path());
    cmd
}

fn index_json(name: &str, foo_archive: &str, bar_archive: &str) -> String {
    format!(
        r#"{{
            "name": "{name}",
            "source_group": "demo",
            "packages": [
                {{
                    "author": "Author",
                    "name": "Foo",
                    "description": "Foo tools",
                    "dependency_id": "Author-Foo",
                    "versions": [
                        {{
                            "version": "1.0.0",
                            "dependency_id": "Author-Foo-1.0.0",
                            "dependencies": ["Author-Bar-LATEST", "Author-Ghost-2.0"],
                            "archive": "{foo_archive}"
                        }}
                    ]
                }},
                {{
                    "author": "Author",
                    "name": "Bar",
                    "dependency_id": "Author-Bar",
                    "versions": [
                        {{ "version": "latest", "dependency_id": "Author-Bar-latest", "archive": "{bar_archive}" }}
                    ]
                }}
            ]
        }}"#
    )
}

fn write_local_index(dir: &Path) -> String {
    std::fs::write(
        dir.join("Foo.zip"),
        create_zip(&[("Foo.dll", b"MZ".as_slice()), ("docs/readme.txt", b"foo".as_slice())]),
    )
    .unwrap();
    std::fs::write(dir.join("Bar.tar.gz"), create_tar_gz(&[("Bar.txt", "bar")])).unwrap();

    let index = dir.join("index.json");
    std::fs::write(&index, index_json("Local", "Foo.zip", "Bar.tar.gz")).unwrap();
    index.to_string_lossy().into_owned()
}

#[test]
fn test_load_reports_summary() {
    let cache = tempdir().unwrap();
    let index_dir = tempdir().unwrap();
    let root = tempdir().unwrap();
    let index = write_local_index(index_dir.path());

    pkgsource(&cache)
        .arg("load")
        .arg(&index)
        .arg("--root")
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Loaded Local [demo]: 2 package(s), 2 version(s)",
        ))
        .stdout(predicate::str::contains("Author-Foo-1.0.0 -> Author-Ghost-2.0"));

    assert!(root.path().join("Sources/demo/Local.asset").is_file());
    assert!(root.path().join("Sources/demo/Local.asset.meta").is_file());

    pkgsource(&cache)
        .arg("sources")
        .arg("--root")
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("demo"))
        .stdout(predicate::str::contains("  Local (2 package(s))"));
}

#[test]
fn test_end_to_end_install_from_local_index() {
    let cache = tempdir().unwrap();
    let index_dir = tempdir().unwrap();
    let root = tempdir().unwrap();
    let index = write_local_index(index_dir.path());

    pkgsource(&cache)
        .arg("install")
        .arg(&index)
        .arg("Foo")
        .arg("1.0.0")
        .arg("--root")
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed Bar@latest"))
        .stdout(predicate::str::contains("Installed Foo@1.0.0"));

    let foo = root.path().join("Packages/Foo");
    assert!(foo.join("Foo.dll").is_file());
    assert!(foo.join("docs/readme.txt").is_file());
    let assembly_meta = std::fs::read_to_string(foo.join("Foo.dll.meta")).unwrap();
    assert!(assembly_meta.starts_with("fileFormatVersion: 2\nguid: "));

    let descriptor: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(foo.join("package.json")).unwrap())
            .unwrap();
    assert_eq!(descriptor["name"], "author-foo-1.0.0");
    assert_eq!(descriptor["displayName"], "Foo");
    assert_eq!(descriptor["version"], "1.0.0");

    // Foo's manifest references Bar's manifest by the guid in Bar's sidecar.
    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(foo.join("Foo.asset")).unwrap()).unwrap();
    let bar_sidecar =
        std::fs::read_to_string(root.path().join("Packages/Bar/Bar.asset.meta")).unwrap();
    let bar_guid = manifest["identity"]["dependencies"][0].as_str().unwrap();
    assert!(bar_sidecar.contains(bar_guid));
    assert_eq!(manifest["identity"]["dependencies"].as_array().unwrap().len(), 1);

    assert!(!root.path().join("Staging/Temp").exists());

    // A second run finds everything installed.
    pkgsource(&cache)
        .arg("install")
        .arg(&index)
        .arg("Foo")
        .arg("1.0.0")
        .arg("--root")
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Foo@1.0.0 is already installed"))
        .stdout(predicate::str::contains("Nothing to install."));

    pkgsource(&cache)
        .arg("list")
        .arg("--root")
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Bar latest (author-bar-latest)"))
        .stdout(predicate::str::contains("Foo 1.0.0 (author-foo-1.0.0)"));
}

#[test]
fn test_end_to_end_install_from_remote_index() {
    let mut server = Server::new();
    let url = server.url();

    let _mock_index = server
        .mock("GET", "/index.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(index_json(
            "Remote",
            "archives/Foo.tar.gz",
            &format!("{}/archives/Bar.tar.gz", url),
        ))
        .create();
    let _mock_foo = server
        .mock("GET", "/archives/Foo.tar.gz")
        .with_status(200)
        .with_body(create_tar_gz(&[("Foo.txt", "foo")]))
        .create();
    let _mock_bar = server
        .mock("GET", "/archives/Bar.tar.gz")
        .with_status(200)
        .with_body(create_tar_gz(&[("Bar.txt", "bar")]))
        .create();

    let cache = tempdir().unwrap();
    let root = tempdir().unwrap();

    pkgsource(&cache)
        .arg("--root")
        .arg(root.path())
        .arg("install")
        .arg(format!("{}/index.json", url))
        .arg("Author-Foo")
        .arg("1.0.0")
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(root.path().join("Packages/Foo/Foo.txt")).unwrap(),
        "foo"
    );
    assert_eq!(
        std::fs::read_to_string(root.path().join("Packages/Bar/Bar.txt")).unwrap(),
        "bar"
    );
    assert!(root.path().join("Sources/demo/Remote.asset").is_file());
}

#[test]
fn test_install_unknown_version_fails() {
    let cache = tempdir().unwrap();
    let index_dir = tempdir().unwrap();
    let root = tempdir().unwrap();
    let index = write_local_index(index_dir.path());

    pkgsource(&cache)
        .arg("install")
        .arg(&index)
        .arg("Foo")
        .arg("--root")
        .arg(root.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Version latest of Foo not found"));

    assert!(!root.path().join("Packages").exists());
}

#[test]
fn test_install_with_missing_archive_reports_progress() {
    let cache = tempdir().unwrap();
    let index_dir = tempdir().unwrap();
    let root = tempdir().unwrap();
    let index = write_local_index(index_dir.path());
    std::fs::remove_file(index_dir.path().join("Bar.tar.gz")).unwrap();

    pkgsource(&cache)
        .arg("install")
        .arg(&index)
        .arg("Foo")
        .arg("1.0.0")
        .arg("--root")
        .arg(root.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Installation interrupted"))
        .stderr(predicate::str::contains("Bar@latest: directory prepared"))
        .stderr(predicate::str::contains("Foo@1.0.0: not started"));

    assert!(!root.path().join("Packages/Foo").exists());
}

#[test]
fn test_missing_index_fails() {
    let cache = tempdir().unwrap();
    let root = tempdir().unwrap();

    pkgsource(&cache)
        .arg("load")
        .arg(root.path().join("nope.json"))
        .arg("--root")
        .arg(root.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open index"));
}

#[test]
fn test_list_and_sources_on_empty_project() {
    let cache = tempdir().unwrap();
    let root = tempdir().unwrap();

    pkgsource(&cache)
        .arg("list")
        .arg("--root")
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No packages installed."));

    pkgsource(&cache)
        .arg("sources")
        .env("PKGSOURCE_ROOT", root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No sources loaded."));
}
