use std::collections::BTreeSet;
use std::fs;

use tempfile::tempdir;

use crate::kernel::context::AppContext;
use crate::kernel::error::Error;
use crate::provision::{NoopProvisioner, PackageSet, PathProvisioner, ProvisionError, Provisioner};

fn packages(names: &[&str]) -> PackageSet {
    names.iter().map(|n| n.to_string()).collect::<BTreeSet<_>>()
}

#[tokio::test]
async fn test_noop_accepts_anything() {
    let app = AppContext::default();
    NoopProvisioner
        .provision(&packages(&["definitely-not-installed"]), &app)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_path_provisioner_finds_packages() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("gcc"), b"").unwrap();
    fs::write(dir.path().join("make"), b"").unwrap();
    let provisioner = PathProvisioner::new(vec![dir.path().to_path_buf()]);
    let app = AppContext::default();

    provisioner.provision(&packages(&["gcc", "make"]), &app).await.unwrap();
    assert_eq!(provisioner.locate("gcc", &app), Some(dir.path().join("gcc")));
}

#[tokio::test]
async fn test_path_provisioner_reports_missing_package() {
    let dir = tempdir().unwrap();
    let provisioner = PathProvisioner::new(vec![dir.path().to_path_buf()]);

    let err = provisioner
        .provision(&packages(&["cmake"]), &AppContext::default())
        .await
        .unwrap_err();

    match err {
        Error::Provision(ProvisionError::PackageMissing { package, searched }) => {
            assert_eq!(package, "cmake");
            assert_eq!(searched, 1);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_directory_is_not_a_package() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("tool")).unwrap();
    let provisioner = PathProvisioner::new(vec![dir.path().to_path_buf()]);

    let err = provisioner
        .provision(&packages(&["tool"]), &AppContext::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Provision(ProvisionError::NotAFile { .. })));
}

#[tokio::test]
async fn test_relative_search_paths_resolve_against_root() {
    let root = tempdir().unwrap();
    fs::create_dir(root.path().join("bin")).unwrap();
    fs::write(root.path().join("bin").join("protoc"), b"").unwrap();
    let provisioner = PathProvisioner::new(vec!["bin".into()]);
    let app = AppContext::new(root.path(), "test");

    provisioner.provision(&packages(&["protoc"]), &app).await.unwrap();
    assert!(provisioner.locate("protoc", &AppContext::default()).is_none());
}

#[tokio::test]
async fn test_empty_package_set_needs_no_search_paths() {
    let provisioner = PathProvisioner::new(Vec::new());
    provisioner.provision(&PackageSet::new(), &AppContext::default()).await.unwrap();
    assert_eq!(provisioner.name(), "path");
}
