//! End-to-end tests against the real filesystem through `NativeRuntime`.

mod helpers;

use std::sync::Arc;

use helpers::ids;
use skein_graph::{NativeRuntime, ResolveRequest, Resolver};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn resolves_a_real_tree() {
    let dir = TempDir::new().unwrap();
    let entry = write(&dir, "main.js", "require('./a');\n");
    write(&dir, "a.js", "require('./b');\n");
    write(&dir, "b.js", "module.exports = 1;\n");

    let records = Resolver::new(Arc::new(NativeRuntime::new()))
        .resolve(ResolveRequest::new([entry]))
        .collect()
        .await
        .unwrap();

    assert_eq!(records.len(), 3);
    assert!(records[0].is_entry);
    assert!(ids(&records)[0].ends_with("main.js"));
    assert!(ids(&records)[1].ends_with("a.js"));
    assert!(ids(&records)[2].ends_with("b.js"));
}

#[tokio::test]
async fn directory_reference_resolves_to_its_index_file() {
    let dir = TempDir::new().unwrap();
    let entry = write(&dir, "main.js", "require('./lib');\n");
    std::fs::create_dir(dir.path().join("lib")).unwrap();
    write(&dir, "lib/index.js", "module.exports = 1;\n");

    let records = Resolver::new(Arc::new(NativeRuntime::new()))
        .resolve(ResolveRequest::new([entry]))
        .collect()
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert!(ids(&records)[1].ends_with("lib/index.js"));
}

#[cfg(unix)]
#[tokio::test]
async fn real_symlinks_collapse_to_one_module() {
    let dir = TempDir::new().unwrap();
    let entry = write(&dir, "main.js", "require('./real.js'); require('./alias.js');\n");
    let real = write(&dir, "real.js", "module.exports = 1;\n");
    std::os::unix::fs::symlink(&real, dir.path().join("alias.js")).unwrap();

    let records = Resolver::new(Arc::new(NativeRuntime::new()))
        .resolve(ResolveRequest::new([entry]))
        .collect()
        .await
        .unwrap();

    // main plus exactly one node for real.js, however it was referenced.
    assert_eq!(records.len(), 2);
    let main = &records[0];
    assert_eq!(main.resolved_references.len(), 2);
    let targets: Vec<_> = main.reference_targets().collect();
    assert_eq!(targets[0], targets[1]);
}

#[cfg(unix)]
#[tokio::test]
async fn symlinked_entry_is_identified_by_its_target() {
    let dir = TempDir::new().unwrap();
    let real = write(&dir, "main.js", "module.exports = 1;\n");
    let link = dir.path().join("entry-link.js");
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let records = Resolver::new(Arc::new(NativeRuntime::new()))
        .resolve(ResolveRequest::new([link]))
        .collect()
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert!(records[0].id.as_str().ends_with("main.js"));
    assert!(records[0].is_entry);
}
