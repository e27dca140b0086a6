//! End-to-end browsing scenarios against a real directory tree.
//!
//! The tree is mutated between queries the way the pipeline would, and every
//! answer must reflect the state on disk at query time.

use std::fs;
use std::path::Path;

use explorer::core::artifact::{ArtifactKind, ArtifactStatus};
use explorer::core::level::{Level, ViewMode};
use explorer::core::resolver::ArtifactQuery;
use explorer::explorer::{Explorer, RootStatus, SelectionRequest};
use explorer::io::config::ExplorerConfig;
use explorer::io::fs_tree::FsTree;

fn mkdir(root: &Path, rel: &str) {
    fs::create_dir_all(root.join(rel)).expect("mkdir");
}

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, b"\x89PNG").expect("write");
}

fn explorer_at(root: &Path) -> Explorer<FsTree> {
    let cfg = ExplorerConfig {
        results_dir: root.to_path_buf(),
        ..ExplorerConfig::default()
    };
    Explorer::from_config(&cfg).expect("explorer")
}

fn request(subject: &str, method: &str, contrast: &str) -> SelectionRequest {
    SelectionRequest {
        subject: Some(subject.to_string()),
        method: Some(method.to_string()),
        contrast: Some(contrast.to_string()),
        ..SelectionRequest::default()
    }
}

/// Only the Beta map exists under `sub-01/methodA/contrastX/combined_total`.
///
/// Beta is ready, Tstat is missing, and an absent contrast is pending for
/// every catalog kind.
#[test]
fn beta_only_tree_resolves_three_ways() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    touch(root, "sub-01/methodA/contrastX/combined_total/TOTAL_01_beta.png");
    let explorer = explorer_at(root);

    let selection = explorer.restore(&SelectionRequest {
        run_group: Some("combined_total".to_string()),
        ..request("sub-01", "methodA", "contrastX")
    });
    let beta = explorer
        .resolve_artifact(&selection, ArtifactKind::Beta)
        .expect("beta");
    assert_eq!(
        beta,
        ArtifactStatus::Ready {
            locator: root.join("sub-01/methodA/contrastX/combined_total/TOTAL_01_beta.png"),
        }
    );
    assert_eq!(
        explorer
            .resolve_artifact(&selection, ArtifactKind::Tstat)
            .expect("tstat"),
        ArtifactStatus::Missing
    );

    for kind in ArtifactKind::CATALOG {
        let query = ArtifactQuery::aggregate(["sub-01", "methodA", "contrastY"], kind);
        assert_eq!(explorer.resolve_query(&query), Ok(ArtifactStatus::Pending));
    }
}

/// `sub-02` only has `methodB`; switching subjects must drop the method,
/// contrast and run group chosen under `sub-01`, even though a contrast of
/// the same name exists under both.
#[test]
fn switching_subject_clears_deeper_selection() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    mkdir(root, "sub-01/methodA/contrastX/combined_total");
    mkdir(root, "sub-02/methodB/contrastX");
    let explorer = explorer_at(root);

    let mut machine = explorer.machine();
    let tree = explorer.tree();
    machine.set_value(tree, Level::Subject, "sub-01").expect("s");
    machine.set_value(tree, Level::Method, "methodA").expect("m");
    machine.set_value(tree, Level::Contrast, "contrastX").expect("c");
    machine
        .set_value(tree, Level::RunGroup, "combined_total")
        .expect("g");

    machine.set_value(tree, Level::Subject, "sub-02").expect("s");
    assert_eq!(machine.selection().values(), ["sub-02"]);
    let methods = machine.options_for(tree, Level::Method).expect("methods");
    assert_eq!(methods.as_slice(), ["methodB"]);
    assert!(
        machine
            .set_value(tree, Level::Contrast, "contrastX")
            .is_err()
    );
}

#[test]
fn deleted_directory_is_cleared_on_requery() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    mkdir(root, "sub-01/methodA/contrastX");
    mkdir(root, "sub-01/methodA/contrastW");
    let explorer = explorer_at(root);

    let mut machine = explorer.machine();
    let tree = explorer.tree();
    machine.set_value(tree, Level::Subject, "sub-01").expect("s");
    machine.set_value(tree, Level::Method, "methodA").expect("m");
    machine.set_value(tree, Level::Contrast, "contrastX").expect("c");

    fs::remove_dir_all(root.join("sub-01/methodA/contrastX")).expect("rm");
    let contrasts = machine.options_for(tree, Level::Contrast).expect("c");
    assert_eq!(contrasts.as_slice(), ["contrastW"]);
    assert_eq!(machine.selection().contrast(), None);
}

#[test]
fn run_gallery_tracks_pipeline_progress() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    mkdir(root, "sub-01/methodA/hand_vs_foot/run-01_dir-ap");
    mkdir(root, "sub-01/methodA/hand_vs_foot/runX");
    let explorer = explorer_at(root);
    let selection = explorer.restore(&request("sub-01", "methodA", "hand_vs_foot"));

    let runs = explorer.run_gallery(&selection).expect("runs");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run, "run-01_dir-ap");
    assert_eq!(runs[0].status, ArtifactStatus::Missing);

    touch(
        root,
        "sub-01/methodA/hand_vs_foot/run-01_dir-ap/hand_vs_foot_run_viz.png",
    );
    mkdir(root, "sub-01/methodA/hand_vs_foot/sub-run-02");
    let runs = explorer.run_gallery(&selection).expect("runs");
    let names: Vec<&str> = runs.iter().map(|entry| entry.run.as_str()).collect();
    assert_eq!(names, vec!["run-01_dir-ap", "sub-run-02"]);
    assert!(runs[0].status.is_ready());
    assert_eq!(runs[1].status, ArtifactStatus::Missing);
}

#[test]
fn per_run_view_offers_only_run_directories() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    mkdir(root, "sub-01/methodA/contrastX/combined_total");
    mkdir(root, "sub-01/methodA/contrastX/run-02");
    mkdir(root, "sub-01/methodA/contrastX/run-01");
    let explorer = explorer_at(root);

    let options = explorer
        .get_options(
            Level::RunGroup,
            &SelectionRequest {
                view: Some(ViewMode::PerRun),
                ..request("sub-01", "methodA", "contrastX")
            },
        )
        .expect("options");
    assert_eq!(options.options.as_slice(), ["run-01", "run-02"]);
}

#[test]
fn root_appearing_later_becomes_available() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("results");
    let explorer = explorer_at(&root);
    assert_eq!(explorer.root_status(), RootStatus::NotFound);
    assert!(explorer.get_subjects().is_empty());

    mkdir(&root, "sub-01");
    assert_eq!(explorer.root_status(), RootStatus::Available);
    assert_eq!(explorer.get_subjects().as_slice(), ["sub-01"]);
}
