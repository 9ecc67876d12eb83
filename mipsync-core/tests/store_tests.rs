//! Store and config integration tests: error messages, hierarchy linking
//! through the JSON store, and rejection of malformed documents.

use assert_fs::prelude::*;
use mipsync_core::{
    config,
    store::{JsonProposalStore, PROPOSALS_FILE},
    Component, ConfigError, GitFile, Proposal, ProposalId, ProposalStore, StoreError,
};
use predicates::prelude::predicate;

fn parsed(filename: &str, mip: Option<u32>, components: &[&str], key: Option<&str>) -> Proposal {
    let mut p = Proposal::from_descriptor(&GitFile::new(filename, "h"));
    p.preamble.mip = mip;
    p.components = components
        .iter()
        .map(|c| Component {
            c_name: (*c).to_string(),
            c_title: "t".into(),
            c_body: "b".into(),
        })
        .collect();
    p.proposal = key.map(str::to_string);
    p
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn corrupt_store_returns_parse_error_with_path() {
    let data = assert_fs::TempDir::new().expect("tempdir");
    data.child(PROPOSALS_FILE)
        .write_str("{ not json")
        .expect("write");

    let store = JsonProposalStore::new(data.path());
    let err = store.get_all().unwrap_err();
    assert!(matches!(err, StoreError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains(PROPOSALS_FILE));
}

#[test]
fn missing_config_returns_not_found() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("mipsync init"));
}

#[test]
fn unknown_subproposal_rule_is_rejected_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".mipsync/config.yaml")
        .write_str("repository:\n  path: /srv/mips\nhierarchy:\n  subproposal_rule: guess\n")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
}

// ---------------------------------------------------------------------------
// 2. Atomic save
// ---------------------------------------------------------------------------

#[test]
fn saved_config_is_written_and_tmp_removed() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::init_at(
        home.path(),
        "/srv/mips".into(),
        config::SourceKind::Directory,
        None,
    )
    .expect("init");

    home.child(".mipsync/config.yaml")
        .assert(predicate::str::contains("kind: directory"));
    home.child(".mipsync/config.yaml.tmp")
        .assert(predicate::path::missing());
}

// ---------------------------------------------------------------------------
// 3. Hierarchy through the store
// ---------------------------------------------------------------------------

#[test]
fn fathers_are_grouped_and_linked() {
    let data = assert_fs::TempDir::new().expect("tempdir");
    let store = JsonProposalStore::new(data.path());

    let father = store
        .create(parsed("MIP4/mip4.md", Some(4), &["MIP4c1", "MIP4c2"], None))
        .expect("create father");
    store
        .create(parsed("MIP5/mip5.md", Some(5), &[], None))
        .expect("create unrelated");
    store
        .create(parsed("MIP4/MIP4c2-SP1.md", None, &[], Some("MIP4c2")))
        .expect("create sub");

    let fathers = store.group_by_relation().expect("group");
    assert_eq!(fathers.len(), 1);
    assert_eq!(fathers[0].filename, "MIP4/mip4.md");

    let father_id = father.id.clone().expect("id");
    let flags = store
        .set_father_references(&[father_id.clone()])
        .expect("link");
    assert_eq!(flags, vec![true]);

    let all = store.get_all().expect("all");
    assert_eq!(all["MIP4/MIP4c2-SP1.md"].father_id, Some(father_id));
    assert_eq!(all["MIP5/mip5.md"].father_id, None);
}

#[test]
fn delete_many_removes_only_given_ids() {
    let data = assert_fs::TempDir::new().expect("tempdir");
    let store = JsonProposalStore::new(data.path());
    let a = store.create(parsed("MIP0/mip0.md", Some(0), &[], None)).unwrap();
    store.create(parsed("MIP1/mip1.md", Some(1), &[], None)).unwrap();

    store
        .delete_many(&[a.id.clone().unwrap(), ProposalId::from("p99")])
        .expect("delete");

    let all = store.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert!(all.contains_key("MIP1/mip1.md"));
}
