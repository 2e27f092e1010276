use std::fs;

use tempfile::tempdir;

use session_graph::io::{dataset_dir, load_graph, load_sessions, save_sessions, save_train_split};
use session_graph::pipeline::{run_build, run_rebuild, BuildSettings, RebuildSettings};
use session_graph::GraphError;

fn build_settings(root: &str, sample_num: i64) -> BuildSettings {
    BuildSettings {
        dataset_root: root.to_string(),
        dataset: "sample".to_string(),
        sessions_file: "all_train_seq.bin".to_string(),
        click_log_path: None,
        sample_num,
        show_progress: false,
        export_tsv: false,
    }
}

fn rebuild_settings(root: &str) -> RebuildSettings {
    RebuildSettings {
        dataset_root: root.to_string(),
        dataset: "sample".to_string(),
        train_file: "train.bin".to_string(),
        output_file: "all_train_seq.bin".to_string(),
    }
}

#[test]
fn rebuilt_sessions_feed_the_graph_build() {
    let root = tempdir().unwrap();
    let root_path = root.path().to_str().unwrap();
    let dir = dataset_dir(root_path, "sample");
    fs::create_dir_all(&dir).unwrap();

    let prefixes = vec![vec![1, 2], vec![], vec![3], vec![2, 3]];
    let labels = vec![4, 9, 5, 1];
    save_train_split(&dir.join("train.bin"), &prefixes, &labels).unwrap();

    let rebuilt = run_rebuild(&rebuild_settings(root_path)).unwrap();
    assert_eq!(3, rebuilt.qty_sessions);
    assert_eq!(
        vec![vec![1, 2, 4], vec![3, 5], vec![2, 3, 1]],
        load_sessions(&rebuilt.output_path).unwrap()
    );
    assert_eq!(
        format!("Saved 3 sessions to {}", rebuilt.output_path.display()),
        rebuilt.summary()
    );

    let report = run_build(&build_settings(root_path, 2)).unwrap();
    assert_eq!(3, report.qty_sessions);
    assert_eq!(6, report.num_nodes);
    assert!(report.artifacts.adjacency_path.ends_with("adj_2.bin"));
    assert!(report.artifacts.weights_path.ends_with("num_2.bin"));
    assert_eq!(
        "Built global graph for sample: 3 sessions, 5 items (1-based IDs); saved adj_2.bin and num_2.bin.",
        report.summary()
    );

    let graph = load_graph(&dir, 2).unwrap();
    // [1,2,4] [3,5] [2,3,1]: node 2 meets 1 twice, 4 once and 3 once
    assert_eq!(&[1, 4], graph.neighbors(2));
    assert_eq!(&[2, 1], graph.neighbor_weights(2));
    assert!(graph.neighbors(0).is_empty());
    assert_eq!(&[3], graph.neighbors(5));
    for node in 0..graph.num_nodes() {
        assert!(graph.neighbors(node).len() <= 2);
    }
}

#[test]
fn repeated_builds_write_identical_artifacts() {
    let root = tempdir().unwrap();
    let root_path = root.path().to_str().unwrap();
    let dir = dataset_dir(root_path, "sample");
    let sessions = vec![vec![5, 1, 5, 2, 7], vec![2, 7, 0, 7, 1], vec![3], vec![6, 6, 6]];
    save_sessions(&dir.join("all_train_seq.bin"), &sessions).unwrap();

    run_build(&build_settings(root_path, 3)).unwrap();
    let first_adjacency = fs::read(dir.join("adj_3.bin")).unwrap();
    let first_weights = fs::read(dir.join("num_3.bin")).unwrap();

    run_build(&build_settings(root_path, 3)).unwrap();
    assert_eq!(first_adjacency, fs::read(dir.join("adj_3.bin")).unwrap());
    assert_eq!(first_weights, fs::read(dir.join("num_3.bin")).unwrap());
}

#[test]
fn missing_dataset_is_reported_and_nothing_is_written() {
    let root = tempdir().unwrap();
    let root_path = root.path().to_str().unwrap();

    let result = run_build(&build_settings(root_path, 12));
    assert!(matches!(result, Err(GraphError::MissingInput(_))));
    assert!(!dataset_dir(root_path, "sample").join("adj_12.bin").exists());

    let result = run_rebuild(&rebuild_settings(root_path));
    assert!(matches!(result, Err(GraphError::MissingInput(_))));
}

#[test]
fn non_positive_sample_num_fails_before_loading() {
    let root = tempdir().unwrap();
    let root_path = root.path().to_str().unwrap();
    let result = run_build(&build_settings(root_path, 0));
    assert!(matches!(result, Err(GraphError::Configuration(_))));
}

#[test]
fn padding_only_corpus_persists_nothing() {
    let root = tempdir().unwrap();
    let root_path = root.path().to_str().unwrap();
    let dir = dataset_dir(root_path, "sample");
    save_sessions(&dir.join("all_train_seq.bin"), &[vec![0, 0], vec![0]]).unwrap();

    let result = run_build(&build_settings(root_path, 4));
    assert!(matches!(result, Err(GraphError::InvalidInput(_))));
    assert!(!dir.join("adj_4.bin").exists());
    assert!(!dir.join("num_4.bin").exists());
}

#[test]
fn click_log_source_and_tsv_export() {
    let root = tempdir().unwrap();
    let root_path = root.path().to_str().unwrap();
    let click_log = root.path().join("clicks.tsv");
    fs::write(
        &click_log,
        "SessionId\tItemId\tTime\n1\t2\t10\n1\t1\t5\n2\t3\t1\n2\t2\t2\n",
    )
    .unwrap();

    let mut settings = build_settings(root_path, 5);
    settings.click_log_path = Some(click_log);
    settings.export_tsv = true;
    let report = run_build(&settings).unwrap();

    assert_eq!(2, report.qty_sessions);
    assert_eq!(2, report.qty_edges / 2);
    let tsv_path = report.tsv_path.unwrap();
    let exported = fs::read_to_string(tsv_path).unwrap();
    assert_eq!(
        "node\tneighbor\tweight\n1\t2\t1\n2\t1\t1\n2\t3\t1\n3\t2\t1\n",
        exported
    );
}

#[test]
fn failed_export_persists_no_graph() {
    let root = tempdir().unwrap();
    let root_path = root.path().to_str().unwrap();
    let dir = dataset_dir(root_path, "sample");
    save_sessions(&dir.join("all_train_seq.bin"), &[vec![1, 2, 3]]).unwrap();
    fs::create_dir_all(dir.join("graph_3.tsv")).unwrap();

    let mut settings = build_settings(root_path, 3);
    settings.export_tsv = true;
    let result = run_build(&settings);

    assert!(matches!(result, Err(GraphError::Io { .. })));
    assert!(!dir.join("adj_3.bin").exists());
    assert!(!dir.join("num_3.bin").exists());
    assert!(!dir.join("adj_3.bin.tmp").exists());
    assert!(!dir.join("num_3.bin.tmp").exists());
    assert!(!dir.join("graph_3.tsv.tmp").exists());
    assert!(dir.join("graph_3.tsv").is_dir());
}

#[test]
fn build_report_times_every_phase() {
    let root = tempdir().unwrap();
    let root_path = root.path().to_str().unwrap();
    let dir = dataset_dir(root_path, "sample");
    save_sessions(&dir.join("all_train_seq.bin"), &[vec![1, 2, 3]]).unwrap();

    let report = run_build(&build_settings(root_path, 3)).unwrap();
    let phases: Vec<_> = report.phase_durations.iter().map(|(phase, _)| *phase).collect();
    assert_eq!(vec!["load", "infer", "build", "persist"], phases);
    assert!(report.tsv_path.is_none());
}
