use std::path::PathBuf;

use tracing::info;

use crate::config::AppConfig;
use crate::dataframeutils::determine_corpus_statistics;
use crate::error::{GraphError, Result};
use crate::graph::{infer_num_nodes, validate_sample_num, GraphBuilder};
use crate::io::{self, GraphArtifacts};
use crate::sessions::rebuild_sessions;
use crate::stopwatch::{PhaseDurationMicros, Stopwatch};

pub struct BuildSettings {
    pub dataset_root: String,
    pub dataset: String,
    pub sessions_file: String,
    pub click_log_path: Option<PathBuf>,
    pub sample_num: i64,
    pub show_progress: bool,
    pub export_tsv: bool,
}

impl BuildSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        BuildSettings {
            dataset_root: config.data.dataset_root.clone(),
            dataset: config.data.dataset.clone(),
            sessions_file: config.data.sessions_file.clone(),
            click_log_path: config.data.click_log_path.as_ref().map(PathBuf::from),
            sample_num: config.graph.sample_num,
            show_progress: config.graph.show_progress,
            export_tsv: config.graph.export_tsv,
        }
    }
}

#[derive(Debug)]
pub struct BuildReport {
    pub dataset: String,
    pub qty_sessions: usize,
    pub num_nodes: usize,
    pub sample_num: usize,
    pub qty_edges: usize,
    pub artifacts: GraphArtifacts,
    pub tsv_path: Option<PathBuf>,
    pub phase_durations: Vec<PhaseDurationMicros>,
}

impl BuildReport {
    pub fn summary(&self) -> String {
        format!(
            "Built global graph for {}: {} sessions, {} items (1-based IDs); saved {} and {}.",
            self.dataset,
            self.qty_sessions,
            self.num_nodes - 1,
            io::adjacency_file_name(self.sample_num),
            io::weights_file_name(self.sample_num),
        )
    }
}

/// Loads the corpus, builds the capped graph and persists it. Nothing is written unless
/// every earlier step succeeded.
pub fn run_build(settings: &BuildSettings) -> Result<BuildReport> {
    let sample_num = validate_sample_num(settings.sample_num)?;
    let dataset_dir = io::dataset_dir(&settings.dataset_root, &settings.dataset);
    let mut stopwatch = Stopwatch::new();

    stopwatch.start();
    let (sessions, source) = match &settings.click_log_path {
        Some(click_log_path) => (io::read_click_log(click_log_path)?, click_log_path.clone()),
        None => {
            let sessions_path = dataset_dir.join(&settings.sessions_file);
            (io::load_sessions(&sessions_path)?, sessions_path)
        }
    };
    stopwatch.stop("load");

    determine_corpus_statistics(&source.display().to_string(), &sessions);
    let num_nodes = infer_num_nodes(&sessions)?;
    info!(
        "Building global graph for {}: {} sessions, {} items (1-based IDs).",
        settings.dataset,
        sessions.len(),
        num_nodes - 1
    );
    stopwatch.stop("infer");

    let graph = GraphBuilder::new(num_nodes, sample_num)?
        .with_progress(settings.show_progress)
        .build(&sessions)?;
    stopwatch.stop("build");

    let artifacts = io::save_graph(&dataset_dir, sample_num, &graph, settings.export_tsv)?;
    stopwatch.stop("persist");
    stopwatch.log();

    Ok(BuildReport {
        dataset: settings.dataset.clone(),
        qty_sessions: sessions.len(),
        num_nodes,
        sample_num,
        qty_edges: graph.qty_edges(),
        tsv_path: artifacts.tsv_path.clone(),
        artifacts,
        phase_durations: stopwatch.get_raw_durations().to_vec(),
    })
}

pub struct RebuildSettings {
    pub dataset_root: String,
    pub dataset: String,
    pub train_file: String,
    pub output_file: String,
}

impl RebuildSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        RebuildSettings {
            dataset_root: config.data.dataset_root.clone(),
            dataset: config.data.dataset.clone(),
            train_file: config.rebuild.train_file.clone(),
            output_file: config.rebuild.output_file.clone(),
        }
    }
}

#[derive(Debug)]
pub struct RebuildReport {
    pub qty_sessions: usize,
    pub output_path: PathBuf,
}

impl RebuildReport {
    pub fn summary(&self) -> String {
        format!(
            "Saved {} sessions to {}",
            self.qty_sessions,
            self.output_path.display()
        )
    }
}

/// Restores full sessions from the dataset's train split and stores them where
/// `run_build` looks for them.
pub fn run_rebuild(settings: &RebuildSettings) -> Result<RebuildReport> {
    if settings.output_file.trim().is_empty() {
        return Err(GraphError::Configuration(
            "output file name must not be empty".to_string(),
        ));
    }
    let dataset_dir = io::dataset_dir(&settings.dataset_root, &settings.dataset);
    let train_path = dataset_dir.join(&settings.train_file);
    let output_path = dataset_dir.join(&settings.output_file);

    let (prefixes, labels) = io::load_train_split(&train_path)?;
    let sessions = rebuild_sessions(&prefixes, &labels)?;
    io::save_sessions(&output_path, &sessions)?;
    info!(path = %output_path.display(), qty_sessions = sessions.len(), "saved rebuilt sessions");

    Ok(RebuildReport {
        qty_sessions: sessions.len(),
        output_path,
    })
}

