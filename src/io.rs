use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_derive::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{GraphError, Result};
use crate::graph::{GlobalGraph, ItemId, Session, Weight};

pub type TrainingSessionId = u64;
pub type Time = f64;

/// Prefix sequences and their next-item labels, the flattened supervised training form.
pub type TrainSplit = (Vec<Session>, Vec<ItemId>);

#[derive(Debug, Deserialize)]
struct ClickRecord {
    #[serde(rename = "SessionId")]
    session_id: TrainingSessionId,
    #[serde(rename = "ItemId")]
    item_id: ItemId,
    #[serde(rename = "Time")]
    time: Time,
}

/// Where a persisted graph landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphArtifacts {
    pub adjacency_path: PathBuf,
    pub weights_path: PathBuf,
    pub tsv_path: Option<PathBuf>,
}

const TMP_SUFFIX: &str = ".tmp";
const BACKUP_SUFFIX: &str = ".bak";

pub fn dataset_dir(dataset_root: &str, dataset: &str) -> PathBuf {
    Path::new(dataset_root).join(dataset)
}

pub fn adjacency_file_name(sample_num: usize) -> String {
    format!("adj_{}.bin", sample_num)
}

pub fn weights_file_name(sample_num: usize) -> String {
    format!("num_{}.bin", sample_num)
}

pub fn graph_tsv_file_name(sample_num: usize) -> String {
    format!("graph_{}.tsv", sample_num)
}

pub fn load_sessions(path: &Path) -> Result<Vec<Session>> {
    let sessions: Vec<Session> = read_bincode(path)?;
    debug!(path = %path.display(), qty_sessions = sessions.len(), "loaded sessions");
    Ok(sessions)
}

/// Persists sessions in the format `load_sessions` reads, creating the parent directory.
pub fn save_sessions(path: &Path, sessions: &[Session]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .ok_or_else(|| {
            GraphError::Configuration(format!(
                "output path {} has no parent directory",
                path.display()
            ))
        })?;
    if path.file_name().is_none() {
        return Err(GraphError::Configuration(format!(
            "output path {} does not name a file",
            path.display()
        )));
    }
    fs::create_dir_all(parent).map_err(|source| GraphError::io(parent, source))?;
    write_bincode(path, &sessions)
}

pub fn load_train_split(path: &Path) -> Result<TrainSplit> {
    read_bincode(path)
}

pub fn save_train_split(path: &Path, prefixes: &[Session], labels: &[ItemId]) -> Result<()> {
    write_bincode(path, &(prefixes, labels))
}

/// Writes all graph artifacts or none of them.
///
/// Every artifact (the edge list export included, when requested) goes to a temporary
/// sibling first. Only after all of them were written completely are they moved into place,
/// and a failure while moving restores whatever the targets held before.
pub fn save_graph(
    dataset_dir: &Path,
    sample_num: usize,
    graph: &GlobalGraph,
    export_tsv: bool,
) -> Result<GraphArtifacts> {
    fs::create_dir_all(dataset_dir).map_err(|source| GraphError::io(dataset_dir, source))?;

    let artifacts = GraphArtifacts {
        adjacency_path: dataset_dir.join(adjacency_file_name(sample_num)),
        weights_path: dataset_dir.join(weights_file_name(sample_num)),
        tsv_path: if export_tsv {
            Some(dataset_dir.join(graph_tsv_file_name(sample_num)))
        } else {
            None
        },
    };

    let mut staged: Vec<(PathBuf, PathBuf)> = vec![
        (sibling(&artifacts.adjacency_path, TMP_SUFFIX), artifacts.adjacency_path.clone()),
        (sibling(&artifacts.weights_path, TMP_SUFFIX), artifacts.weights_path.clone()),
    ];
    if let Some(tsv_path) = &artifacts.tsv_path {
        staged.push((sibling(tsv_path, TMP_SUFFIX), tsv_path.clone()));
    }

    let written = write_bincode(&staged[0].0, &graph.adjacency)
        .and_then(|_| write_bincode(&staged[1].0, &graph.weights))
        .and_then(|_| match staged.get(2) {
            Some((tsv_tmp, _)) => write_graph_tsv(tsv_tmp, graph),
            None => Ok(()),
        })
        .and_then(|_| commit(&staged));

    if let Err(err) = written {
        // The temporaries may not exist yet.
        for (staged_path, _) in &staged {
            let _ = fs::remove_file(staged_path);
        }
        return Err(err);
    }

    info!(
        adjacency = %artifacts.adjacency_path.display(),
        weights = %artifacts.weights_path.display(),
        "saved global graph"
    );
    Ok(artifacts)
}

/// Moves every `(staged, target)` pair into place as one unit.
///
/// Targets that exist but are not regular files are refused before anything moves. A
/// replaced target is parked as a backup until all moves succeeded; if one move fails,
/// the targets moved so far are put back the way they were.
fn commit(renames: &[(PathBuf, PathBuf)]) -> Result<()> {
    for (_, target) in renames {
        if target.exists() && !target.is_file() {
            return Err(GraphError::io(
                target,
                io::Error::new(io::ErrorKind::Other, "target exists and is not a regular file"),
            ));
        }
    }

    let mut committed: Vec<(&Path, Option<PathBuf>)> = Vec::with_capacity(renames.len());
    for (staged, target) in renames {
        let backup = if target.is_file() {
            let backup = sibling(target, BACKUP_SUFFIX);
            if let Err(err) = rename(target, &backup) {
                roll_back(&committed);
                return Err(err);
            }
            Some(backup)
        } else {
            None
        };

        if let Err(err) = rename(staged, target) {
            if let Some(backup) = &backup {
                let _ = fs::rename(backup, target);
            }
            roll_back(&committed);
            return Err(err);
        }
        committed.push((target.as_path(), backup));
    }

    for (_, backup) in committed {
        if let Some(backup) = backup {
            let _ = fs::remove_file(backup);
        }
    }
    Ok(())
}

fn roll_back(committed: &[(&Path, Option<PathBuf>)]) {
    for (target, backup) in committed.iter().rev() {
        match backup {
            Some(backup) => {
                let _ = fs::rename(backup, target);
            }
            None => {
                let _ = fs::remove_file(target);
            }
        }
    }
    if !committed.is_empty() {
        warn!(qty = committed.len(), "rolled back partially saved graph artifacts");
    }
}

pub fn load_graph(dataset_dir: &Path, sample_num: usize) -> Result<GlobalGraph> {
    let adjacency: Vec<Vec<ItemId>> =
        read_bincode(&dataset_dir.join(adjacency_file_name(sample_num)))?;
    let weights: Vec<Vec<Weight>> = read_bincode(&dataset_dir.join(weights_file_name(sample_num)))?;

    let parallel = adjacency.len() == weights.len()
        && adjacency
            .iter()
            .zip(weights.iter())
            .all(|(neighbors, counts)| neighbors.len() == counts.len());
    if !parallel {
        return Err(GraphError::InvalidInput(format!(
            "adjacency and weight artifacts in {} are not parallel",
            dataset_dir.display()
        )));
    }
    Ok(GlobalGraph { adjacency, weights })
}

/// Reads a tab separated click log with a `SessionId ItemId Time` header into sessions.
///
/// Items of a session are ordered by time, equal times keep file order. Sessions come out
/// in ascending session id order so the resulting corpus does not depend on hashing.
pub fn read_click_log(path: &Path) -> Result<Vec<Session>> {
    let file = open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(BufReader::new(file));

    let mut clicks: Vec<(TrainingSessionId, (ItemId, Time))> = Vec::new();
    for result in reader.deserialize() {
        let click: ClickRecord = result.map_err(|err| {
            GraphError::InvalidInput(format!("malformed click log {}: {}", path.display(), err))
        })?;
        clicks.push((click.session_id, (click.item_id, click.time)));
    }
    let qty_clicks = clicks.len();

    let mut sessions_by_id: Vec<(TrainingSessionId, Session)> = clicks
        .into_iter()
        .into_group_map()
        .into_iter()
        .map(|(session_id, mut items_with_time)| {
            items_with_time.sort_by(|(_, time_a), (_, time_b)| time_a.total_cmp(time_b));
            let session_items: Session = items_with_time
                .into_iter()
                .map(|(item, _time)| item)
                .collect();
            (session_id, session_items)
        })
        .collect();
    sessions_by_id.sort_unstable_by_key(|(session_id, _)| *session_id);

    info!(
        path = %path.display(),
        qty_clicks,
        qty_sessions = sessions_by_id.len(),
        "read click log"
    );
    Ok(sessions_by_id
        .into_iter()
        .map(|(_session_id, session)| session)
        .collect())
}

/// One `node neighbor weight` row per retained entry, for inspection outside of Rust.
pub fn write_graph_tsv(path: &Path, graph: &GlobalGraph) -> Result<()> {
    let file = File::create(path).map_err(|source| GraphError::io(path, source))?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(BufWriter::new(file));

    writer.write_record(&["node", "neighbor", "weight"])?;
    for (node, neighbor, weight) in graph.edges() {
        writer.write_record(&[node.to_string(), neighbor.to_string(), weight.to_string()])?;
    }
    writer.flush().map_err(|source| GraphError::io(path, source))?;
    debug!(path = %path.display(), qty_edges = graph.qty_edges(), "exported graph as tsv");
    Ok(())
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => GraphError::MissingInput(path.to_path_buf()),
        _ => GraphError::io(path, source),
    })
}

fn read_bincode<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = open(path)?;
    bincode::deserialize_from(BufReader::new(file)).map_err(|source| GraphError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn write_bincode<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|source| GraphError::io(path, source))?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, value).map_err(|source| GraphError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|source| GraphError::io(path, source))
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|source| GraphError::io(to, source))
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut file_name: OsString = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    file_name.push(suffix);
    path.with_file_name(file_name)
}
