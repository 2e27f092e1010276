use std::ffi::OsStr;
use std::fmt::Display;
use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;

use justconfig::error::ConfigError;
use justconfig::item::ValueExtractor;
use justconfig::processors::Trim;
use justconfig::sources::env::Env;
use justconfig::sources::text::ConfigText;
use justconfig::ConfPath;
use justconfig::Config;

use crate::config_processors::Unquote;
use crate::error::{GraphError, Result};

// Set some default values
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_DATASET_ROOT: &str = "datasets";
const DEFAULT_DATASET: &str = "diginetica";
const DEFAULT_SESSIONS_FILE: &str = "all_train_seq.bin";
const DEFAULT_SAMPLE_NUM: i64 = 12;
const DEFAULT_SHOW_PROGRESS: bool = true;
const DEFAULT_EXPORT_TSV: bool = false;
const DEFAULT_TRAIN_FILE: &str = "train.bin";
const DEFAULT_OUTPUT_FILE: &str = "all_train_seq.bin";

pub struct AppConfig {
    pub log: LogConfig,
    pub data: DataConfig,
    pub graph: GraphConfig,
    pub rebuild: RebuildConfig,
}

pub struct LogConfig {
    pub level: String,
}

pub struct DataConfig {
    pub dataset_root: String,
    pub dataset: String,
    pub sessions_file: String,
    /// Tab separated click log to read sessions from instead of the dataset's session file.
    pub click_log_path: Option<String>,
}

pub struct GraphConfig {
    /// Maximum neighbors kept per node. Validated when a build starts.
    pub sample_num: i64,
    pub show_progress: bool,
    pub export_tsv: bool,
}

pub struct RebuildConfig {
    pub train_file: String,
    pub output_file: String,
}

impl AppConfig {
    /// Defaults, then the config file (if one is named), then environment variables.
    /// Command line flags are applied on top by the binaries.
    pub fn new(config_path: Option<&str>) -> Result<AppConfig> {
        let mut conf = Config::default();

        if let Some(config_path) = config_path {
            let config_file = File::open(config_path)
                .map_err(|_| GraphError::MissingInput(PathBuf::from(config_path)))?;
            let config_text = ConfigText::new(config_file, config_path).map_err(|err| {
                GraphError::Configuration(format!(
                    "loading configuration file {} failed: {}",
                    config_path, err
                ))
            })?;
            conf.add_source(config_text);
        }

        let config_env = Env::new(&[
            (
                ConfPath::from(&["log", "level"]),
                OsStr::new("LOG_LEVEL"),
            ),
            (
                ConfPath::from(&["data", "dataset_root"]),
                OsStr::new("DATASET_ROOT"),
            ),
            (
                ConfPath::from(&["data", "dataset"]),
                OsStr::new("DATASET"),
            ),
            (
                ConfPath::from(&["graph", "sample_num"]),
                OsStr::new("SAMPLE_NUM"),
            ),
        ]);
        conf.add_source(config_env);

        AppConfig::parse(&conf)
    }

    fn parse(conf: &Config) -> Result<AppConfig> {
        Ok(AppConfig {
            log: LogConfig::parse(&Section::new(conf, "log")),
            data: DataConfig::parse(&Section::new(conf, "data")),
            graph: GraphConfig::parse(&Section::new(conf, "graph"))?,
            rebuild: RebuildConfig::parse(&Section::new(conf, "rebuild")),
        })
    }
}

impl LogConfig {
    fn parse(section: &Section) -> LogConfig {
        LogConfig {
            level: section.string("level", DEFAULT_LOG_LEVEL),
        }
    }
}

impl DataConfig {
    fn parse(section: &Section) -> DataConfig {
        DataConfig {
            dataset_root: section.string("dataset_root", DEFAULT_DATASET_ROOT),
            dataset: section.string("dataset", DEFAULT_DATASET),
            sessions_file: section.string("sessions_file", DEFAULT_SESSIONS_FILE),
            click_log_path: section.lookup("click_log_path"),
        }
    }
}

impl GraphConfig {
    fn parse(section: &Section) -> Result<GraphConfig> {
        Ok(GraphConfig {
            sample_num: section.parsed("sample_num", DEFAULT_SAMPLE_NUM)?,
            show_progress: section.parsed("show_progress", DEFAULT_SHOW_PROGRESS)?,
            export_tsv: section.parsed("export_tsv", DEFAULT_EXPORT_TSV)?,
        })
    }
}

impl RebuildConfig {
    fn parse(section: &Section) -> RebuildConfig {
        RebuildConfig {
            train_file: section.string("train_file", DEFAULT_TRAIN_FILE),
            output_file: section.string("output_file", DEFAULT_OUTPUT_FILE),
        }
    }
}

/// Parses a `sample_num` given on the command line.
pub fn parse_sample_num(raw: &str) -> Result<i64> {
    parse_setting("sample_num", raw)
}

struct Section<'a> {
    conf: &'a Config,
    name: &'static str,
}

impl<'a> Section<'a> {
    fn new(conf: &'a Config, name: &'static str) -> Self {
        Section { conf, name }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let value: std::result::Result<String, ConfigError> = self
            .conf
            .get(ConfPath::from(&[self.name, key]))
            .trim()
            .unquote()
            .value();
        value.ok()
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.lookup(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.lookup(key) {
            Some(raw) => parse_setting(&format!("{}.{}", self.name, key), &raw),
            None => Ok(default),
        }
    }
}

fn parse_setting<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse().map_err(|err: T::Err| {
        GraphError::Configuration(format!("invalid value {:?} for {}: {}", raw, key, err))
    })
}
