use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mis_search::{default_workers, SearchError, SolverKind, Strategy};

pub const CONFIG_FILE: &str = "mis.toml";

/// The search configuration file structure (mis.toml)
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MisConfig {
    /// How each unit is searched
    pub search: SearchConfig,

    /// How a run is executed and where its output goes
    pub run: RunConfig,

    /// Directory the file was loaded from
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SearchConfig {
    pub solver: Option<SolverKind>,

    pub strategy: Option<Strategy>,

    /// Oracle time budget in seconds
    pub timeout: Option<f64>,

    pub max_combination_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunConfig {
    pub workers: Option<usize>,

    /// Relative paths are resolved against the directory of mis.toml
    pub output_dir: Option<PathBuf>,

    pub run_prefix: Option<String>,
}

impl MisConfig {
    /// Load configuration from mis.toml, searching upward from the given directory
    pub fn load(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE);

            if config_path.exists() {
                let content = std::fs::read_to_string(&config_path)
                    .with_context(|| format!("Failed to read {}", config_path.display()))?;
                let mut config: MisConfig = toml::from_str(&content)
                    .with_context(|| format!("Failed to parse {}", config_path.display()))?;
                config.base_dir = Some(current);
                return Ok(Some(config));
            }

            if !current.pop() {
                return Ok(None);
            }
        }
    }

    /// Load configuration by searching upward from the current working directory
    pub fn load_from_cwd() -> Result<Option<Self>> {
        let cwd = std::env::current_dir()?;
        Self::load(&cwd)
    }

    fn output_dir(&self) -> Option<PathBuf> {
        let dir = self.run.output_dir.as_ref()?;
        Some(match &self.base_dir {
            Some(base) if dir.is_relative() => base.join(dir),
            _ => dir.clone(),
        })
    }
}

/// Values given on the command line; `None` defers to env, file, default.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub solver: Option<SolverKind>,
    pub strategy: Option<Strategy>,
    pub timeout: Option<f64>,
    pub max_combination_size: Option<usize>,
    pub workers: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub run_prefix: Option<String>,
}

/// Effective settings after merging CLI > env > mis.toml > defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub solver: SolverKind,
    pub strategy: Strategy,
    pub timeout: Option<Duration>,
    pub max_combination_size: Option<usize>,
    pub workers: usize,
    pub output_dir: PathBuf,
    pub run_prefix: String,
}

fn env_parse<T: std::str::FromStr>(env: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>, SearchError> {
    match env(name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SearchError::Config(format!("{} has an invalid value '{}'", name, value))),
        None => Ok(None),
    }
}

fn seconds(value: f64) -> Result<Duration, SearchError> {
    Duration::try_from_secs_f64(value)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| SearchError::Config(format!("timeout must be a positive number of seconds, got {}", value)))
}

impl Settings {
    /// Merge the sources; `env` looks up an environment variable.
    pub fn resolve(
        file: Option<&MisConfig>,
        env: impl Fn(&str) -> Option<String>,
        cli: &Overrides,
    ) -> Result<Self, SearchError> {
        let workers = cli
            .workers
            .or(env_parse(&env, "MIS_WORKERS")?)
            .or(file.and_then(|c| c.run.workers))
            .unwrap_or_else(default_workers);
        if workers == 0 {
            return Err(SearchError::Config("workers must be at least 1".into()));
        }

        let timeout = cli
            .timeout
            .or(env_parse(&env, "MIS_TIMEOUT")?)
            .or(file.and_then(|c| c.search.timeout))
            .map(seconds)
            .transpose()?;

        let output_dir = cli
            .output_dir
            .clone()
            .or_else(|| env("MIS_OUTPUT_DIR").map(PathBuf::from))
            .or_else(|| file.and_then(MisConfig::output_dir))
            .unwrap_or_else(|| PathBuf::from("output"));

        Ok(Self {
            solver: cli
                .solver
                .or(file.and_then(|c| c.search.solver))
                .unwrap_or_default(),
            strategy: cli
                .strategy
                .or(file.and_then(|c| c.search.strategy))
                .unwrap_or_default(),
            timeout,
            max_combination_size: cli
                .max_combination_size
                .or(file.and_then(|c| c.search.max_combination_size)),
            workers,
            output_dir,
            run_prefix: cli
                .run_prefix
                .clone()
                .or_else(|| file.and_then(|c| c.run.run_prefix.clone()))
                .unwrap_or_else(|| "MAIN".to_string()),
        })
    }
}
