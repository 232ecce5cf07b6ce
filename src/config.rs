use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub run: Run,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub solver: Solver,
    #[serde(default)]
    pub service: Service,
    #[serde(default)]
    pub search: Search,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Run {
    pub n_threads: usize,
    pub dryrun_limit: usize,
}
impl Default for Run {
    fn default() -> Self {
        Self {
            n_threads: 8,
            dryrun_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub problems_dir: String,
    pub best_solutions_dir: String,
    pub work_root: String,
    pub results_log: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            problems_dir: "problems".into(),
            best_solutions_dir: "best_solutions".into(),
            work_root: "rsapg".into(),
            results_log: "run_sat_all_globalist.log".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Solver {
    pub glucose_path: String,
    pub evaluate_cmd: Vec<String>,
    pub hillclimber_cmd: Vec<String>,
    pub max_neighbor: u32,
    /// Written by the hill climber into its work dir after the last iteration.
    pub final_solution_file: String,
}
impl Default for Solver {
    fn default() -> Self {
        Self {
            glucose_path: "glucose".into(),
            evaluate_cmd: cargo_bin("evaluate"),
            hillclimber_cmd: cargo_bin("sat_hillclimber"),
            max_neighbor: 15,
            final_solution_file: "sol999999.json".into(),
        }
    }
}

fn cargo_bin(name: &str) -> Vec<String> {
    ["cargo", "run", "--release", "--bin", name, "--"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    pub base_url: String,
    pub best_solution_path: String,
    pub submit_path: String,
    /// 0 disables the request timeout.
    pub timeout_seconds: u64,
}
impl Default for Service {
    fn default() -> Self {
        Self {
            base_url: "https://icfpc.sx9.jp".into(),
            best_solution_path: "/best_solution".into(),
            submit_path: "/api/submit".into(),
            timeout_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Search {
    pub warn_globalist_over: usize,
}
impl Default for Search {
    fn default() -> Self {
        Self {
            warn_globalist_over: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: true,
            file_path: "logs/globalist-sweep.log".into(),
        }
    }
}
