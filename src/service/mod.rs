pub mod http;

use crate::problem::{Bonus, BonusKind, Position, ProblemId};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

pub use http::HttpService;

/// Read side of the shared best-solution store.
pub trait BaselineStore: Send + Sync {
    /// Raw body of the best known solution; empty when there is none.
    fn fetch(&self, problem_id: ProblemId, bonuses: &[Bonus]) -> Result<String>;
}

pub trait Submitter: Send + Sync {
    fn submit(&self, problem_id: ProblemId, solution: &[u8]) -> Result<()>;
}

/// The three fields the store keys solutions on. Other catalog fields stay out
/// of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObtainedBonus {
    pub bonus: BonusKind,
    pub position: Position,
    pub problem: ProblemId,
}

impl From<&Bonus> for ObtainedBonus {
    fn from(b: &Bonus) -> Self {
        Self {
            bonus: b.kind,
            position: b.position,
            problem: b.problem,
        }
    }
}

/// Compact JSON, e.g. `[{"bonus":"GLOBALIST","position":3,"problem":7}]`.
pub fn obtained_bonus_json(bonuses: &[Bonus]) -> Result<String> {
    let wire: Vec<ObtainedBonus> = bonuses.iter().map(ObtainedBonus::from).collect();
    serde_json::to_string(&wire).with_context(|| "serializing obtained_bonus")
}

fn endpoint(base_url: &str, path: &str) -> Result<Url> {
    let raw = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&raw).with_context(|| format!("invalid service url: {raw}"))
}

/// `obtained_bonus` is only present for a non-empty subset; an empty subset is
/// a different query, not an empty list.
pub fn best_solution_url(
    base_url: &str,
    path: &str,
    problem_id: ProblemId,
    bonuses: &[Bonus],
) -> Result<Url> {
    let mut url = endpoint(base_url, path)?;
    let obtained = if bonuses.is_empty() {
        None
    } else {
        Some(obtained_bonus_json(bonuses)?)
    };
    {
        let mut q = url.query_pairs_mut();
        q.append_pair("problem_id", &problem_id.to_string());
        if let Some(obtained) = obtained.as_deref() {
            q.append_pair("obtained_bonus", obtained);
        }
    }
    Ok(url)
}

pub fn submit_url(base_url: &str, path: &str, problem_id: ProblemId) -> Result<Url> {
    let mut url = endpoint(base_url, path)?;
    url.query_pairs_mut()
        .append_pair("problem_id", &problem_id.to_string());
    Ok(url)
}
