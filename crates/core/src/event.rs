use std::path::{Path, PathBuf};

use anyhow::Context;
use thiserror::Error;

use crate::refs::branch_name;

/// CI environment, captured once by the entrypoint.
#[derive(Debug, Clone, Default)]
pub struct ActionEnv {
    pub event_name: Option<String>,
    pub git_ref: Option<String>,
    pub base_ref: Option<String>,
    pub event_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CiEvent {
    Push { branch: String },
    PullRequest { branch: String, target: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("the branch could not be detected, are we running in a CI?")]
    MissingRef,
    #[error("couldn't extract the branch name from ref {0:?}")]
    MissingBranch(String),
    #[error("the target branch name could not be detected for this pull request")]
    MissingTargetBranch,
}

impl CiEvent {
    /// `Ok(None)` for events this action does not handle.
    pub fn resolve(env: &ActionEnv) -> Result<Option<Self>, PreconditionError> {
        let kind = env.event_name.as_deref().unwrap_or("");
        if kind != "push" && kind != "pull_request" {
            return Ok(None);
        }

        let git_ref = env
            .git_ref
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or(PreconditionError::MissingRef)?;
        let branch = branch_name(Some(git_ref))
            .ok_or_else(|| PreconditionError::MissingBranch(git_ref.to_string()))?;

        if kind == "push" {
            return Ok(Some(CiEvent::Push { branch }));
        }

        let target = env
            .event_path
            .as_deref()
            .and_then(|p| match pull_request_base_ref(p) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "failed to read event payload");
                    None
                }
            })
            .or_else(|| env.base_ref.clone())
            .filter(|t| !t.is_empty())
            .ok_or(PreconditionError::MissingTargetBranch)?;

        Ok(Some(CiEvent::PullRequest { branch, target }))
    }

    pub fn branch(&self) -> &str {
        match self {
            CiEvent::Push { branch } | CiEvent::PullRequest { branch, .. } => branch,
        }
    }
}

/// `pull_request.base.ref` from a webhook payload file.
pub fn pull_request_base_ref(path: &Path) -> anyhow::Result<Option<String>> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let v: serde_json::Value = serde_json::from_slice(&bytes).context("parse event payload")?;
    Ok(v.get("pull_request")
        .and_then(|pr| pr.get("base"))
        .and_then(|b| b.get("ref"))
        .and_then(|r| r.as_str())
        .map(|s| s.to_string()))
}
