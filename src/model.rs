// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Transient records parsed from git and az output (branches, repos, variable groups, work items)
// role: model/types
// outputs: Plain structs with placeholder-friendly fields; no persistence
// invariants: Missing upstream fields are represented by placeholders or None, never by errors
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
  Local,
  Remote,
}

impl fmt::Display for BranchKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BranchKind::Local => f.write_str("local"),
      BranchKind::Remote => f.write_str("remote"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
  /// Short ref name, e.g. `main` or `origin/feature/x`.
  pub name: String,
  pub kind: BranchKind,
  /// Committer date formatted `%Y-%m-%d %H:%M`.
  pub date: String,
}

impl Branch {
  /// Local name a remote branch would get on tracking checkout (`origin/a/b` → `a/b`).
  pub fn local_name(&self) -> &str {
    match self.kind {
      BranchKind::Remote => self.name.split_once('/').map(|(_, rest)| rest).unwrap_or(&self.name),
      BranchKind::Local => &self.name,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureRepo {
  pub name: String,
  pub remote_url: String,
  pub id: Option<String>,
  pub project_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupVariable {
  pub name: String,
  pub value: String,
  pub is_secret: bool,
}

impl GroupVariable {
  pub fn display_value(&self) -> &str {
    if self.is_secret {
      "******"
    } else {
      &self.value
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableGroup {
  pub id: String,
  pub name: String,
  pub description: String,
  pub variables: Vec<GroupVariable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkItem {
  pub id: u64,
  pub kind: String,
  pub title: String,
  pub state: String,
  pub area_path: Option<String>,
  pub iteration_path: Option<String>,
  pub child_ids: Vec<u64>,
}

/// Organization/project/repository coordinates parsed from an Azure DevOps remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureRemote {
  pub organization: String,
  pub project: String,
  pub repository: String,
}
