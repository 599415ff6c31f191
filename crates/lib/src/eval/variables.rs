//! Predefined variables visible in every root scope.

use crate::platform::Platform;

use super::value::Value;

/// Version string reported through `antimony_version`.
pub const ANTIMONY_VERSION: &str = "00000000";

/// Names the evaluator seeds or gives meaning to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
  AntimonyVersion,
  BuildCpu,
  BuildOs,
  HostCpu,
  HostOs,
  TargetCpu,
  TargetOs,
  TargetName,
}

impl Variable {
  pub const ALL: [Variable; 8] = [
    Variable::AntimonyVersion,
    Variable::BuildCpu,
    Variable::BuildOs,
    Variable::HostCpu,
    Variable::HostOs,
    Variable::TargetCpu,
    Variable::TargetOs,
    Variable::TargetName,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      Variable::AntimonyVersion => "antimony_version",
      Variable::BuildCpu => "build_cpu",
      Variable::BuildOs => "build_os",
      Variable::HostCpu => "host_cpu",
      Variable::HostOs => "host_os",
      Variable::TargetCpu => "target_cpu",
      Variable::TargetOs => "target_os",
      Variable::TargetName => "target_name",
    }
  }

  /// The value seeded into root scopes, if this variable has one.
  ///
  /// `target_name` is only ever bound inside rule and template blocks.
  pub fn default_value(&self, platform: Option<Platform>) -> Option<Value> {
    match self {
      Variable::AntimonyVersion => Some(Value::from(ANTIMONY_VERSION)),
      Variable::BuildCpu | Variable::HostCpu | Variable::TargetCpu => {
        platform.map(|p| Value::from(p.arch.as_str()))
      }
      Variable::BuildOs | Variable::HostOs | Variable::TargetOs => {
        platform.map(|p| Value::from(p.os.as_str()))
      }
      Variable::TargetName => None,
    }
  }
}

/// All seeded `(name, value)` pairs for `platform`.
pub fn default_variables(platform: Option<Platform>) -> Vec<(&'static str, Value)> {
  Variable::ALL
    .iter()
    .filter_map(|variable| Some((variable.name(), variable.default_value(platform)?)))
    .collect()
}
