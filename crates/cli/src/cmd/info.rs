use std::collections::BTreeMap;

use anyhow::Result;

use antimony_lib::eval::default_variables;
use antimony_lib::platform::Platform;

use crate::output::{OutputFormat, print_json, print_stat};

pub fn cmd_info(output: OutputFormat) -> Result<()> {
  let platform = Platform::current();
  let variables: BTreeMap<&str, String> = default_variables(platform)
    .into_iter()
    .map(|(name, value)| (name, value.as_str().unwrap_or_default().to_string()))
    .collect();

  if output.is_json() {
    return print_json(&serde_json::json!({
      "platform": platform.map(|p| p.to_string()),
      "triple": platform.map(|p| p.triple()),
      "variables": variables,
    }));
  }

  println!("System:");
  match platform {
    Some(platform) => {
      print_stat("Platform", &platform.to_string());
      print_stat("Triple", &platform.triple());
    }
    None => println!("Could not detect platform."),
  }
  println!("Variables:");
  for (name, value) in &variables {
    print_stat(name, value);
  }
  Ok(())
}
