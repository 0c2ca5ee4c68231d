use anyhow::Result;

use super::runtime::LoadedPolicy;

/// Prints the merged policy as YAML. The `provenance` map names the source
/// of every key.
pub fn cmd_policy(loaded: &LoadedPolicy) -> Result<()> {
    println!("# config: {}", loaded.path.display());
    print!("{}", serde_yaml::to_string(&loaded.policy)?);
    Ok(())
}
