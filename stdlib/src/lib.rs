pub mod cluster;
pub mod funcs;
pub mod verbs;

#[cfg(test)]
mod verbs_test;

use rk_core::{CommandRegistry, Result};

pub use cluster::{LabelSelector, ManifestCluster, Requirement};

/// Register the logged verbs: `pods`, `services`, `deployments`, `count_pods`, `new_app`.
pub fn register_stdlib_verbs(commands: &mut CommandRegistry) -> Result<()> {
    verbs::register(commands)
}

/// Register the plain functions: `getenv`, `import`.
pub fn register_stdlib_functions(commands: &mut CommandRegistry) -> Result<()> {
    funcs::register(commands)
}

/// A registry holding every stdlib command.
pub fn stdlib_commands() -> Result<CommandRegistry> {
    let mut commands = CommandRegistry::new();
    register_stdlib_verbs(&mut commands)?;
    register_stdlib_functions(&mut commands)?;
    Ok(commands)
}
