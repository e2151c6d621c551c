use std::any::Any;

use async_trait::async_trait;

use crate::component::context::ComponentContext;
use crate::config::ConfigData;
use crate::kernel::error::Result;

/// The unit of composition.
///
/// Implementations describe themselves (name, defaults, dependencies,
/// packages) and provide the lifecycle hooks. The registry owns everything
/// else: the merged configuration, the lifecycle state and the attachment
/// table live on the [`ManagedComponent`](crate::component::ManagedComponent)
/// wrapping the implementation.
///
/// Hooks take `&self`; components keep mutable runtime state behind their own
/// interior mutability.
#[async_trait]
pub trait Component: Any + Send + Sync {
    /// Registry name. Defaults to the kebab-cased type name without a
    /// trailing `Component`, e.g. `HttpServerComponent` becomes `http-server`.
    fn name(&self) -> String {
        component_name_from_type(std::any::type_name::<Self>())
    }

    /// Built-in configuration that caller overrides are merged into.
    fn default_config(&self) -> ConfigData {
        ConfigData::new()
    }

    /// Dotted configuration paths that must be present after merging.
    /// A non-empty list makes the component strictly configured.
    fn required_config(&self) -> Vec<String> {
        Vec::new()
    }

    /// Names of the components that must be running before `run` starts.
    /// Read once at registration.
    fn requirements(&self) -> Vec<String> {
        Vec::new()
    }

    /// External packages needed before `run`. Read once at registration.
    fn packages(&self) -> Vec<String> {
        Vec::new()
    }

    /// Prepare internal state that does not depend on other components.
    /// Called at most once; must not block.
    fn init(&self, _ctx: &ComponentContext) -> Result<()> {
        Ok(())
    }

    /// Become ready. Returning `Ok` releases dependents.
    async fn run(&self, ctx: &ComponentContext) -> Result<()>;

    /// Release resources. Safe to call even if `run` never completed.
    async fn stop(&self, _ctx: &ComponentContext) -> Result<()> {
        Ok(())
    }
}

/// Derive a registry name from a Rust type path.
pub fn component_name_from_type(type_name: &str) -> String {
    let without_generics = type_name.split('<').next().unwrap_or(type_name);
    let last = without_generics.rsplit("::").next().unwrap_or(without_generics);
    let base = match last.strip_suffix("Component") {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => last,
    };

    let chars: Vec<char> = base.chars().collect();
    let mut name = String::with_capacity(base.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                name.push('-');
            }
        }
        name.extend(ch.to_lowercase());
    }
    name.replace('_', "-")
}
