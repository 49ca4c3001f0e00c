//! Recursive, dependency-first installation

use super::{Component, ComponentId, InitContext, InstallState, Required};
use crate::config::ConfigStore;
use crate::decorator::{self, Decorator};
use crate::error::{AppError, Result};
use crate::lifecycle::{BoxFuture, Context, Hook, Ledger};
use std::collections::HashMap;

/// Installs components out of a registry's component table
///
/// Borrows everything it touches from the registry for the duration of a
/// single `Registry::install` call.
pub(crate) struct Installer<'a> {
    pub components: &'a mut [Component],
    pub index: &'a HashMap<String, ComponentId>,
    pub ledger: &'a Ledger,
    pub decorators: &'a [Decorator],
    pub configs: &'a ConfigStore,
    pub installed: &'a mut Vec<ComponentId>,
}

impl Installer<'_> {
    /// Install a component after all of its required components
    ///
    /// Installed components are skipped. Meeting a component that is still
    /// `Installing` means it depends on itself through some path.
    pub fn install<'s>(
        &'s mut self,
        id: ComponentId,
        ctx: &'s Context,
    ) -> BoxFuture<'s, Result<()>> {
        Box::pin(async move {
            let component = &mut self.components[id];
            match component.state {
                InstallState::Installed => return Ok(()),
                InstallState::Installing => {
                    return Err(AppError::CircularDependency {
                        name: component.name.clone(),
                    });
                }
                InstallState::Uninstalled | InstallState::Failed => {}
            }
            component.state = InstallState::Installing;
            tracing::debug!("Installing: {}", component.name);

            let outcome = self.install_required_then_self(id, ctx).await;

            let component = &mut self.components[id];
            match outcome {
                Ok(()) => {
                    self.installed.push(id);
                    component.state = InstallState::Installed;
                    tracing::debug!("Installed: {}", component.name);
                    Ok(())
                }
                Err(e) => {
                    component.state = InstallState::Failed;
                    tracing::debug!("Install failed for {}: {}", component.name, e);
                    Err(e)
                }
            }
        })
    }

    async fn install_required_then_self(&mut self, id: ComponentId, ctx: &Context) -> Result<()> {
        let required = self.resolve(id)?;
        for dep in &required {
            self.install(*dep, ctx).await?;
        }
        self.install_self(id, &required, ctx).await
    }

    /// Map required names to components, once per component
    fn resolve(&mut self, id: ComponentId) -> Result<Vec<ComponentId>> {
        if let Some(resolved) = &self.components[id].resolved {
            return Ok(resolved.clone());
        }

        let resolved = self.components[id]
            .required_names
            .iter()
            .map(|name| {
                self.index
                    .get(name)
                    .copied()
                    .ok_or_else(|| AppError::UnregisteredDependency { name: name.clone() })
            })
            .collect::<Result<Vec<_>>>()?;

        self.components[id].resolved = Some(resolved.clone());
        Ok(resolved)
    }

    async fn install_self(
        &mut self,
        id: ComponentId,
        required: &[ComponentId],
        ctx: &Context,
    ) -> Result<()> {
        let required: HashMap<String, Required> = required
            .iter()
            .map(|dep| {
                let dep = &self.components[*dep];
                (
                    dep.name.clone(),
                    Required::new(dep.name.clone(), dep.active.instance.clone()),
                )
            })
            .collect();

        let component = &mut self.components[id];
        let base = component.base.clone().named(&component.name);
        let behavior = decorator::compose(
            self.decorators.iter().chain(component.decorators.iter()),
            base,
        );

        if let Some(init) = behavior.init.clone() {
            let init_ctx = InitContext::new(
                component.name.clone(),
                required,
                self.configs.get(&component.name),
                ctx.clone(),
            );
            init(init_ctx)
                .await
                .map_err(|source| AppError::Initialization {
                    component: component.name.clone(),
                    source,
                })?;
        }

        if !component.hooks_appended {
            self.ledger.append(Hook::from_fns(
                component.name.clone(),
                behavior.start.clone(),
                behavior.stop.clone(),
            ));
            component.hooks_appended = true;
        }

        if let Some(validate) = behavior.validate.clone() {
            validate().map_err(|source| AppError::Validation {
                component: component.name.clone(),
                source,
            })?;
        }

        component.active = behavior;
        Ok(())
    }
}
