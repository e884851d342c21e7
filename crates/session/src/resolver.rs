//! Locates or creates the backing document of a lesson.
//! 尋找或建立課程所用的文件。

use tracing::{debug, error};
use trainer_core::{lesson_file_name, LanguageId, Module, ModuleId};
use trainer_project::{Resource, Workspace};

use crate::error::OpenError;
use crate::host::Host;
use crate::registry::SessionRegistry;

/// Ephemeral mode: reuses the module's scratch document, or adopts/creates
/// one named `default_name`, tagged with `language`.
/// 暫存模式：沿用模組的暫存文件，或採用/建立名為 `default_name` 的文件。
pub fn resolve_scratch<H>(
    host: &mut H,
    registry: &mut SessionRegistry,
    module: &ModuleId,
    language: &LanguageId,
    default_name: &str,
) -> Result<Resource, OpenError>
where
    H: Host,
{
    if let Some(known) = registry.resource(module).cloned() {
        if !host.is_valid(&known) {
            debug!(module = %module, resource = known.name(), "dropping stale scratch mapping");
            registry.forget_resource(module);
        } else if known.is_scratch() {
            host.retag_scratch(&known, language)?;
            let mut resource = known;
            resource.set_language(language.clone());
            debug!(module = %module, resource = resource.name(), "reusing registered scratch document");
            registry.register_resource(module.clone(), resource.clone());
            return Ok(resource);
        }
    }

    let resource = match host.find_scratch(default_name) {
        Some(mut existing) if host.is_valid(&existing) => {
            host.close_editors(&existing);
            host.retag_scratch(&existing, language)?;
            existing.set_language(language.clone());
            debug!(resource = existing.name(), "adopting existing scratch document");
            existing
        }
        _ => {
            debug!(name = default_name, language = %language, "creating scratch document");
            host.create_scratch(default_name, language, "")?
        }
    };
    registry.register_resource(module.clone(), resource.clone());
    Ok(resource)
}

/// Persistent mode: finds `<Module>.<ext>` in the workspace content roots or
/// creates it under the first root. The mapping is registered only after
/// the file exists.
/// 持久模式：在內容根目錄尋找 `<模組>.<副檔名>`，找不到則於第一個根目錄建立。
pub fn resolve_in_workspace<H>(
    host: &mut H,
    registry: &mut SessionRegistry,
    module: &Module,
    language: &LanguageId,
    extension: &str,
    workspace: &Workspace,
) -> Result<Resource, OpenError>
where
    H: Host,
{
    if host.focused_workspace().as_ref() != Some(&workspace.id) {
        debug!(workspace = %workspace.id, "switching focus to tutorial workspace");
        host.focus_workspace(&workspace.id)?;
    }

    let name = lesson_file_name(Some(module), extension);
    let path = match host.find_content_entry(workspace, &name) {
        Some(path) => path,
        None => {
            let root = workspace.first_content_root().ok_or_else(|| {
                OpenError::WorkspaceUnavailable(format!(
                    "workspace {} has no content root",
                    workspace.id
                ))
            })?;
            host.create_content_file(root, &name).map_err(|source| {
                error!(file = %name, error = %source, "failed to create lesson file");
                OpenError::ResourceCreation {
                    name: name.clone(),
                    source,
                }
            })?
        }
    };

    let resource = Resource::file(path, language.clone(), workspace.id.clone());
    registry.register_resource(module.id().clone(), resource.clone());
    Ok(resource)
}
