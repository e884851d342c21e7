//! Finds, reuses or creates the dedicated tutorial workspace.
//! 尋找、沿用或建立教學工作區。

use tracing::{debug, info, warn};
use trainer_project::{Workspace, WorkspaceId};

use crate::host::{Host, HostError};
use crate::language::LanguageSupport;
use crate::registry::SessionRegistry;

/// Inputs of one initializer run.
#[derive(Debug, Clone, Copy)]
pub struct InitRequest<'a> {
    /// Caller's current workspace; prompting only happens when present.
    pub hint: Option<&'a WorkspaceId>,
    pub tutorial_name: &'a str,
    pub headless: bool,
}

/// Ensures a tutorial workspace exists and records it as authoritative.
///
/// Returns `Ok(None)` when the user declines to open a new workspace; the
/// registry is untouched in that case.
/// 確保教學工作區存在並登記為權威工作區；使用者拒絕時回傳 `Ok(None)`。
pub fn ensure_workspace<H>(
    host: &mut H,
    registry: &mut SessionRegistry,
    language: &dyn LanguageSupport,
    request: InitRequest<'_>,
) -> Result<Option<Workspace>, HostError>
where
    H: Host,
{
    let mut found = None;
    for candidate in host.open_workspaces() {
        if !candidate.is_named(request.tutorial_name) || candidate.disposed {
            continue;
        }
        if request.headless {
            debug!(workspace = %candidate.id, "adopting open tutorial workspace");
            registry.record_workspace(&candidate);
            return Ok(Some(candidate));
        }
        found = Some(candidate);
    }

    let workspace = match found {
        Some(open) if open.base_path.is_some() => {
            debug!(workspace = %open.id, "reusing open tutorial workspace");
            open
        }
        _ => {
            if !request.headless {
                if let Some(hint) = request.hint {
                    if !host.confirm_new_workspace(Some(hint)) {
                        info!("user declined to open the tutorial workspace");
                        return Ok(None);
                    }
                }
            }
            let workspace = open_or_create(host, registry, language, request.tutorial_name)?;
            language.configure_workspace(host, &workspace)?;
            host.workspace(&workspace.id).unwrap_or(workspace)
        }
    };

    registry.record_workspace(&workspace);
    info!(
        workspace = %workspace.id,
        path = ?workspace.base_path,
        "tutorial workspace established"
    );
    Ok(Some(workspace))
}

fn open_or_create<H>(
    host: &mut H,
    registry: &SessionRegistry,
    language: &dyn LanguageSupport,
    name: &str,
) -> Result<Workspace, HostError>
where
    H: Host,
{
    if let Some(path) = registry.workspace_path() {
        match host.load_workspace(path) {
            Ok(workspace) => {
                debug!(path = %path.display(), "loaded tutorial workspace from recorded path");
                return Ok(workspace);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "recorded tutorial workspace could not be loaded; creating a new one");
            }
        }
    }
    let template = language.workspace_template(name);
    host.create_workspace(&template)
}
