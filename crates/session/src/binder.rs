//! Binds a lesson's resource to a live editor.
//! 將課程文件綁定到可用的編輯器。

use tracing::debug;
use trainer_project::{Resource, WorkspaceId};

use crate::error::OpenError;
use crate::host::{EditorHandle, EditorHost};

/// Returns a live, focused editor for `resource`, reusing an open one when
/// possible. Workspace files are bound in their owning workspace; scratch
/// documents in `workspace`.
/// 取得 `resource` 的可編輯編輯器，優先沿用已開啟者。
pub fn bind_editor<H>(
    host: &mut H,
    workspace: &WorkspaceId,
    resource: &Resource,
) -> Result<EditorHandle, OpenError>
where
    H: EditorHost + ?Sized,
{
    let workspace = resource.workspace().unwrap_or(workspace);
    let reused = host
        .editors_for(workspace, resource)
        .into_iter()
        .find(EditorHandle::is_editable);
    let editor = match reused {
        Some(editor) => {
            debug!(editor = editor.id.0, resource = resource.name(), "reusing open editor");
            editor
        }
        None => host
            .open_editor(workspace, resource, true)?
            .into_iter()
            .find(EditorHandle::is_editable)
            .ok_or_else(|| OpenError::EditorUnavailable(resource.name().to_string()))?,
    };

    if host.is_disposed(&editor) {
        return Err(OpenError::EditorUnavailable(format!(
            "{} (editor already disposed)",
            resource.name()
        )));
    }
    host.focus_editor(&editor)?;
    Ok(editor)
}
