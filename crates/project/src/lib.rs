//! Tutorial workspace primitives: workspace snapshots, backing resources and
//! the persisted workspace location.
//! 教學工作區、課程文件與工作區位置紀錄的核心模組。

mod path_codec;
mod util;

pub mod location;
pub mod resource;
pub mod workspace;

pub use location::WorkspaceLocationStore;
pub use resource::{Resource, ResourceLocation};
pub use util::{create_file_atomic, find_in_content_roots, write_atomic};
pub use workspace::{
    create_workspace_dir, load_workspace_dir, Workspace, WorkspaceDescriptor, WorkspaceError,
    WorkspaceId, WorkspaceTemplate, DESCRIPTOR_FILE,
};
