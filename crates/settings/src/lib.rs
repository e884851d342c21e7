pub mod trainer;

pub use trainer::{SettingsError, SettingsStore, TrainerSettings};
