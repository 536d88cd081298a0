//! Physical index naming, settings and the zero-downtime lifecycle.

mod lifecycle;
mod naming;
mod settings;

pub use lifecycle::{IndexLifecycleManager, PhysicalIndex};
pub use naming::{DEFAULT_INDEX_SUFFIX_PATTERN, IndexNaming, ParsedIndexName};
pub use settings::{IndexSettingsConfig, LogicalIndex};
