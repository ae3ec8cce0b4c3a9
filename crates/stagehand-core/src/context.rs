//! Shared services threaded through every per-vertex context.

use std::sync::Arc;

use stagehand_ui::Ui;

use crate::directory::Directory;

/// The service bundle embedded in every app and infra context. Passed
/// explicitly; there are no ambient singletons.
#[derive(Clone)]
pub struct Shared {
    /// Backend storing data about this appfile across runs.
    pub directory: Arc<dyn Directory>,
    /// User interface the core and plugins report through.
    pub ui: Arc<dyn Ui>,
}
