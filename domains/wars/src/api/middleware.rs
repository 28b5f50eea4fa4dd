//! Wars domain state

use crate::service::WarService;

/// Application state for the wars domain
#[derive(Clone)]
pub struct WarsState {
    pub wars: WarService,
}
