/// Read-only view of the settings the embedding application owns.
///
/// The composer only ever reads from it; the host decides where the value comes from and when
/// it changes.
pub trait HostSettings: Send + Sync {
    /// Whether answers are grounded on the user's own data ("on your data" mode).
    fn data_grounding_enabled(&self) -> bool;
}

/// Settings fixed at startup, e.g. read once from the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticHostSettings {
    pub data_grounding_enabled: bool,
}

impl HostSettings for StaticHostSettings {
    fn data_grounding_enabled(&self) -> bool {
        self.data_grounding_enabled
    }
}
