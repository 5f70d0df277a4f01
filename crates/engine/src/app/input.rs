#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    RandomizeAgents,
    ClearAgents,
    IncreaseAgentCount,
    DecreaseAgentCount,
    CycleEnvironment,
    ZoomIn,
    ZoomOut,
    StartPlayback,
    PausePlayback,
    ToggleGrid,
    ToggleIds,
    Connect,
    Disconnect,
    ToggleHud,
    Quit,
}

impl ControlAction {
    pub fn is_window_action(self) -> bool {
        matches!(self, ControlAction::ToggleHud | ControlAction::Quit)
    }
}
