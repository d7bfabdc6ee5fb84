/// Events emitted during a simulation step.
/// The presentation layer consumes these for animation/sound/screen changes.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    CoinCollected { index: usize, score: u32 },
    FeatherCollected { index: usize, score: u32 },
    Jumped,
    Landed,
    LifeLost { lives_left: i32 },
    GameOver,
    GoalReached,
    LevelRebuilt,
    /// Hand control back to the menu collaborator.
    ReturnToMenu,
}
