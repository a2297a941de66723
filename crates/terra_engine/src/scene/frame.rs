//! Frame pass sequencing
//!
//! The passes of a frame and their dependencies live in a [`NodeGraph`];
//! its topological order fixes the legal sequence once, at construction.
//! Passes may be skipped, but a frame can never move back to an earlier
//! pass before it returns to [`FramePhase::Idle`]. Passes are only tracked
//! between [`FrameSequencer::begin`] and [`FrameSequencer::finish`].

use crate::foundation::node_graph::NodeGraph;
use crate::render::{RenderError, RenderResult};

/// Pass the frame is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FramePhase {
    /// Between frames
    Idle,
    /// Depth-only render into the shadow map
    ShadowPass,
    /// Scene above the water into the reflection target
    WaterReflection,
    /// Scene below the water into the refraction target
    WaterRefraction,
    /// Scene, skybox and water into the screen or post target
    MainPass,
    /// Fullscreen effects
    PostProcess,
    /// 2D overlay
    GuiOverlay,
}

const PASSES: [FramePhase; 6] = [
    FramePhase::ShadowPass,
    FramePhase::WaterReflection,
    FramePhase::WaterRefraction,
    FramePhase::MainPass,
    FramePhase::PostProcess,
    FramePhase::GuiOverlay,
];

const DEPENDENCIES: [(FramePhase, FramePhase); 9] = [
    (FramePhase::ShadowPass, FramePhase::WaterReflection),
    (FramePhase::ShadowPass, FramePhase::WaterRefraction),
    (FramePhase::ShadowPass, FramePhase::MainPass),
    (FramePhase::WaterReflection, FramePhase::WaterRefraction),
    (FramePhase::WaterReflection, FramePhase::MainPass),
    (FramePhase::WaterRefraction, FramePhase::MainPass),
    (FramePhase::MainPass, FramePhase::PostProcess),
    (FramePhase::MainPass, FramePhase::GuiOverlay),
    (FramePhase::PostProcess, FramePhase::GuiOverlay),
];

/// Tracks the current pass and rejects out-of-order transitions
#[derive(Debug, Clone)]
pub struct FrameSequencer {
    order: Vec<FramePhase>,
    current: FramePhase,
    executed: Vec<FramePhase>,
    open: bool,
}

impl FrameSequencer {
    /// Build the pass order from the dependency graph
    pub fn new() -> RenderResult<Self> {
        let mut graph = NodeGraph::new();
        let keys: Vec<_> = PASSES.iter().map(|phase| graph.add_node(*phase)).collect();
        let key_of = |phase: FramePhase| PASSES.iter().position(|p| *p == phase).map(|i| keys[i]);
        for (from, to) in DEPENDENCIES {
            if let (Some(source), Some(target)) = (key_of(from), key_of(to)) {
                graph.add_output(source, target);
            }
        }

        let order = graph
            .topological_order()
            .ok_or_else(|| RenderError::InitializationFailed("frame pass graph has a cycle".to_string()))?
            .into_iter()
            .filter_map(|key| graph.get(key).copied())
            .collect::<Vec<_>>();
        log::debug!("Frame pass order: {:?}", order);

        Ok(Self {
            order,
            current: FramePhase::Idle,
            executed: Vec::new(),
            open: false,
        })
    }

    /// Legal pass order
    pub fn order(&self) -> &[FramePhase] {
        &self.order
    }

    /// Current pass
    pub const fn current(&self) -> FramePhase {
        self.current
    }

    /// Passes entered since the last [`FrameSequencer::begin`]
    pub fn executed(&self) -> &[FramePhase] {
        &self.executed
    }

    fn rank(&self, phase: FramePhase) -> usize {
        match phase {
            FramePhase::Idle => 0,
            _ => self.order.iter().position(|p| *p == phase).map_or(0, |i| i + 1),
        }
    }

    /// Whether a frame is in progress
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Start a frame; the previous one must have finished
    pub fn begin(&mut self) -> RenderResult<()> {
        if self.open {
            return Err(RenderError::PassOrder { from: self.current, to: FramePhase::Idle });
        }
        self.open = true;
        self.current = FramePhase::Idle;
        self.executed.clear();
        Ok(())
    }

    /// Move to `next`; a frame must be open and `next` must come after the
    /// current pass
    pub fn advance(&mut self, next: FramePhase) -> RenderResult<()> {
        if !self.open {
            return Err(RenderError::FrameNotStarted(next));
        }
        if next == FramePhase::Idle || self.rank(next) <= self.rank(self.current) {
            return Err(RenderError::PassOrder { from: self.current, to: next });
        }
        log::trace!("Frame pass {:?} -> {:?}", self.current, next);
        self.current = next;
        self.executed.push(next);
        Ok(())
    }

    /// Like [`FrameSequencer::advance`] inside a frame; outside one the
    /// pass is not tracked
    pub fn advance_if_open(&mut self, next: FramePhase) -> RenderResult<()> {
        if self.open {
            self.advance(next)
        } else {
            Ok(())
        }
    }

    /// Return to idle at the end of the frame
    pub fn finish(&mut self) {
        self.current = FramePhase::Idle;
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_follows_dependencies() {
        let sequencer = FrameSequencer::new().unwrap();
        assert_eq!(sequencer.order(), &PASSES);
    }

    #[test]
    fn test_skipping_is_legal() {
        let mut sequencer = FrameSequencer::new().unwrap();
        sequencer.begin().unwrap();
        sequencer.advance(FramePhase::MainPass).unwrap();
        sequencer.advance(FramePhase::GuiOverlay).unwrap();
        sequencer.finish();
        assert_eq!(sequencer.executed(), &[FramePhase::MainPass, FramePhase::GuiOverlay]);
        assert_eq!(sequencer.current(), FramePhase::Idle);
    }

    #[test]
    fn test_reordering_is_rejected() {
        let mut sequencer = FrameSequencer::new().unwrap();
        sequencer.begin().unwrap();
        sequencer.advance(FramePhase::MainPass).unwrap();
        let err = sequencer.advance(FramePhase::ShadowPass).unwrap_err();
        assert!(matches!(
            err,
            RenderError::PassOrder { from: FramePhase::MainPass, to: FramePhase::ShadowPass }
        ));
        assert!(sequencer.advance(FramePhase::MainPass).is_err());
        assert!(sequencer.begin().is_err());
    }

    #[test]
    fn test_passes_need_an_open_frame() {
        let mut sequencer = FrameSequencer::new().unwrap();
        assert!(!sequencer.is_open());
        assert!(matches!(
            sequencer.advance(FramePhase::WaterReflection),
            Err(RenderError::FrameNotStarted(FramePhase::WaterReflection))
        ));
        sequencer.advance_if_open(FramePhase::WaterReflection).unwrap();
        sequencer.advance_if_open(FramePhase::WaterReflection).unwrap();
        assert_eq!(sequencer.current(), FramePhase::Idle);
        assert!(sequencer.executed().is_empty());

        sequencer.begin().unwrap();
        assert!(sequencer.begin().is_err());
        sequencer.advance_if_open(FramePhase::ShadowPass).unwrap();
        assert_eq!(sequencer.executed(), &[FramePhase::ShadowPass]);
        sequencer.finish();
        assert!(!sequencer.is_open());
        sequencer.begin().unwrap();
    }
}
