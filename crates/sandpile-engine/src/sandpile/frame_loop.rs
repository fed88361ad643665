use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use crate::core::FrameStatus;

use super::ping_pong::{BufferIndex, PingPong, Step};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    /// Waiting for the next cycle.
    Idle,
    /// Inside a render cycle.
    Rendering,
    /// A quit signal or a lost surface ended the loop.
    Terminated,
}

/// Window events as the frame loop sees them.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopEvent {
    Quit,
    Other,
}

impl LoopEvent {
    /// Close requests and Escape presses quit.
    pub fn from_window_event(event: &WindowEvent) -> Self {
        match event {
            WindowEvent::CloseRequested => LoopEvent::Quit,
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => LoopEvent::Quit,
            _ => LoopEvent::Other,
        }
    }
}

/// Ping-pong bookkeeping for the render loop.
///
/// Each cycle simulates from `current` into `target`, displays `target` and
/// presents. Only a presented cycle promotes `target` to `current`.
#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    ping_pong: PingPong,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            ping_pong: PingPong::new(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn current(&self) -> BufferIndex {
        self.ping_pong.current()
    }

    /// Presented cycles so far.
    pub fn frames(&self) -> u64 {
        self.ping_pong.flips()
    }

    pub fn handle(&mut self, event: LoopEvent) -> LoopState {
        if event == LoopEvent::Quit && self.state != LoopState::Terminated {
            log::debug!("quit requested after {} frames", self.frames());
            self.state = LoopState::Terminated;
        }
        self.state
    }

    /// Runs one cycle unless the loop has terminated.
    ///
    /// Returns `None` without calling `cycle` once terminated.
    pub fn render<F>(&mut self, cycle: F) -> Option<FrameStatus>
    where
        F: FnOnce(Step) -> FrameStatus,
    {
        if self.state == LoopState::Terminated {
            return None;
        }

        self.state = LoopState::Rendering;
        let status = cycle(self.ping_pong.step());

        self.state = match status {
            FrameStatus::Presented => {
                self.ping_pong.flip();
                LoopState::Idle
            }
            FrameStatus::Skipped => LoopState::Idle,
            FrameStatus::Lost => LoopState::Terminated,
        };
        Some(status)
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandpile::grid::{Grid, GridSize};

    #[test]
    fn starts_idle_on_first_buffer() {
        let fl = FrameLoop::new();
        assert_eq!(fl.state(), LoopState::Idle);
        assert_eq!(fl.current(), BufferIndex::First);
    }

    #[test]
    fn cycle_sees_complementary_roles() {
        let mut fl = FrameLoop::new();
        for _ in 0..4 {
            let before = fl.current();
            fl.render(|step| {
                assert_eq!(step.current, before);
                assert_eq!(step.target, before.other());
                FrameStatus::Presented
            });
            assert_eq!(fl.current(), before.other());
        }
    }

    #[test]
    fn current_is_frame_count_mod_two() {
        let mut fl = FrameLoop::new();
        for n in 1..=9u64 {
            fl.render(|_| FrameStatus::Presented);
            assert_eq!(fl.frames(), n);
            assert_eq!(fl.current().as_usize() as u64, n % 2);
        }
    }

    #[test]
    fn skipped_frame_does_not_flip() {
        let mut fl = FrameLoop::new();
        assert_eq!(fl.render(|_| FrameStatus::Skipped), Some(FrameStatus::Skipped));
        assert_eq!(fl.current(), BufferIndex::First);
        assert_eq!(fl.frames(), 0);
        assert_eq!(fl.state(), LoopState::Idle);
    }

    #[test]
    fn lost_surface_terminates() {
        let mut fl = FrameLoop::new();
        assert_eq!(fl.render(|_| FrameStatus::Lost), Some(FrameStatus::Lost));
        assert_eq!(fl.state(), LoopState::Terminated);
        assert_eq!(fl.current(), BufferIndex::First);
        assert_eq!(fl.render(|_| panic!("cycle after termination")), None);
    }

    #[test]
    fn quit_mid_loop_stops_further_cycles() {
        let mut fl = FrameLoop::new();
        let mut cycles = 0;
        for _ in 0..3 {
            fl.render(|_| {
                cycles += 1;
                FrameStatus::Presented
            });
        }

        assert_eq!(fl.handle(LoopEvent::Quit), LoopState::Terminated);
        for _ in 0..3 {
            let ran = fl.render(|_| {
                cycles += 1;
                FrameStatus::Presented
            });
            assert_eq!(ran, None);
        }
        assert_eq!(cycles, 3);
        assert_eq!(fl.frames(), 3);
    }

    #[test]
    fn other_events_keep_loop_running() {
        let mut fl = FrameLoop::new();
        assert_eq!(fl.handle(LoopEvent::Other), LoopState::Idle);
        assert!(fl.render(|_| FrameStatus::Presented).is_some());
    }

    #[test]
    fn close_request_is_quit() {
        assert_eq!(LoopEvent::from_window_event(&WindowEvent::CloseRequested), LoopEvent::Quit);
        assert_eq!(
            LoopEvent::from_window_event(&WindowEvent::Focused(true)),
            LoopEvent::Other
        );
    }

    /// Drives the loop against two CPU grids standing in for the GPU buffers.
    #[test]
    fn mock_cycles_step_the_seeded_grid() {
        let seed = Grid::seeded(GridSize::default());
        let mut buffers = [seed.clone(), seed.clone()];
        let mut fl = FrameLoop::new();
        let mut displayed = Vec::new();

        for _ in 0..3 {
            fl.render(|step| {
                let next = buffers[step.current.as_usize()].step();
                buffers[step.target.as_usize()] = next;
                displayed.push(buffers[step.target.as_usize()].clone());
                FrameStatus::Presented
            });
        }

        assert_eq!(fl.current(), BufferIndex::Second);
        assert_eq!(displayed[0], seed.step());
        assert_eq!(displayed[1], seed.step().step());
        assert_eq!(displayed[2], seed.step().step().step());
        assert_eq!(buffers[fl.current().as_usize()], displayed[2]);
    }
}
