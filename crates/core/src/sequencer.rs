// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Reset sequencing and ordered step execution.

use crate::decode::DEFAULT_DECODE_WINDOW_CYCLES;
use crate::scenario::{Step, StepResult, StepStatus};
use crate::signals::{Input, Output};
use crate::wishbone::{WishboneMaster, DEFAULT_ACK_TIMEOUT_CYCLES};
use crate::{HarnessError, HarnessResult, SignalSurface};
use labwired_config::TimingConfig;
use std::fmt;

pub const DEFAULT_RESET_SETTLE_NS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Init,
    ResetAsserted,
    ResetReleased,
    Running(usize),
    Passed,
    Failed,
}

impl SequencerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SequencerState::Passed | SequencerState::Failed)
    }
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequencerState::Init => f.write_str("INIT"),
            SequencerState::ResetAsserted => f.write_str("RESET_ASSERTED"),
            SequencerState::ResetReleased => f.write_str("RESET_RELEASED"),
            SequencerState::Running(i) => write!(f, "RUNNING({})", i),
            SequencerState::Passed => f.write_str("PASSED"),
            SequencerState::Failed => f.write_str("FAILED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchSettings {
    pub reset_settle_ns: u64,
    pub ack_timeout_cycles: u32,
    pub decode_window_cycles: u32,
}

impl Default for BenchSettings {
    fn default() -> Self {
        Self {
            reset_settle_ns: DEFAULT_RESET_SETTLE_NS,
            ack_timeout_cycles: DEFAULT_ACK_TIMEOUT_CYCLES,
            decode_window_cycles: DEFAULT_DECODE_WINDOW_CYCLES,
        }
    }
}

impl From<&TimingConfig> for BenchSettings {
    fn from(timing: &TimingConfig) -> Self {
        Self {
            reset_settle_ns: timing.reset_settle_ns,
            ack_timeout_cycles: timing.ack_timeout_cycles,
            decode_window_cycles: timing.decode_window_cycles,
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub name: String,
    pub state: SequencerState,
    pub results: Vec<StepResult>,
    pub failure: Option<HarnessError>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.state == SequencerState::Passed
    }
}

#[derive(Debug)]
pub struct Sequencer {
    name: String,
    settings: BenchSettings,
    master: WishboneMaster,
    steps: Vec<Step>,
    state: SequencerState,
    results: Vec<StepResult>,
    failure: Option<HarnessError>,
}

impl Sequencer {
    pub fn new(name: &str, settings: BenchSettings, steps: Vec<Step>) -> Self {
        Self {
            name: name.to_string(),
            settings,
            master: WishboneMaster::new(settings.ack_timeout_cycles),
            steps,
            state: SequencerState::Init,
            results: Vec::new(),
            failure: None,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn results(&self) -> &[StepResult] {
        &self.results
    }

    pub fn failure(&self) -> Option<&HarnessError> {
        self.failure.as_ref()
    }

    /// Perform exactly one transition. Terminal states do not move.
    pub fn advance<S: SignalSurface + ?Sized>(&mut self, surface: &mut S) -> SequencerState {
        let next = match self.state {
            SequencerState::Init => {
                for line in Input::ALL {
                    surface.drive(line, 0);
                }
                surface.drive(Input::Reset, 1);
                Ok(SequencerState::ResetAsserted)
            }
            SequencerState::ResetAsserted => surface
                .wait_ns(self.settings.reset_settle_ns)
                .map(|()| {
                    surface.drive(Input::Reset, 0);
                    SequencerState::ResetReleased
                }),
            SequencerState::ResetReleased => self.settle(surface).map(|()| self.after(None)),
            SequencerState::Running(i) => self.run_step(surface, i).map(|()| self.after(Some(i))),
            terminal => return terminal,
        };

        let next = next.unwrap_or_else(|e| {
            tracing::error!("{} failed in {}: {}", self.name, self.state, e);
            self.failure = Some(e);
            SequencerState::Failed
        });
        tracing::info!("{}: {} -> {}", self.name, self.state, next);
        self.state = next;
        next
    }

    /// Advance until PASSED or FAILED.
    pub fn run<S: SignalSurface + ?Sized>(mut self, surface: &mut S) -> RunReport {
        while !self.state.is_terminal() {
            self.advance(surface);
        }
        self.into_report()
    }

    pub fn into_report(self) -> RunReport {
        RunReport {
            name: self.name,
            state: self.state,
            results: self.results,
            failure: self.failure,
        }
    }

    fn settle<S: SignalSurface + ?Sized>(&self, surface: &mut S) -> HarnessResult<()> {
        surface.wait_ns(self.settings.reset_settle_ns)?;
        for line in [Input::Cyc, Input::Stb] {
            if surface.driven(line) != 0 {
                return Err(HarnessError::BusNotIdle { line: line.name() });
            }
        }
        if surface.sample(Output::Ack) != 0 {
            return Err(HarnessError::BusNotIdle {
                line: Output::Ack.name(),
            });
        }
        Ok(())
    }

    /// State following `completed`, or following reset when `None`.
    fn after(&self, completed: Option<usize>) -> SequencerState {
        let next = completed.map_or(0, |i| i + 1);
        if next < self.steps.len() {
            SequencerState::Running(next)
        } else {
            SequencerState::Passed
        }
    }

    fn run_step<S: SignalSurface + ?Sized>(&mut self, surface: &mut S, index: usize) -> HarnessResult<()> {
        let step = &self.steps[index];
        tracing::info!("Step {}/{}: {}", index + 1, self.steps.len(), step.name);

        let mut observed = Vec::new();
        let outcome = step.execute(
            surface,
            &self.master,
            self.settings.decode_window_cycles,
            &mut observed,
        );
        let status = match &outcome {
            Ok(()) => StepStatus::Pass,
            Err(e) => StepStatus::from(e),
        };
        tracing::info!("Step '{}' {}", step.name, status);
        self.results.push(StepResult {
            name: step.name.clone(),
            status,
            observed,
        });
        outcome
    }
}
