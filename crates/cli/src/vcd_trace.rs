// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use labwired_core::signals::{Input, Output};
use labwired_core::{HarnessError, HarnessResult, SignalSurface};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use vcd::{IdCode, TimescaleUnit, Value, Writer};

/// Records every harness line into a VCD file while forwarding to `inner`.
///
/// Values are dumped whenever the harness drives a line and after every clock
/// edge or timed wait, with the timestamp taken from the wrapped surface.
pub struct VcdSurface<S> {
    inner: S,
    writer: Writer<BufWriter<File>>,
    input_ids: Vec<IdCode>,
    output_ids: Vec<IdCode>,
    last_inputs: [Option<u128>; Input::ALL.len()],
    last_outputs: [Option<u128>; Output::ALL.len()],
    last_time: Option<u64>,
    broken: Option<String>,
}

impl<S: SignalSurface> VcdSurface<S> {
    pub fn create(inner: S, path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path)?;
        let mut writer = Writer::new(BufWriter::new(file));

        writer.timescale(1, TimescaleUnit::NS)?;
        writer.add_module("harness")?;
        let input_ids = Input::ALL
            .iter()
            .map(|line| writer.add_wire(line.width(), line.name()))
            .collect::<io::Result<Vec<_>>>()?;
        writer.upscope()?;

        writer.add_module("user_project")?;
        let output_ids = Output::ALL
            .iter()
            .map(|line| writer.add_wire(line.width(), line.name()))
            .collect::<io::Result<Vec<_>>>()?;
        writer.upscope()?;
        writer.enddefinitions()?;

        let mut surface = Self {
            inner,
            writer,
            input_ids,
            output_ids,
            last_inputs: [None; Input::ALL.len()],
            last_outputs: [None; Output::ALL.len()],
            last_time: None,
            broken: None,
        };
        surface.dump()?;
        Ok(surface)
    }

    fn stamp(&mut self) -> io::Result<()> {
        let now = self.inner.time_ns();
        if self.last_time != Some(now) {
            self.writer.timestamp(now)?;
            self.last_time = Some(now);
        }
        Ok(())
    }

    fn write_input(&mut self, line: Input) -> io::Result<()> {
        let value = self.inner.driven(line);
        if self.last_inputs[line.index()] == Some(value) {
            return Ok(());
        }
        self.stamp()?;
        write_value(&mut self.writer, self.input_ids[line.index()], value, line.width())?;
        self.last_inputs[line.index()] = Some(value);
        Ok(())
    }

    fn write_output(&mut self, line: Output) -> io::Result<()> {
        let value = self.inner.sample(line);
        if self.last_outputs[line.index()] == Some(value) {
            return Ok(());
        }
        self.stamp()?;
        write_value(&mut self.writer, self.output_ids[line.index()], value, line.width())?;
        self.last_outputs[line.index()] = Some(value);
        Ok(())
    }

    fn dump(&mut self) -> io::Result<()> {
        for line in Input::ALL {
            self.write_input(line)?;
        }
        for line in Output::ALL {
            self.write_output(line)?;
        }
        Ok(())
    }

    fn check(&mut self, result: io::Result<()>) -> HarnessResult<()> {
        if let Err(e) = result {
            self.broken.get_or_insert_with(|| e.to_string());
        }
        match &self.broken {
            Some(e) => Err(HarnessError::Surface(format!("VCD trace write failed: {}", e))),
            None => Ok(()),
        }
    }
}

fn write_value(writer: &mut Writer<BufWriter<File>>, id: IdCode, value: u128, width: u32) -> io::Result<()> {
    if width == 1 {
        return writer.change_scalar(id, if value & 1 == 1 { Value::V1 } else { Value::V0 });
    }
    writer.change_vector(id, u128_to_vec(value, width))
}

// MSB first
fn u128_to_vec(val: u128, width: u32) -> Vec<Value> {
    (0..width)
        .rev()
        .map(|i| if (val >> i) & 1 == 1 { Value::V1 } else { Value::V0 })
        .collect()
}

impl<S> std::fmt::Debug for VcdSurface<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VcdSurface")
    }
}

impl<S: SignalSurface> SignalSurface for VcdSurface<S> {
    fn drive(&mut self, line: Input, value: u128) {
        self.inner.drive(line, value);
        if let Err(e) = self.write_input(line) {
            tracing::warn!("VCD: failed to record {}: {}", line, e);
            self.broken.get_or_insert_with(|| e.to_string());
        }
    }

    fn driven(&self, line: Input) -> u128 {
        self.inner.driven(line)
    }

    fn sample(&self, line: Output) -> u128 {
        self.inner.sample(line)
    }

    fn rising_edge(&mut self) -> HarnessResult<()> {
        self.inner.rising_edge()?;
        let result = self.dump();
        self.check(result)
    }

    fn wait_ns(&mut self, ns: u64) -> HarnessResult<()> {
        // Only the state at the end of the wait is recorded.
        self.inner.wait_ns(ns)?;
        let result = self.dump();
        self.check(result)
    }

    fn time_ns(&self) -> u64 {
        self.inner.time_ns()
    }
}
