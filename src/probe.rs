/*
 * Copyright (c) 2024 Yunshan Networks
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::mem;

use log::{info, warn};

use crate::common::{MetaPacket, Timestamp};
use crate::error::Result;
use crate::flow_generator::{FlowMap, FlowNode, FlowTimeout};
use crate::pcap::PacketSource;
use crate::sender::{NetflowExporter, MAX_FLOWS_PER_DATAGRAM};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Flushing,
    Done,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProbeCounter {
    pub packets_read: u64,
    pub packets_skipped: u64,
    pub flows_created: u64,
    pub flows_exported: u64,
    pub datagrams_sent: u64,
    pub send_failures: u64,
}

/// Reads a packet source to its end, aggregating TCP packets into flows and
/// exporting them as NetFlow v5 datagrams.
///
/// Flows exported while running leave in full datagrams, the rest are
/// exported when the source ends or fails.
pub struct Probe<S> {
    source: S,
    flow_map: FlowMap,
    exporter: NetflowExporter,
    timeout: FlowTimeout,

    // expired flows waiting for a full datagram
    pending: Vec<FlowNode>,
    time_start: Option<Timestamp>,
    time_end: Timestamp,

    state: State,
    counter: ProbeCounter,
}

impl<S: PacketSource> Probe<S> {
    pub fn new(source: S, exporter: NetflowExporter, timeout: FlowTimeout) -> Self {
        Self {
            source,
            flow_map: FlowMap::new(),
            exporter,
            timeout,
            pending: Vec::with_capacity(MAX_FLOWS_PER_DATAGRAM),
            time_start: None,
            time_end: Timestamp::ZERO,
            state: State::Running,
            counter: ProbeCounter::default(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn counter(&self) -> &ProbeCounter {
        &self.counter
    }

    /// Runs the probe to completion.
    ///
    /// A read error or a malformed packet stops reading, the flows seen so far
    /// are still exported before the error is returned.
    pub fn run(&mut self) -> Result<ProbeCounter> {
        if self.state == State::Done {
            warn!("probe already done, ignoring run");
            return Ok(self.counter);
        }

        let result = self.process();
        if let Err(e) = &result {
            warn!("stop reading capture: {}", e);
        }
        self.flush();
        self.state = State::Done;

        let c = &self.counter;
        info!(
            "probe done: packets read {} skipped {}, flows created {} exported {}, datagrams sent {} failed {}",
            c.packets_read,
            c.packets_skipped,
            c.flows_created,
            c.flows_exported,
            c.datagrams_sent,
            c.send_failures
        );
        result.map(|_| self.counter)
    }

    fn process(&mut self) -> Result<()> {
        info!("probe running with {:?}", self.timeout);
        loop {
            let (timestamp, parsed) = match self.source.next_packet()? {
                Some(frame) => (
                    frame.timestamp,
                    MetaPacket::parse(frame.data, frame.timestamp),
                ),
                None => return Ok(()),
            };

            self.counter.packets_read += 1;
            self.time_start = Some(self.time_start.map_or(timestamp, |t| t.min(timestamp)));
            self.time_end = self.time_end.max(timestamp);

            let Some(meta_packet) = parsed? else {
                self.counter.packets_skipped += 1;
                continue;
            };
            if self.flow_map.inject_meta_packet(&meta_packet) {
                self.counter.flows_created += 1;
            }

            let expired = self.flow_map.expire(timestamp, &self.timeout);
            self.pending.extend(expired);
            while self.pending.len() >= MAX_FLOWS_PER_DATAGRAM {
                let batch = self
                    .pending
                    .drain(..MAX_FLOWS_PER_DATAGRAM)
                    .collect::<Vec<_>>();
                self.export(&batch);
            }
        }
    }

    fn flush(&mut self) {
        self.state = State::Flushing;
        let mut flows = mem::take(&mut self.pending);
        flows.extend(self.flow_map.drain_all());
        info!("flushing {} flows", flows.len());
        for batch in flows.chunks(MAX_FLOWS_PER_DATAGRAM) {
            self.export(batch);
        }
    }

    fn export(&mut self, batch: &[FlowNode]) {
        let time_start = self.time_start.unwrap_or(self.time_end);
        match self.exporter.export(batch, time_start, self.time_end) {
            Ok(_) => self.counter.datagrams_sent += 1,
            Err(_) => self.counter.send_failures += 1,
        }
        self.counter.flows_exported += batch.len() as u64;
    }
}
