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

// NetFlow v5 export format, all fields in network byte order:
// https://www.cisco.com/c/en/us/td/docs/net_mgmt/netflow_collection_engine/3-6/user/guide/format.html

use std::time::Duration;

use crate::common::Timestamp;
use crate::flow_generator::FlowNode;
use crate::utils::bytes::{read_u16_be, read_u32_be, write_u16_be, write_u32_be};

pub const NETFLOW_V5_VERSION: u16 = 5;
pub const HEADER_SIZE: usize = 24;
pub const RECORD_SIZE: usize = 48;
pub const MAX_FLOWS_PER_DATAGRAM: usize = 30;
pub const MAX_DATAGRAM_SIZE: usize = HEADER_SIZE + RECORD_SIZE * MAX_FLOWS_PER_DATAGRAM;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub count: u16,
    // milliseconds since the first packet of the capture
    pub sys_uptime: u32,
    pub unix_secs: u32,
    pub unix_nsecs: u32,
    // flows exported before this datagram
    pub flow_sequence: u32,
    pub engine_type: u8,
    pub engine_id: u8,
    pub sampling_interval: u16,
}

impl Header {
    pub fn encode(&self, buf: &mut [u8]) {
        assert!(buf.len() >= HEADER_SIZE);
        write_u16_be(&mut buf[0..], self.version);
        write_u16_be(&mut buf[2..], self.count);
        write_u32_be(&mut buf[4..], self.sys_uptime);
        write_u32_be(&mut buf[8..], self.unix_secs);
        write_u32_be(&mut buf[12..], self.unix_nsecs);
        write_u32_be(&mut buf[16..], self.flow_sequence);
        buf[20] = self.engine_type;
        buf[21] = self.engine_id;
        write_u16_be(&mut buf[22..], self.sampling_interval);
    }

    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            version: read_u16_be(&buf[0..]),
            count: read_u16_be(&buf[2..]),
            sys_uptime: read_u32_be(&buf[4..]),
            unix_secs: read_u32_be(&buf[8..]),
            unix_nsecs: read_u32_be(&buf[12..]),
            flow_sequence: read_u32_be(&buf[16..]),
            engine_type: buf[20],
            engine_id: buf[21],
            sampling_interval: read_u16_be(&buf[22..]),
        })
    }
}

/// One flow on the wire. Routing, interface, AS and mask fields stay zero,
/// the exporter has no such information.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Record {
    pub src_addr: u32,
    pub dst_addr: u32,
    pub next_hop: u32,
    pub input_if: u16,
    pub output_if: u16,
    pub packet_count: u32,
    pub byte_count: u32,
    // milliseconds relative to the first packet of the capture
    pub first: u32,
    pub last: u32,
    pub src_port: u16,
    pub dst_port: u16,
    pub tcp_flags: u8,
    pub protocol: u8,
    pub tos: u8,
    pub src_as: u16,
    pub dst_as: u16,
    pub src_mask: u8,
    pub dst_mask: u8,
}

impl Record {
    pub fn new(node: &FlowNode, time_start: Timestamp) -> Self {
        let key = &node.flow_key;
        Self {
            src_addr: key.ip_src,
            dst_addr: key.ip_dst,
            packet_count: node.packet_count as u32,
            byte_count: node.byte_count as u32,
            first: node.first_seen.millis_since(time_start),
            last: node.last_seen.millis_since(time_start),
            src_port: key.port_src,
            dst_port: key.port_dst,
            tcp_flags: node.tcp_flags.bits(),
            protocol: key.proto.into(),
            ..Default::default()
        }
    }

    pub fn encode(&self, buf: &mut [u8]) {
        assert!(buf.len() >= RECORD_SIZE);
        write_u32_be(&mut buf[0..], self.src_addr);
        write_u32_be(&mut buf[4..], self.dst_addr);
        write_u32_be(&mut buf[8..], self.next_hop);
        write_u16_be(&mut buf[12..], self.input_if);
        write_u16_be(&mut buf[14..], self.output_if);
        write_u32_be(&mut buf[16..], self.packet_count);
        write_u32_be(&mut buf[20..], self.byte_count);
        write_u32_be(&mut buf[24..], self.first);
        write_u32_be(&mut buf[28..], self.last);
        write_u16_be(&mut buf[32..], self.src_port);
        write_u16_be(&mut buf[34..], self.dst_port);
        // pad1
        buf[36] = 0;
        buf[37] = self.tcp_flags;
        buf[38] = self.protocol;
        buf[39] = self.tos;
        write_u16_be(&mut buf[40..], self.src_as);
        write_u16_be(&mut buf[42..], self.dst_as);
        buf[44] = self.src_mask;
        buf[45] = self.dst_mask;
        // pad2
        write_u16_be(&mut buf[46..], 0);
    }

    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < RECORD_SIZE {
            return None;
        }
        Some(Self {
            src_addr: read_u32_be(&buf[0..]),
            dst_addr: read_u32_be(&buf[4..]),
            next_hop: read_u32_be(&buf[8..]),
            input_if: read_u16_be(&buf[12..]),
            output_if: read_u16_be(&buf[14..]),
            packet_count: read_u32_be(&buf[16..]),
            byte_count: read_u32_be(&buf[20..]),
            first: read_u32_be(&buf[24..]),
            last: read_u32_be(&buf[28..]),
            src_port: read_u16_be(&buf[32..]),
            dst_port: read_u16_be(&buf[34..]),
            tcp_flags: buf[37],
            protocol: buf[38],
            tos: buf[39],
            src_as: read_u16_be(&buf[40..]),
            dst_as: read_u16_be(&buf[42..]),
            src_mask: buf[44],
            dst_mask: buf[45],
        })
    }
}

/// Serializes up to `MAX_FLOWS_PER_DATAGRAM` flows into one datagram, in the
/// given order. `now` is the wall clock time since the unix epoch.
///
/// # Panics
///
/// When `flows` is empty or longer than `MAX_FLOWS_PER_DATAGRAM`.
pub fn encode(
    flows: &[FlowNode],
    time_start: Timestamp,
    time_end: Timestamp,
    flow_sequence: u32,
    now: Duration,
) -> Vec<u8> {
    assert!(
        !flows.is_empty() && flows.len() <= MAX_FLOWS_PER_DATAGRAM,
        "a datagram carries 1-{} flows, got {}",
        MAX_FLOWS_PER_DATAGRAM,
        flows.len()
    );

    let mut buf = vec![0u8; HEADER_SIZE + RECORD_SIZE * flows.len()];
    Header {
        version: NETFLOW_V5_VERSION,
        count: flows.len() as u16,
        sys_uptime: time_end.millis_since(time_start),
        unix_secs: now.as_secs() as u32,
        unix_nsecs: now.subsec_nanos(),
        flow_sequence,
        ..Default::default()
    }
    .encode(&mut buf);

    for (node, chunk) in flows
        .iter()
        .zip(buf[HEADER_SIZE..].chunks_exact_mut(RECORD_SIZE))
    {
        Record::new(node, time_start).encode(chunk);
    }
    buf
}

/// Parses a datagram produced by [`encode`], `None` when it is short of the
/// records its header announces.
pub fn decode(buf: &[u8]) -> Option<(Header, Vec<Record>)> {
    let header = Header::decode(buf)?;
    let count = header.count as usize;
    if buf.len() < HEADER_SIZE + RECORD_SIZE * count {
        return None;
    }
    let records = buf[HEADER_SIZE..]
        .chunks_exact(RECORD_SIZE)
        .take(count)
        .filter_map(Record::decode)
        .collect();
    Some((header, records))
}
