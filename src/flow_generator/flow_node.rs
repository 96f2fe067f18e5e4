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

use super::FlowTimeout;
use crate::common::{enums::TcpFlags, flow::FlowKey, meta_packet::MetaPacket, Timestamp};

/// Aggregate of every packet seen for one `FlowKey`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowNode {
    pub flow_key: FlowKey,
    pub packet_count: u64,
    pub byte_count: u64,
    // capture time of the first packet, never changes after creation
    pub first_seen: Timestamp,
    // capture time of the latest packet
    pub last_seen: Timestamp,
    pub tcp_flags: TcpFlags,
}

impl FlowNode {
    pub fn new(meta_packet: &MetaPacket) -> Self {
        Self {
            flow_key: meta_packet.lookup_key,
            packet_count: 1,
            byte_count: meta_packet.l3_payload_len as u64,
            first_seen: meta_packet.timestamp,
            last_seen: meta_packet.timestamp,
            tcp_flags: meta_packet.tcp_flags,
        }
    }

    pub fn update(&mut self, meta_packet: &MetaPacket) {
        self.packet_count += 1;
        self.byte_count += meta_packet.l3_payload_len as u64;
        self.tcp_flags |= meta_packet.tcp_flags;
        // out of order packets must not move last_seen backwards
        self.last_seen = self.last_seen.max(meta_packet.timestamp);
    }

    pub fn is_expired(&self, now: Timestamp, timeout: &FlowTimeout) -> bool {
        now.saturating_sub(self.first_seen) >= timeout.active
            || now.saturating_sub(self.last_seen) >= timeout.inactive
    }
}
