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

use log::debug;
use lru::LruCache;

use super::{FlowNode, FlowTimeout, MAX_FLOWS_PER_EXPIRE};
use crate::common::{flow::FlowKey, meta_packet::MetaPacket, Timestamp};

/// In-progress flows keyed by their 5-tuple.
///
/// `LruCache` keeps the hash index and the linked list of entries in one
/// structure, so a key is either in both or in neither. Nodes are only read
/// through `peek*` and never promoted, which leaves the list in arrival order:
/// the least recently used end is the oldest flow. Removing an identified
/// entry is O(1).
// not thread-safe
pub struct FlowMap {
    node_map: LruCache<FlowKey, FlowNode>,
}

impl Default for FlowMap {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowMap {
    pub fn new() -> Self {
        Self {
            node_map: LruCache::unbounded(),
        }
    }

    /// Adds a packet to its flow, creating the flow on first sight.
    /// Returns true when a new flow was created.
    pub fn inject_meta_packet(&mut self, meta_packet: &MetaPacket) -> bool {
        match self.node_map.peek_mut(&meta_packet.lookup_key) {
            Some(node) => {
                node.update(meta_packet);
                false
            }
            None => {
                self.node_map
                    .put(meta_packet.lookup_key, FlowNode::new(meta_packet));
                true
            }
        }
    }

    /// Removes and returns the flows that reached either timeout at `now`, in
    /// the order they were created. At most `MAX_FLOWS_PER_EXPIRE` flows are
    /// returned, later ones stay for the next call.
    pub fn expire(&mut self, now: Timestamp, timeout: &FlowTimeout) -> Vec<FlowNode> {
        let expired_keys = self
            .node_map
            .iter()
            .rev()
            .filter(|(_, node)| node.is_expired(now, timeout))
            .map(|(key, _)| *key)
            .take(MAX_FLOWS_PER_EXPIRE)
            .collect::<Vec<_>>();

        let nodes = expired_keys
            .iter()
            .filter_map(|key| self.node_map.pop(key))
            .collect::<Vec<_>>();
        for node in nodes.iter() {
            debug!(
                "flow {} expired with {} packets {} bytes flags {}",
                node.flow_key, node.packet_count, node.byte_count, node.tcp_flags
            );
        }
        if !nodes.is_empty() {
            debug!(
                "{} flows expired at {:?}, {} remain",
                nodes.len(),
                now,
                self.node_map.len()
            );
        }
        nodes
    }

    /// Empties the map in arrival order.
    pub fn drain_all(&mut self) -> Vec<FlowNode> {
        let mut nodes = Vec::with_capacity(self.node_map.len());
        while let Some((_, node)) = self.node_map.pop_lru() {
            nodes.push(node);
        }
        nodes
    }

    pub fn get(&self, key: &FlowKey) -> Option<&FlowNode> {
        self.node_map.peek(key)
    }

    /// Flow keys from oldest to newest.
    pub fn keys(&self) -> impl Iterator<Item = &FlowKey> {
        self.node_map.iter().rev().map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::time::Duration;

    use super::*;
    use crate::common::enums::{IpProtocol, TcpFlags};

    const TIMEOUT: FlowTimeout = FlowTimeout {
        active: Duration::from_secs(60),
        inactive: Duration::from_secs(600),
    };

    fn key(port_src: u16) -> FlowKey {
        FlowKey::new(
            Ipv4Addr::new(8, 8, 8, 8),
            Ipv4Addr::new(114, 114, 114, 114),
            port_src,
            22,
            IpProtocol::Tcp,
        )
    }

    fn packet(port_src: u16, secs: u64, len: u32, flags: TcpFlags) -> MetaPacket {
        MetaPacket {
            lookup_key: key(port_src),
            timestamp: Timestamp::from_secs(secs),
            l3_payload_len: len,
            tcp_flags: flags,
        }
    }

    #[test]
    fn aggregate_same_key() {
        let mut flow_map = FlowMap::new();
        assert!(flow_map.inject_meta_packet(&packet(1000, 0, 40, TcpFlags::SYN)));
        for i in 1..10 {
            assert!(!flow_map.inject_meta_packet(&packet(1000, i, 60, TcpFlags::ACK)));
        }

        assert_eq!(flow_map.len(), 1);
        let node = flow_map.get(&key(1000)).unwrap();
        assert_eq!(node.packet_count, 10);
        assert_eq!(node.byte_count, 40 + 9 * 60);
        assert_eq!(node.tcp_flags, TcpFlags::SYN | TcpFlags::ACK);
        assert_eq!(node.last_seen, Timestamp::from_secs(9));
    }

    #[test]
    fn syn_then_fin_accumulates() {
        let mut flow_map = FlowMap::new();
        flow_map.inject_meta_packet(&packet(1000, 0, 40, TcpFlags::SYN));
        flow_map.inject_meta_packet(&packet(1000, 1, 40, TcpFlags::FIN));
        let node = flow_map.get(&key(1000)).unwrap();
        assert!(node.tcp_flags.contains(TcpFlags::SYN | TcpFlags::FIN));
    }

    #[test]
    fn active_timeout_boundary() {
        let mut flow_map = FlowMap::new();
        flow_map.inject_meta_packet(&packet(1000, 0, 40, TcpFlags::SYN));

        assert!(flow_map.expire(Timestamp::from_secs(59), &TIMEOUT).is_empty());
        assert_eq!(flow_map.len(), 1);

        let expired = flow_map.expire(Timestamp::from_secs(60), &TIMEOUT);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].flow_key, key(1000));
        assert!(flow_map.is_empty());
        assert!(flow_map.get(&key(1000)).is_none());
    }

    #[test]
    fn inactive_timeout() {
        let timeout = FlowTimeout::new(Duration::from_secs(600), Duration::from_secs(10));
        let mut flow_map = FlowMap::new();
        flow_map.inject_meta_packet(&packet(1, 0, 40, TcpFlags::SYN));
        flow_map.inject_meta_packet(&packet(2, 0, 40, TcpFlags::SYN));
        flow_map.inject_meta_packet(&packet(2, 8, 40, TcpFlags::ACK));

        let expired = flow_map.expire(Timestamp::from_secs(10), &timeout);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].flow_key, key(1));
        assert_eq!(flow_map.keys().copied().collect::<Vec<_>>(), vec![key(2)]);
    }

    #[test]
    fn expire_in_arrival_order() {
        let mut flow_map = FlowMap::new();
        flow_map.inject_meta_packet(&packet(1, 0, 40, TcpFlags::SYN));
        flow_map.inject_meta_packet(&packet(2, 1, 40, TcpFlags::SYN));
        flow_map.inject_meta_packet(&packet(3, 2, 40, TcpFlags::SYN));
        // a later packet for the first flow must not move it
        flow_map.inject_meta_packet(&packet(1, 3, 40, TcpFlags::ACK));

        let expired = flow_map.expire(Timestamp::from_secs(61), &TIMEOUT);
        let keys = expired.iter().map(|n| n.flow_key).collect::<Vec<_>>();
        assert_eq!(keys, vec![key(1), key(2)]);
        assert_eq!(flow_map.keys().copied().collect::<Vec<_>>(), vec![key(3)]);
    }

    #[test]
    fn expire_returns_at_most_one_datagram() {
        let mut flow_map = FlowMap::new();
        for port in 0..75 {
            flow_map.inject_meta_packet(&packet(port, 0, 40, TcpFlags::SYN));
        }

        let now = Timestamp::from_secs(3600);
        let first = flow_map.expire(now, &TIMEOUT);
        assert_eq!(first.len(), MAX_FLOWS_PER_EXPIRE);
        assert_eq!(first[0].flow_key, key(0));
        assert_eq!(first[29].flow_key, key(29));
        assert_eq!(flow_map.len(), 45);

        let second = flow_map.expire(now, &TIMEOUT);
        assert_eq!(second.len(), 30);
        assert_eq!(second[0].flow_key, key(30));

        let third = flow_map.expire(now, &TIMEOUT);
        assert_eq!(third.len(), 15);
        assert!(flow_map.is_empty());
        assert!(flow_map.expire(now, &TIMEOUT).is_empty());
    }

    #[test]
    fn drain_all_in_arrival_order() {
        let mut flow_map = FlowMap::new();
        for port in [5, 3, 9, 1] {
            flow_map.inject_meta_packet(&packet(port, 0, 40, TcpFlags::SYN));
        }
        flow_map.inject_meta_packet(&packet(3, 1, 40, TcpFlags::ACK));

        let drained = flow_map.drain_all();
        let keys = drained.iter().map(|n| n.flow_key).collect::<Vec<_>>();
        assert_eq!(keys, vec![key(5), key(3), key(9), key(1)]);
        assert!(flow_map.is_empty());
        assert!(flow_map.drain_all().is_empty());
    }

    #[test]
    fn index_and_order_hold_same_keys() {
        let timeout = FlowTimeout::new(Duration::from_secs(40), Duration::from_secs(15));
        let mut flow_map = FlowMap::new();
        for now in 0..500u64 {
            let port = ((now * 7919) % 97) as u16;
            flow_map.inject_meta_packet(&packet(port, now, 40, TcpFlags::ACK));
            if now % 13 == 0 {
                flow_map.expire(Timestamp::from_secs(now), &timeout);
            }

            let ordered = flow_map.keys().copied().collect::<Vec<_>>();
            assert_eq!(ordered.len(), flow_map.len());
            assert!(ordered.iter().all(|k| flow_map.get(k).is_some()));
        }
    }
}
