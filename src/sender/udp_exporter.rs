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

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};

use super::{netflow_v5, Error};
use crate::common::Timestamp;
use crate::flow_generator::FlowNode;

/// Sends NetFlow v5 datagrams over UDP to a single collector.
///
/// The collector is resolved once on construction. `flow_sequence` counts
/// every flow handed to `export`, delivered or not.
pub struct NetflowExporter {
    socket: UdpSocket,
    collector: SocketAddr,
    flow_sequence: u32,
}

impl NetflowExporter {
    pub fn new(host: &str, port: u16) -> Result<Self, Error> {
        let collector = (host, port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| Error::CollectorUnresolved(format!("{}:{}", host, port)))?;
        Self::with_addr(collector)
    }

    pub fn with_addr(collector: SocketAddr) -> Result<Self, Error> {
        let socket = if collector.is_ipv4() {
            UdpSocket::bind((IpAddr::from(Ipv4Addr::UNSPECIFIED), 0))?
        } else {
            UdpSocket::bind((IpAddr::from(Ipv6Addr::UNSPECIFIED), 0))?
        };
        info!("netflow exporter sending to {}", collector);
        Ok(Self {
            socket,
            collector,
            flow_sequence: 0,
        })
    }

    pub fn collector(&self) -> SocketAddr {
        self.collector
    }

    pub fn flow_sequence(&self) -> u32 {
        self.flow_sequence
    }

    /// Encodes `flows` into one datagram and sends it. Returns the number of
    /// bytes sent.
    pub fn export(
        &mut self,
        flows: &[FlowNode],
        time_start: Timestamp,
        time_end: Timestamp,
    ) -> Result<usize, Error> {
        // a clock before the epoch only zeroes unix_secs
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let datagram =
            netflow_v5::encode(flows, time_start, time_end, self.flow_sequence, now);
        self.flow_sequence = self.flow_sequence.wrapping_add(flows.len() as u32);
        self.send(&datagram)
    }

    pub fn send(&self, datagram: &[u8]) -> Result<usize, Error> {
        match self.socket.send_to(datagram, self.collector) {
            Ok(n) => {
                debug!("sent {} bytes to {}", n, self.collector);
                Ok(n)
            }
            Err(e) => {
                warn!("send datagram to {} failed: {}", self.collector, e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::common::{
        enums::{IpProtocol, TcpFlags},
        flow::FlowKey,
    };
    use crate::sender::netflow_v5::{HEADER_SIZE, RECORD_SIZE};
    use crate::utils::test::Collector;

    fn node(port_src: u16) -> FlowNode {
        FlowNode {
            flow_key: FlowKey::new(
                Ipv4Addr::new(10, 0, 0, 1),
                Ipv4Addr::new(10, 0, 0, 2),
                port_src,
                80,
                IpProtocol::Tcp,
            ),
            packet_count: 1,
            byte_count: 40,
            first_seen: Timestamp::from_secs(10),
            last_seen: Timestamp::from_secs(11),
            tcp_flags: TcpFlags::SYN,
        }
    }

    #[test]
    fn sequence_advances_by_flow_count() {
        let collector = Collector::bind();
        let mut exporter = NetflowExporter::with_addr(collector.addr()).unwrap();

        let flows = (0..3).map(node).collect::<Vec<_>>();
        let n = exporter
            .export(&flows, Timestamp::from_secs(10), Timestamp::from_secs(12))
            .unwrap();
        assert_eq!(n, HEADER_SIZE + RECORD_SIZE * 3);
        assert_eq!(exporter.flow_sequence(), 3);
        exporter
            .export(&flows[..1], Timestamp::from_secs(10), Timestamp::from_secs(12))
            .unwrap();
        assert_eq!(exporter.flow_sequence(), 4);

        let datagrams = collector.recv_all();
        assert_eq!(datagrams.len(), 2);
        let (header, records) = &datagrams[0];
        assert_eq!(header.flow_sequence, 0);
        assert_eq!(header.sys_uptime, 2000);
        assert!(header.unix_secs > 0);
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].src_port, 2);
        assert_eq!(records[0].first, 0);
        assert_eq!(records[0].last, 1000);
        assert_eq!(datagrams[1].0.flow_sequence, 3);
    }

    #[test]
    fn sequence_wraps() {
        let collector = Collector::bind();
        let mut exporter = NetflowExporter::with_addr(collector.addr()).unwrap();
        exporter.flow_sequence = u32::MAX;
        exporter
            .export(&[node(1), node(2)], Timestamp::ZERO, Timestamp::ZERO)
            .unwrap();
        assert_eq!(exporter.flow_sequence(), 1);
    }

    #[test]
    fn resolve_by_name() {
        let exporter = NetflowExporter::new("localhost", 2055).unwrap();
        assert_eq!(exporter.collector().port(), 2055);
        assert!(exporter.collector().ip().is_loopback());
    }

    #[test]
    fn unresolvable_collector() {
        assert!(matches!(
            NetflowExporter::new("no such host.invalid", 2055),
            Err(Error::CollectorUnresolved(_))
        ));
    }
}
