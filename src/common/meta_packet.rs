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

use log::{debug, warn};

use super::{
    consts::*,
    enums::{EthernetType, IpProtocol, TcpFlags},
    flow::FlowKey,
    Timestamp,
};
use crate::error;
use crate::utils::bytes::{read_u16_be, read_u32_be};

const IP_FRAG_OFFSET_MASK: u16 = 0x1FFF;
const FIELD_OFFSET_FRAG: usize = ETH_HEADER_SIZE + 6;

/// One TCP/IPv4 packet reduced to what flow aggregation needs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MetaPacket {
    pub lookup_key: FlowKey,
    pub timestamp: Timestamp,
    // from the end of the ip header to the end of the frame
    pub l3_payload_len: u32,
    pub tcp_flags: TcpFlags,
}

impl MetaPacket {
    /// Decodes an ethernet frame.
    ///
    /// Returns `Ok(None)` for frames that do not carry TCP over IPv4 and for
    /// IPv4 headers declaring less than 20 bytes, those are skipped by the caller.
    /// A frame cut short of a header it must contain is an error.
    pub fn parse(packet: &[u8], timestamp: Timestamp) -> error::Result<Option<MetaPacket>> {
        let mut size_checker = packet.len() as isize;

        // eth
        size_checker -= ETH_HEADER_SIZE as isize;
        if size_checker < 0 {
            return Err(error::Error::MalformedPacket(
                "ethernet header truncated".into(),
            ));
        }
        let raw_eth_type = read_u16_be(&packet[FIELD_OFFSET_ETH_TYPE..]);
        if EthernetType::from(raw_eth_type) != EthernetType::Ipv4 {
            debug!("ethernet type {:#06x} is not ipv4, packet skipped", raw_eth_type);
            return Ok(None);
        }

        // ipv4
        size_checker -= IPV4_HEADER_SIZE as isize;
        if size_checker < 0 {
            return Err(error::Error::MalformedPacket(format!(
                "ipv4 header truncated, frame length {}",
                packet.len()
            )));
        }
        let raw_proto = packet[FIELD_OFFSET_IP_PROTO];
        let proto = IpProtocol::from(raw_proto);
        if proto != IpProtocol::Tcp {
            debug!("ip protocol {} is not tcp, packet skipped", raw_proto);
            return Ok(None);
        }
        let ip_header_len = (packet[FIELD_OFFSET_IHL] & 0xF) as usize * 4;
        if ip_header_len < IPV4_HEADER_SIZE {
            warn!(
                "invalid ip header length {} bytes, packet skipped",
                ip_header_len
            );
            return Ok(None);
        }
        if read_u16_be(&packet[FIELD_OFFSET_FRAG..]) & IP_FRAG_OFFSET_MASK != 0 {
            // trailing fragment, no tcp header to read
            warn!("non-first ipv4 fragment, packet skipped");
            return Ok(None);
        }
        let ip_src = read_u32_be(&packet[FIELD_OFFSET_SIP..FIELD_OFFSET_SIP + IPV4_ADDR_LEN]);
        let ip_dst = read_u32_be(&packet[FIELD_OFFSET_DIP..FIELD_OFFSET_DIP + IPV4_ADDR_LEN]);

        size_checker -= (ip_header_len - IPV4_HEADER_SIZE) as isize;
        let l3_payload_len = size_checker;

        // tcp
        size_checker -= TCP_HEADER_SIZE as isize;
        if size_checker < 0 {
            return Err(error::Error::MalformedPacket(format!(
                "tcp header truncated, frame length {} ip header length {}",
                packet.len(),
                ip_header_len
            )));
        }
        let tcp_offset = ETH_HEADER_SIZE + ip_header_len;
        let port_src = read_u16_be(&packet[tcp_offset + FIELD_OFFSET_SPORT..]);
        let port_dst = read_u16_be(&packet[tcp_offset + FIELD_OFFSET_DPORT..]);
        let tcp_flags = TcpFlags::from_bits_truncate(packet[tcp_offset + FIELD_OFFSET_TCP_FLAG]);

        Ok(Some(MetaPacket {
            lookup_key: FlowKey {
                ip_src,
                ip_dst,
                port_src,
                port_dst,
                proto,
            },
            timestamp,
            l3_payload_len: l3_payload_len as u32,
            tcp_flags,
        }))
    }
}
