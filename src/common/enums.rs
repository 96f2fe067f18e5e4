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

use std::fmt;

use bitflags::bitflags;
use num_enum::{FromPrimitive, IntoPrimitive};

/// EthernetType is an enumeration of the ethernet type values the decoder
/// distinguishes, anything else decodes to `Unknown`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum EthernetType {
    Ipv4 = 0x0800,
    #[num_enum(default)]
    Unknown = 0xFFFF,
}

impl Default for EthernetType {
    fn default() -> Self {
        EthernetType::Unknown
    }
}

// IpProtocol values as carried in the IPv4 protocol field, only TCP is aggregated
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum IpProtocol {
    Tcp = 6,
    #[num_enum(default)]
    Unknown = 255,
}

impl Default for IpProtocol {
    fn default() -> Self {
        IpProtocol::Unknown
    }
}

bitflags! {
    #[derive(Default)]
    pub struct TcpFlags: u8 {
        const FIN = 0b00000001;
        const SYN = 0b00000010;
        const RST = 0b00000100;
        const PSH = 0b00001000;
        const ACK = 0b00010000;
        const URG = 0b00100000;
        const ECE = 0b01000000;
        const CWR = 0b10000000;
    }
}

impl fmt::Display for TcpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::FIN, "FIN"),
            (Self::SYN, "SYN"),
            (Self::RST, "RST"),
            (Self::PSH, "PSH"),
            (Self::ACK, "ACK"),
            (Self::URG, "URG"),
            (Self::ECE, "ECE"),
            (Self::CWR, "CWR"),
        ];
        let bit_strs = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect::<Vec<_>>();
        write!(f, "{}", bit_strs.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_unknown_values() {
        assert_eq!(EthernetType::from(0x0800), EthernetType::Ipv4);
        assert_eq!(EthernetType::from(0x88cc), EthernetType::Unknown);
        assert_eq!(IpProtocol::from(6), IpProtocol::Tcp);
        assert_eq!(IpProtocol::from(17), IpProtocol::Unknown);
        assert_eq!(u8::from(IpProtocol::Tcp), 6);
    }

    #[test]
    fn tcp_flags_keep_every_bit() {
        let flags = TcpFlags::from_bits_truncate(0xC2);
        assert!(flags.contains(TcpFlags::SYN | TcpFlags::ECE | TcpFlags::CWR));
        assert_eq!(flags.bits(), 0xC2);
        assert_eq!((TcpFlags::SYN | TcpFlags::FIN).to_string(), "FIN|SYN");
        assert_eq!(TcpFlags::empty().to_string(), "");
    }
}
