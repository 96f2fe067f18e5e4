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
use std::net::Ipv4Addr;

use super::enums::IpProtocol;

/// The 5-tuple a flow is aggregated on. Addresses and ports are kept in host
/// byte order; `Ipv4Addr::from(ip_src)` gives the dotted form.
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct FlowKey {
    pub ip_src: u32,
    pub ip_dst: u32,
    pub port_src: u16,
    pub port_dst: u16,
    pub proto: IpProtocol,
}

impl FlowKey {
    pub fn new(
        ip_src: Ipv4Addr,
        ip_dst: Ipv4Addr,
        port_src: u16,
        port_dst: u16,
        proto: IpProtocol,
    ) -> Self {
        Self {
            ip_src: ip_src.into(),
            ip_dst: ip_dst.into(),
            port_src,
            port_dst,
            proto,
        }
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} > {}:{} proto:{:?}",
            Ipv4Addr::from(self.ip_src),
            self.port_src,
            Ipv4Addr::from(self.ip_dst),
            self.port_dst,
            self.proto
        )
    }
}
