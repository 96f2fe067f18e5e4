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

use std::path::Path;

use log::info;

use super::{Error, PacketSource, RawFrame};
use crate::common::Timestamp;

pub struct PcapFileSource {
    capture: ::pcap::Capture<::pcap::Offline>,
}

impl std::fmt::Debug for PcapFileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcapFileSource").finish_non_exhaustive()
    }
}

impl PcapFileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let capture = ::pcap::Capture::from_file(path).map_err(|e| Error::OpenFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let link_type = capture.get_datalink();
        if link_type != ::pcap::Linktype::ETHERNET {
            return Err(Error::UnsupportedLinkType(link_type.0));
        }
        info!("capture file {} opened", path.display());
        Ok(Self { capture })
    }
}

// timestamps before the epoch are clamped to it
fn capture_timestamp(tv_sec: i64, tv_usec: i64) -> Timestamp {
    Timestamp::from_timeval(tv_sec.max(0) as u64, tv_usec.max(0) as u64)
}

impl PacketSource for PcapFileSource {
    fn next_packet(&mut self) -> Result<Option<RawFrame<'_>>, Error> {
        match self.capture.next() {
            Ok(packet) => Ok(Some(RawFrame {
                timestamp: capture_timestamp(
                    packet.header.ts.tv_sec as i64,
                    packet.header.ts.tv_usec as i64,
                ),
                data: packet.data,
            })),
            Err(::pcap::Error::NoMorePackets) => Ok(None),
            Err(e) => Err(Error::ReadFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_timeval_clamped() {
        assert_eq!(capture_timestamp(-1, 500_000), Timestamp::from_timeval(0, 500_000));
        assert_eq!(capture_timestamp(-86400, -1), Timestamp::ZERO);
        assert_eq!(
            capture_timestamp(1_600_000_000, 250),
            Timestamp::from_timeval(1_600_000_000, 250)
        );
    }
}
