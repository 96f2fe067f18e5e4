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

mod reader;

pub use reader::PcapFileSource;

use thiserror::Error;

use crate::common::Timestamp;

#[derive(Debug, Error)]
pub enum Error {
    #[error("open capture file {path} failed: {reason}")]
    OpenFailed { path: String, reason: String },
    #[error("unsupported link type {0}, only ethernet captures are supported")]
    UnsupportedLinkType(i32),
    #[error("reading packet failed: {0}")]
    ReadFailed(String),
}

pub struct RawFrame<'a> {
    pub data: &'a [u8],
    pub timestamp: Timestamp,
}

/// Yields captured frames in non-decreasing timestamp order.
///
/// `Ok(None)` marks the end of the capture, an error means the capture cannot
/// be read any further.
pub trait PacketSource {
    fn next_packet(&mut self) -> Result<Option<RawFrame<'_>>, Error>;
}

/// Frames held in memory, optionally failing once they are used up.
#[derive(Default)]
pub struct VecSource {
    frames: Vec<(Vec<u8>, Timestamp)>,
    cursor: usize,
    read_error: Option<String>,
}

impl VecSource {
    pub fn new(frames: Vec<(Vec<u8>, Timestamp)>) -> Self {
        Self {
            frames,
            ..Default::default()
        }
    }

    pub fn with_read_error(mut self, reason: &str) -> Self {
        self.read_error = Some(reason.to_owned());
        self
    }
}

impl PacketSource for VecSource {
    fn next_packet(&mut self) -> Result<Option<RawFrame<'_>>, Error> {
        let Some((data, timestamp)) = self.frames.get(self.cursor) else {
            return match self.read_error.take() {
                Some(reason) => Err(Error::ReadFailed(reason)),
                None => Ok(None),
            };
        };
        self.cursor += 1;
        Ok(Some(RawFrame {
            data,
            timestamp: *timestamp,
        }))
    }
}
