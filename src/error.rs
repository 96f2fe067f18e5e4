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

use thiserror::Error;

use crate::{config::ConfigError, pcap, sender};

pub const EXIT_INTERNAL_ERROR: i32 = 1;
pub const EXIT_INVALID_ARGS: i32 = 2;
pub const EXIT_FILE_OPEN_ERROR: i32 = 3;
pub const EXIT_READING_PACKET_ERROR: i32 = 4;
pub const EXIT_INVALID_PACKET: i32 = 5;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed packet: {0}")]
    MalformedPacket(String),
    #[error(transparent)]
    Pcap(#[from] pcap::Error),
    #[error(transparent)]
    Sender(#[from] sender::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MalformedPacket(_) => EXIT_INVALID_PACKET,
            Self::Pcap(pcap::Error::ReadFailed(_)) => EXIT_READING_PACKET_ERROR,
            Self::Pcap(_) => EXIT_FILE_OPEN_ERROR,
            Self::Sender(_) => EXIT_FILE_OPEN_ERROR,
            Self::Config(_) => EXIT_INVALID_ARGS,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
