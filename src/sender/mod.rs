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

pub mod netflow_v5;
mod udp_exporter;

use std::io;

use thiserror::Error;

pub use netflow_v5::MAX_FLOWS_PER_DATAGRAM;
pub use udp_exporter::NetflowExporter;

#[derive(Debug, Error)]
pub enum Error {
    #[error("collector {0} cannot be resolved")]
    CollectorUnresolved(String),
    #[error("collector socket error: {0}")]
    Socket(#[from] io::Error),
}
