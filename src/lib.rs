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

pub mod common;
pub mod config;
pub mod error;
pub mod flow_generator;
pub mod pcap;
pub mod probe;
pub mod sender;
mod utils;

pub use error::{Error, Result};
pub use utils::logger::init_logger;

// for benchmarks and integration tests
#[doc(hidden)]
pub use utils::test::{Collector as _Collector, TcpFrame as _TcpFrame};
