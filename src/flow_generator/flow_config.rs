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

use std::time::Duration;

use crate::config::{Config, DEFAULT_ACTIVE_TIMEOUT, DEFAULT_INACTIVE_TIMEOUT};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FlowTimeout {
    // longest a flow may stay open after its first packet
    pub active: Duration,
    // longest a flow may stay silent after its last packet
    pub inactive: Duration,
}

impl FlowTimeout {
    pub fn new(active: Duration, inactive: Duration) -> Self {
        Self { active, inactive }
    }
}

impl Default for FlowTimeout {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVE_TIMEOUT, DEFAULT_INACTIVE_TIMEOUT)
    }
}

impl From<&Config> for FlowTimeout {
    fn from(c: &Config) -> Self {
        Self::new(c.active_timeout, c.inactive_timeout)
    }
}
