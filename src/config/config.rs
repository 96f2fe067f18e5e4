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

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_ACTIVE_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_INACTIVE_TIMEOUT: Duration = Duration::from_secs(60);
pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);
pub const MAX_TIMEOUT: Duration = Duration::from_secs(86400);
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("collector invalid, expected <host>:<port> with port 1-65535: {0}")]
    CollectorInvalid(String),
    #[error("pcap file path is missing")]
    PcapFileMissing,
    #[error("{name} {value:?} out of range ({min:?}-{max:?})")]
    TimeoutOutOfRange {
        name: &'static str,
        value: Duration,
        min: Duration,
        max: Duration,
    },
    #[error("yaml config invalid: {0}")]
    YamlConfigInvalid(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub collector: String,
    pub pcap_file: String,
    #[serde(with = "humantime_serde")]
    pub active_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub inactive_timeout: Duration,
    pub log_file: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collector: "".into(),
            pcap_file: "".into(),
            active_timeout: DEFAULT_ACTIVE_TIMEOUT,
            inactive_timeout: DEFAULT_INACTIVE_TIMEOUT,
            log_file: None,
            log_level: DEFAULT_LOG_LEVEL.into(),
        }
    }
}

impl Config {
    pub fn load_from_file<T: AsRef<Path>>(path: T) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::YamlConfigInvalid(e.to_string()))?;
        Self::load(&contents)
    }

    pub fn load<C: AsRef<str>>(contents: C) -> Result<Self, ConfigError> {
        let contents = contents.as_ref();
        if contents.trim().is_empty() {
            // parsing empty string leads to EOF error
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|e| ConfigError::YamlConfigInvalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.collector_addr()?;
        if self.pcap_file.is_empty() {
            return Err(ConfigError::PcapFileMissing);
        }
        for (name, value) in [
            ("active-timeout", self.active_timeout),
            ("inactive-timeout", self.inactive_timeout),
        ] {
            if value < MIN_TIMEOUT || value > MAX_TIMEOUT {
                return Err(ConfigError::TimeoutOutOfRange {
                    name,
                    value,
                    min: MIN_TIMEOUT,
                    max: MAX_TIMEOUT,
                });
            }
        }
        Ok(())
    }

    /// Splits `collector` on its last colon so bracketed IPv6 hosts keep their colons.
    pub fn collector_addr(&self) -> Result<(String, u16), ConfigError> {
        let invalid = || ConfigError::CollectorInvalid(self.collector.clone());
        let (host, port) = self.collector.rsplit_once(':').ok_or_else(invalid)?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(invalid());
        }
        match port.parse::<u16>() {
            Ok(port) if port > 0 => Ok((host.to_owned(), port)),
            _ => Err(invalid()),
        }
    }
}
