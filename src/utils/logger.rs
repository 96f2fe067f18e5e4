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

use anyhow::{Context, Result};
use flexi_logger::{colored_opt_format, Duplicate, FileSpec, Logger, LoggerHandle};

/// Starts the process wide logger. `RUST_LOG` takes precedence over `level`.
///
/// With a `log_file` records are appended to it and duplicated to stderr,
/// otherwise they only go to stderr.
pub fn init_logger(level: &str, log_file: Option<&str>) -> Result<LoggerHandle> {
    let logger = Logger::try_with_env_or_str(level)
        .with_context(|| format!("invalid log level {}", level))?
        .format(colored_opt_format);

    let logger = match log_file {
        Some(log_file) => {
            if let Some(base_path) = Path::new(log_file).parent() {
                if !base_path.as_os_str().is_empty() && !base_path.exists() {
                    fs::create_dir_all(base_path).with_context(|| {
                        format!("create log directory {} failed", base_path.display())
                    })?;
                }
            }
            logger
                .log_to_file(FileSpec::try_from(log_file)?)
                .append()
                .duplicate_to_stderr(Duplicate::All)
        }
        None => logger,
    };
    Ok(logger.start()?)
}
