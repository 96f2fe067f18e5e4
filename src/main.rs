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

use std::process;
use std::time::Duration;

use clap::Parser;
use log::{error, info};

use p2nprobe::{
    config::{Config, ConfigError},
    error::{EXIT_INTERNAL_ERROR, EXIT_INVALID_ARGS},
    flow_generator::FlowTimeout,
    init_logger,
    pcap::PcapFileSource,
    probe::{Probe, ProbeCounter},
    sender::NetflowExporter,
};

#[derive(Parser)]
#[clap(version, about = "Aggregates TCP flows of a capture file and exports them as NetFlow v5")]
struct Opts {
    /// NetFlow collector, <host>:<port>
    collector: Option<String>,

    /// Capture file to read
    pcap_file: Option<String>,

    /// Active timeout in seconds
    #[clap(short, long)]
    active_timeout: Option<u64>,

    /// Inactive timeout in seconds
    #[clap(short, long)]
    inactive_timeout: Option<u64>,

    /// Specify config file location
    #[clap(short = 'f', long)]
    config_file: Option<String>,

    /// Append logs to this file as well as stderr
    #[clap(short, long)]
    log_file: Option<String>,

    /// Log at debug level
    #[clap(short, long)]
    verbose: bool,
}

impl Opts {
    fn load_config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config_file {
            Some(path) => Config::load_from_file(path)?,
            None => Config::default(),
        };
        if let Some(collector) = &self.collector {
            config.collector = collector.clone();
        }
        if let Some(pcap_file) = &self.pcap_file {
            config.pcap_file = pcap_file.clone();
        }
        if let Some(secs) = self.active_timeout {
            config.active_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.inactive_timeout {
            config.inactive_timeout = Duration::from_secs(secs);
        }
        if self.log_file.is_some() {
            config.log_file = self.log_file.clone();
        }
        if self.verbose {
            config.log_level = "debug".into();
        }
        Ok(config)
    }
}

fn run(config: &Config) -> p2nprobe::Result<ProbeCounter> {
    config.validate()?;
    info!(
        "p2nprobe {} exporting {} to {}, active timeout {:?} inactive timeout {:?}",
        env!("CARGO_PKG_VERSION"),
        config.pcap_file,
        config.collector,
        config.active_timeout,
        config.inactive_timeout
    );

    let (host, port) = config.collector_addr()?;
    let exporter = NetflowExporter::new(&host, port)?;
    let source = PcapFileSource::open(&config.pcap_file)?;
    let mut probe = Probe::new(source, exporter, FlowTimeout::from(config));
    probe.run()
}

fn main() {
    let opts = Opts::parse();
    let config = match opts.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(EXIT_INVALID_ARGS);
        }
    };
    let logger = match init_logger(&config.log_level, config.log_file.as_deref()) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("start logger failed: {:?}", e);
            process::exit(EXIT_INTERNAL_ERROR);
        }
    };

    let code = match run(&config) {
        Ok(_) => 0,
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    };
    logger.flush();
    process::exit(code);
}
