/*
 * Copyright (c) 2022 Yunshan Networks
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

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use criterion::*;

use p2nprobe::{
    common::{MetaPacket, Timestamp},
    flow_generator::{FlowMap, FlowTimeout},
    _TcpFrame as TcpFrame,
};

fn new_meta_packet(src_port: u16, dst_port: u16, timestamp: Timestamp) -> MetaPacket {
    let frame = TcpFrame {
        ip_src: Ipv4Addr::new(192, 168, 1, 1),
        ip_dst: Ipv4Addr::new(172, 16, 0, 1),
        port_src: src_port,
        port_dst: dst_port,
        flags: 0x02,
        payload_len: 100,
        ..Default::default()
    }
    .build();
    MetaPacket::parse(&frame, timestamp).unwrap().unwrap()
}

pub(super) fn bench(c: &mut Criterion) {
    c.bench_function("flow_map_syn_flood", |b| {
        b.iter_custom(|iters| {
            let mut map = FlowMap::new();
            let timeout = FlowTimeout::default();
            let packets = (0..iters)
                .map(|i| new_meta_packet(i as u16, (i >> 16) as u16, Timestamp::ZERO))
                .collect::<Vec<_>>();
            let start = Instant::now();
            for pkt in packets {
                map.inject_meta_packet(&pkt);
                map.expire(pkt.timestamp, &timeout);
            }
            start.elapsed()
        })
    });

    c.bench_function("flow_map_with_ten_packets_flow_flood", |b| {
        b.iter_custom(|iters| {
            let mut map = FlowMap::new();
            let timeout = FlowTimeout::default();
            let iters = (iters + 9) / 10 * 10;

            let mut packets = vec![];
            for i in (0..iters).step_by(10) {
                let src_port = i as u16;
                let dst_port = (i >> 16) as u16;
                for j in 0..10 {
                    let timestamp = Timestamp::from(Duration::from_nanos(100 * (i + j)));
                    packets.push(new_meta_packet(src_port, dst_port, timestamp));
                }
            }

            let start = Instant::now();
            for pkt in packets {
                map.inject_meta_packet(&pkt);
                map.expire(pkt.timestamp, &timeout);
            }
            start.elapsed()
        })
    });

    c.bench_function("flow_map_expire_in_batches", |b| {
        b.iter_custom(|iters| {
            let mut map = FlowMap::new();
            let timeout = FlowTimeout::default();
            for i in 0..iters {
                map.inject_meta_packet(&new_meta_packet(i as u16, (i >> 16) as u16, Timestamp::ZERO));
            }

            let now = Timestamp::from_secs(3600);
            let start = Instant::now();
            while !map.expire(now, &timeout).is_empty() {}
            start.elapsed()
        })
    });
}
