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

pub const ETH_HEADER_SIZE: usize = 14;
pub const IPV4_HEADER_SIZE: usize = 20;
pub const TCP_HEADER_SIZE: usize = 20;

pub const FIELD_OFFSET_ETH_TYPE: usize = 12;

// offsets below are relative to the start of the frame
pub const FIELD_OFFSET_IHL: usize = ETH_HEADER_SIZE;
pub const FIELD_OFFSET_IP_PROTO: usize = ETH_HEADER_SIZE + 9;
pub const FIELD_OFFSET_SIP: usize = ETH_HEADER_SIZE + 12;
pub const FIELD_OFFSET_DIP: usize = ETH_HEADER_SIZE + 16;

// offsets below are relative to the start of the tcp header
pub const FIELD_OFFSET_SPORT: usize = 0;
pub const FIELD_OFFSET_DPORT: usize = 2;
pub const FIELD_OFFSET_TCP_FLAG: usize = 13;

pub const IPV4_ADDR_LEN: usize = 4;
