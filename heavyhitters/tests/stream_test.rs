// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::io::Cursor;

use googletest::assert_that;
use googletest::prelude::eq;
use heavyhitters::error::ErrorKind;
use heavyhitters::hh::HeavyHitterBuilder;
use heavyhitters::hh::HeavyHitterKind;
use heavyhitters::stream::ItemSource;
use heavyhitters::stream::TraceReader;

const HEADER: &str = "#Universe: 1048576\n#Phi: 0.05\n#Generator: zipf 1.1\n#===\n#3: 0.25\n#134: 0.125\n\n";

fn trace(header: &str, items: &[u32]) -> Vec<u8> {
    let mut bytes = header.as_bytes().to_vec();
    for item in items {
        bytes.extend_from_slice(&item.to_le_bytes());
    }
    bytes
}

#[test]
fn test_header_and_items() {
    let bytes = trace(HEADER, &[3, 134, 0x0A0A_0A0A, u32::MAX]);
    let mut reader = TraceReader::new(Cursor::new(bytes)).unwrap();

    assert_eq!(reader.parameters().len(), 3);
    assert_eq!(reader.parameter("Universe"), Some("1048576"));
    assert_eq!(reader.parameter("Generator"), Some("zipf 1.1"));
    assert_eq!(reader.parameter("Missing"), None);
    assert_eq!(reader.ground_truth(), &[(3, 0.25), (134, 0.125)]);

    let mut items = vec![];
    while let Some(item) = reader.next_item().unwrap() {
        items.push(item);
    }
    assert_eq!(items, vec![3, 134, 0x0A0A_0A0A, u32::MAX]);
    assert_that!(reader.items_read(), eq(4));
}

#[test]
fn test_headerless_trace() {
    let mut reader = TraceReader::new(Cursor::new(trace("", &[1, 2]))).unwrap();
    assert!(reader.parameters().is_empty());
    assert!(reader.ground_truth().is_empty());
    assert_eq!(reader.next_item().unwrap(), Some(1));
    assert_eq!(reader.next_item().unwrap(), Some(2));
    assert_eq!(reader.next_item().unwrap(), None);
    assert_eq!(reader.next_item().unwrap(), None);
}

#[test]
fn test_item_with_hash_low_byte() {
    // 35 is b'#' in its low byte
    let mut reader = TraceReader::new(Cursor::new(trace("", &[35, 10, 7]))).unwrap();
    assert!(reader.parameters().is_empty());
    assert_eq!(reader.next_item().unwrap(), Some(35));
    assert_eq!(reader.next_item().unwrap(), Some(10));
    assert_eq!(reader.next_item().unwrap(), Some(7));
    assert_eq!(reader.next_item().unwrap(), None);

    let mut reader =
        TraceReader::new(Cursor::new(trace("#Universe: 1024\n", &[0x0100_0023, 1]))).unwrap();
    assert_eq!(reader.parameter("Universe"), Some("1024"));
    assert_eq!(reader.next_item().unwrap(), Some(0x0100_0023));
    assert_eq!(reader.next_item().unwrap(), Some(1));
}

#[test]
fn test_partial_record() {
    let mut bytes = trace(HEADER, &[7]);
    bytes.extend_from_slice(&[1, 2]);
    let mut reader = TraceReader::new(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.next_item().unwrap(), Some(7));
    let err = reader.next_item().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}

#[test]
fn test_malformed_header() {
    let err = TraceReader::new(Cursor::new(b"#no separator\n".to_vec())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);

    let err = TraceReader::new(Cursor::new(b"#===\n#5: lots\n\n".to_vec())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}

#[test]
fn test_missing_file() {
    let path = std::env::temp_dir().join("heavyhitters-no-such-trace.bin");
    let err = TraceReader::open(path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unexpected);
}

#[test]
fn test_open_file() {
    let path = std::env::temp_dir().join(format!("heavyhitters-trace-{}.bin", std::process::id()));
    std::fs::write(&path, trace(HEADER, &[10, 20, 30])).unwrap();
    let mut reader = TraceReader::open(&path).unwrap();
    assert_eq!(reader.parameter("Phi"), Some("0.05"));
    let mut sum = 0;
    while let Some(item) = reader.next_item().unwrap() {
        sum += item;
    }
    std::fs::remove_file(&path).unwrap();
    assert_eq!(sum, 60);
}

#[test]
fn test_ingest_into_heavy_hitter() {
    let mut items = vec![];
    for round in 0..2000u32 {
        items.push(1000 + round);
        if round % 2 == 0 {
            items.push(134);
        }
        if round % 5 == 0 {
            items.push(3);
        }
    }
    let mut reader = TraceReader::new(Cursor::new(trace(HEADER, &items))).unwrap();
    let mut hh = HeavyHitterBuilder::new(0.05, 0.01, 0.1, 1 << 20)
        .build(HeavyHitterKind::ConstSketch)
        .unwrap();
    let read = hh.ingest(&mut reader).unwrap();
    assert_that!(read, eq(items.len() as u64));
    assert_that!(hh.total_weight(), eq(3400));
    assert_eq!(hh.query(), &[3, 134]);
}

#[test]
fn test_ingest_stops_on_partial_record() {
    let mut bytes = trace("", &[1, 2, 3]);
    bytes.push(0);
    let mut reader = TraceReader::new(Cursor::new(bytes)).unwrap();
    let mut hh = HeavyHitterBuilder::new(0.1, 0.01, 0.1, 1 << 10)
        .build(HeavyHitterKind::Hierarchical)
        .unwrap();
    let err = hh.ingest(&mut reader).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert_that!(hh.total_weight(), eq(3));
}
