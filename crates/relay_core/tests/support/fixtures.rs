#![allow(dead_code)]

use std::io::Write;

use relay_core::agents::AgentId;
use relay_core::traces::{EncounterRecord, SocialEdge};
use tempfile::NamedTempFile;

pub fn file_with(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write fixture");
    file
}

/// Undirected path 0 - 1 - ... - (n - 1).
pub fn chain_edges(n: AgentId) -> Vec<SocialEdge> {
    (1..n)
        .map(|i| SocialEdge {
            first: i - 1,
            second: i,
            weight: 1.0,
        })
        .collect()
}

pub fn contact(first: AgentId, second: AgentId, start_time: f64) -> EncounterRecord {
    EncounterRecord {
        first,
        second,
        start_time,
        end_time: start_time + 60.0,
        signal_strength: -70.0,
    }
}
