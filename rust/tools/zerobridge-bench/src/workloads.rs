//! Sort workloads comparing copy-translation cost against zero-copy access.

use std::{
    hint::black_box,
    ops::Range,
    time::{Duration, Instant},
};

use clap::ValueEnum;
use zerobridge_arrays::DirectArray;

use crate::corpus::Corpus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Workload {
    /// Deep-copy every string on the managed side, then sort
    ManagedCopy,
    /// Transcode UTF-16 strings to native UTF-8, then sort
    Transcode,
    /// Sort views into one shared direct array
    BufferViews,
    /// Copy each string into its own native array, then sort the arrays
    RecordList,
}

impl Workload {
    pub const ALL: [Workload; 4] = [
        Workload::ManagedCopy,
        Workload::Transcode,
        Workload::BufferViews,
        Workload::RecordList,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Workload::ManagedCopy => "managed copy sort",
            Workload::Transcode => "native string sort",
            Workload::BufferViews => "native buffer view sort",
            Workload::RecordList => "native record list sort",
        }
    }

    /// Runs the workload `iterations` times and returns the elapsed time.
    pub fn run(self, corpus: &Corpus, iterations: usize) -> anyhow::Result<Duration> {
        let mut arena = DirectArray::allocate_managed_direct(corpus.byte_len() as u64);
        anyhow::ensure!(
            arena.has_array(),
            "failed to allocate a {} byte direct array",
            corpus.byte_len()
        );

        let start = Instant::now();
        for _ in 0..iterations {
            match self {
                Workload::ManagedCopy => {
                    black_box(managed_copy_sort(corpus.strings()));
                }
                Workload::Transcode => {
                    black_box(transcode_sort(corpus.utf16())?);
                }
                Workload::BufferViews => {
                    black_box(buffer_view_sort(corpus.strings(), &mut arena));
                }
                Workload::RecordList => {
                    black_box(record_list_sort(corpus.strings()));
                }
            }
        }
        Ok(start.elapsed())
    }
}

/// Deep-copies `strings` and sorts the copies.
pub fn managed_copy_sort(strings: &[String]) -> Vec<String> {
    let mut temp: Vec<String> = strings.iter().map(|s| s.as_str().to_owned()).collect();
    temp.sort();
    temp
}

/// Transcodes each UTF-16 string to UTF-8 and sorts the results.
pub fn transcode_sort(utf16: &[Vec<u16>]) -> anyhow::Result<Vec<String>> {
    let mut temp = utf16
        .iter()
        .map(|units| String::from_utf16(units))
        .collect::<Result<Vec<_>, _>>()?;
    temp.sort();
    Ok(temp)
}

/// Packs the string bytes into `arena` and sorts byte ranges into it, without
/// materializing any per-string buffer.
pub fn buffer_view_sort(strings: &[String], arena: &mut DirectArray) -> Vec<Range<usize>> {
    let mut views = Vec::with_capacity(strings.len());
    let mut offset = 0usize;
    for s in strings {
        let written = arena.write_at(offset as u64, s.as_bytes());
        views.push(offset..offset + written);
        offset += written;
    }
    arena.with_bytes(|bytes| views.sort_by(|a, b| bytes[a.clone()].cmp(&bytes[b.clone()])));
    views
}

/// Copies each string into its own native array and sorts the arrays by contents.
pub fn record_list_sort(strings: &[String]) -> Vec<DirectArray> {
    let mut records: Vec<DirectArray> = strings
        .iter()
        .map(|s| {
            let mut record = DirectArray::allocate_unsafe(s.len() as u64);
            record.write_at(0, s.as_bytes());
            record
        })
        .collect();
    records.sort_by(|a, b| a.with_bytes(|x| b.with_bytes(|y| x.cmp(y))));
    records
}
