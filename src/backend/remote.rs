//! Remote backend with batched, parallel bin retrieval.
//!
//! Round-trip latency dominates small reads, so [`RemoteBackend::prefetch`]
//! groups consecutive bins into runs, fetches each run with a single
//! constrained request and issues the runs concurrently on a bounded pool.
//! Fetched bins stay cached for the lifetime of the backend.

use super::{Backend, BinData};
use crate::error::{GshhsError, Result};
use crate::globals::{Globals, GlobalsParts};
use crate::source::{ArrayData, Constraint, DapResponse, DapTransport, vars};
use parking_lot::RwLock;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Inclusive range of consecutive bins fetched in one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinRun {
    pub first_bin: usize,
    pub last_bin: usize,
}

/// Splits ascending `bins` into runs of consecutive indices and trims bins
/// that need no fetch (empty or cached) from both ends of each run.
pub fn plan_runs(bins: &[usize], globals: &Globals, is_cached: impl Fn(usize) -> bool) -> Vec<BinRun> {
    let skip = |bin: usize| globals.segment_count(bin) == 0 || is_cached(bin);
    let mut runs = Vec::new();

    let mut i = 0;
    while i < bins.len() {
        let mut first = bins[i];
        let mut last = first;
        i += 1;
        while i < bins.len() && bins[i] == last + 1 {
            last = bins[i];
            i += 1;
        }

        while first <= last && skip(first) {
            first += 1;
        }
        while last >= first && skip(last) {
            if last == 0 {
                break;
            }
            last -= 1;
        }
        if first <= last && !skip(first) {
            runs.push(BinRun {
                first_bin: first,
                last_bin: last,
            });
        }
    }

    runs
}

/// Bin retrieval through a [`DapTransport`].
pub struct RemoteBackend<T: DapTransport> {
    transport: T,
    url: String,
    globals: Globals,
    cache: RwLock<FxHashMap<usize, Arc<BinData>>>,
    pool: rayon::ThreadPool,
}

impl<T: DapTransport> RemoteBackend<T> {
    /// Connects to `server_path/database` and reads the globals.
    pub fn open(transport: T, server_path: &str, database: &str, fetch_threads: usize) -> Result<Self> {
        let url = format!("{}/{}", server_path.trim_end_matches('/'), database);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(fetch_threads.max(1))
            .thread_name(|i| format!("gshhs-fetch-{}", i))
            .build()
            .map_err(|e| GshhsError::Config(e.to_string()))?;

        let globals = read_globals(&transport, &url)?;
        log::info!(
            "Opened {}: {}x{} bins of {:.4} deg, {} segments, {} points",
            url,
            globals.grid.lon_bins,
            globals.grid.lat_bins,
            globals.bin_size(),
            globals.total_segments,
            globals.total_points
        );

        Ok(Self {
            transport,
            url,
            globals,
            cache: RwLock::new(FxHashMap::default()),
            pool,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Number of bins currently cached.
    pub fn cached_bins(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_cached(&self, bin: usize) -> bool {
        self.cache.read().contains_key(&bin)
    }

    fn fetch_run(&self, run: &BinRun) -> Result<Vec<(usize, Arc<BinData>)>> {
        let globals = &self.globals;
        let first_segment = globals.first_segment(run.first_bin);
        let last_segment = globals.first_segment(run.last_bin) + globals.segment_count(run.last_bin) - 1;
        let segments = last_segment - first_segment + 1;
        let points = globals.point_range(first_segment, last_segment);

        let constraint = Constraint::new()
            .slice(vars::SEGMENT_LEVEL, first_segment, segments)
            .slice(vars::SEGMENT_POINTS, first_segment, segments)
            .slice(vars::DX, points.start, points.len())
            .slice(vars::DY, points.start, points.len());

        let context = format!("bins {}..={}", run.first_bin, run.last_bin);
        log::debug!("Fetching {} from {}: {}", context, self.url, constraint);

        let mut response = self
            .transport
            .fetch(&self.url, &constraint)
            .map_err(|e| GshhsError::backend(context.clone(), e))?;

        let levels = take(&mut response, vars::SEGMENT_LEVEL, segments, &context)?.to_u16();
        let counts = take(&mut response, vars::SEGMENT_POINTS, segments, &context)?.to_u16();
        let dx = take(&mut response, vars::DX, points.len(), &context)?.to_u16();
        let dy = take(&mut response, vars::DY, points.len(), &context)?.to_u16();

        let mut bins = Vec::with_capacity(run.last_bin - run.first_bin + 1);
        for bin in run.first_bin..=run.last_bin {
            let bin_segments = globals.segment_range(bin);
            if bin_segments.is_empty() {
                continue;
            }
            let bin_points = globals.bin_point_range(bin);
            let seg = bin_segments.start - first_segment..bin_segments.end - first_segment;
            let pts = bin_points.start - points.start..bin_points.end - points.start;

            bins.push((
                bin,
                Arc::new(BinData {
                    levels: levels[seg.clone()].to_vec(),
                    point_counts: counts[seg].to_vec(),
                    dx: dx[pts.clone()].to_vec(),
                    dy: dy[pts].to_vec(),
                }),
            ));
        }

        Ok(bins)
    }
}

/// Removes an array from a response, checking it holds `expected` values.
///
/// Empty slices are left out of a constraint, so an absent array is empty.
fn take(response: &mut DapResponse, var: &str, expected: usize, context: &str) -> Result<ArrayData> {
    if expected == 0 {
        return Ok(response.remove(var).unwrap_or(ArrayData::Short(Vec::new())));
    }
    let data = response.remove(var).ok_or_else(|| {
        GshhsError::backend(context.to_string(), format!("response is missing {}", var))
    })?;
    if data.len() != expected {
        return Err(GshhsError::backend(
            context.to_string(),
            format!("{} has {} values, expected {}", var, data.len(), expected),
        ));
    }
    Ok(data)
}

fn read_globals<T: DapTransport>(transport: &T, url: &str) -> Result<Globals> {
    let dimension = |var: &str| {
        transport
            .dimension(url, var)
            .map_err(|e| GshhsError::open(url, format!("{}: {}", var, e)))
    };
    let total_bins = dimension(vars::SEGMENT_COUNT)?;
    let total_segments = dimension(vars::FIRST_POINT)?;
    let total_points = dimension(vars::DX)?;

    let constraint = Constraint::new()
        .slice(vars::BIN_SIZE_MINUTES, 0, 1)
        .slice(vars::LON_BINS, 0, 1)
        .slice(vars::LAT_BINS, 0, 1)
        .slice(vars::FIRST_SEGMENT, 0, total_bins)
        .slice(vars::SEGMENT_COUNT, 0, total_bins)
        .slice(vars::FIRST_POINT, 0, total_segments);
    let mut response = transport
        .fetch(url, &constraint)
        .map_err(|e| GshhsError::open(url, e))?;

    let mut array = |var: &str, expected: usize| -> Result<ArrayData> {
        take(&mut response, var, expected, "globals").map_err(|e| GshhsError::open(url, e))
    };

    Globals::from_parts(GlobalsParts {
        bin_size_minutes: array(vars::BIN_SIZE_MINUTES, 1)?.scalar(vars::BIN_SIZE_MINUTES)?,
        lon_bins: array(vars::LON_BINS, 1)?.scalar(vars::LON_BINS)?,
        lat_bins: array(vars::LAT_BINS, 1)?.scalar(vars::LAT_BINS)?,
        total_bins,
        total_segments,
        total_points,
        first_segment: array(vars::FIRST_SEGMENT, total_bins)?.to_indices(vars::FIRST_SEGMENT)?,
        segment_count: array(vars::SEGMENT_COUNT, total_bins)?.to_indices(vars::SEGMENT_COUNT)?,
        first_point: array(vars::FIRST_POINT, total_segments)?.to_indices(vars::FIRST_POINT)?,
    })
}

impl<T: DapTransport> Backend for RemoteBackend<T> {
    fn globals(&self) -> &Globals {
        &self.globals
    }

    fn prefetch(&self, bins: &[usize]) -> Result<()> {
        debug_assert!(
            bins.windows(2).all(|w| w[0] < w[1]),
            "prefetch bins must be sorted and unique"
        );

        let runs = {
            let cache = self.cache.read();
            plan_runs(bins, &self.globals, |bin| cache.contains_key(&bin))
        };
        if runs.is_empty() {
            log::debug!("Prefetch of {} bins served from cache", bins.len());
            return Ok(());
        }
        log::debug!(
            "Prefetching {} bins in {} batched reads from {}",
            bins.len(),
            runs.len(),
            self.url
        );

        let fetched = self.pool.install(|| {
            runs.par_iter()
                .map(|run| self.fetch_run(run))
                .collect::<Result<Vec<_>>>()
        })?;

        let mut cache = self.cache.write();
        for (bin, data) in fetched.into_iter().flatten() {
            cache.entry(bin).or_insert(data);
        }
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if a non-empty bin is read without a covering `prefetch`.
    fn read_bin(&self, bin: usize) -> Result<Arc<BinData>> {
        if let Some(data) = self.cache.read().get(&bin) {
            return Ok(Arc::clone(data));
        }
        if self.globals.segment_count(bin) == 0 {
            return Ok(Arc::new(BinData::default()));
        }
        panic!("bin {} of {} was read before being prefetched", bin, self.url);
    }

    fn describe(&self) -> String {
        format!("remote:{}", self.url)
    }
}
