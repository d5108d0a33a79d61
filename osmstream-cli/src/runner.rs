//! Shared command execution: logging setup, store wiring and the periodic
//! progress reporter.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::info;

use osmstream::config::ProcessConfig;
use osmstream::db::{MemoryNodeStore, MemoryWayStore};
use osmstream::logging::{init_logging, LogConfig, LoggingGuard};
use osmstream::pbf::PbfReader;
use osmstream::process::{count_elements, PbfProcessor, ProgressProbe};
use osmstream::resolver::OsmApiClient;
use osmstream::store::CoordinateStore;

use crate::error::CliError;

/// Runs CLI commands against the osmstream library.
pub struct CliRunner {
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Initializes logging and builds the runner.
    pub fn new(log_dir: &str, quiet: bool, rotate_logs: bool) -> Result<Self, CliError> {
        let config = LogConfig::new()
            .with_dir(log_dir)
            .with_console(!quiet)
            .with_daily_rotation(rotate_logs);
        let logging =
            init_logging(&config).map_err(|e| CliError::LoggingInit(e.to_string()))?;
        Ok(Self { _logging: logging })
    }

    /// Counts nodes, ways and relations in a PBF file.
    pub fn count(&self, file: &str) -> Result<(), CliError> {
        let mut reader = PbfReader::from_path(file)?;
        let counts = count_elements(&mut reader)?;

        println!("nodes:     {}", counts.nodes);
        println!("ways:      {}", counts.ways);
        println!("relations: {}", counts.relations);
        Ok(())
    }

    /// Downloads a PBF extract to a local file.
    pub fn fetch(&self, url: &str, output: &str) -> Result<(), CliError> {
        let bytes = osmstream::download::fetch_pbf(url, output)?;
        println!("downloaded {} bytes to {}", bytes, output);
        Ok(())
    }

    /// Runs the complete pass over a PBF file.
    ///
    /// Entities land in the in-memory reference stores; persistent
    /// backends plug in through the library's `NodeStore`/`WayStore`
    /// traits. The coordinate file is the durable artifact of this
    /// command.
    pub fn ingest(
        &self,
        file: &str,
        coords: Option<String>,
        block_size: u64,
        batch_size: usize,
        timeout_secs: u64,
        report_interval_secs: u64,
    ) -> Result<(), CliError> {
        let coords = coordinate_path(file, coords);
        let config = ProcessConfig::new()
            .with_block_size(block_size)
            .with_batch_size(batch_size)
            .with_store_timeout(Duration::from_secs(timeout_secs));

        let mut store = CoordinateStore::create(&coords, config.block_size())?;
        let fallback = OsmApiClient::new()?;
        let mut nodes = MemoryNodeStore::new();
        let mut ways = MemoryWayStore::new();
        let mut reader = PbfReader::from_path(file)?;

        let mut processor =
            PbfProcessor::new(config, &mut store, &fallback, &mut nodes, &mut ways);
        let reporter = ProgressReporter::start(processor.probe(), report_interval_secs);
        let result = processor.run(&mut reader);
        reporter.stop();
        let summary = result?;

        info!(
            nodes = summary.nodes_seen,
            ways = summary.ways_seen,
            cancelled = summary.cancelled,
            "ingest complete"
        );
        println!("nodes seen:     {}", summary.nodes_seen);
        println!("ways seen:      {}", summary.ways_seen);
        println!("tagged nodes:   {}", nodes.len());
        println!("ways assembled: {}", ways.len());
        println!("coordinate file: {}", coords.display());

        store.close()?;
        Ok(())
    }

    /// Writes only the coordinate file from a PBF.
    pub fn coordinates(
        &self,
        file: &str,
        coords: Option<String>,
        block_size: u64,
        report_interval_secs: u64,
    ) -> Result<(), CliError> {
        let coords = coordinate_path(file, coords);
        let config = ProcessConfig::new().with_block_size(block_size);

        let mut store = CoordinateStore::create(&coords, config.block_size())?;
        let fallback = OsmApiClient::new()?;
        let mut nodes = MemoryNodeStore::new();
        let mut ways = MemoryWayStore::new();
        let mut reader = PbfReader::from_path(file)?;

        let mut processor =
            PbfProcessor::new(config, &mut store, &fallback, &mut nodes, &mut ways);
        let reporter = ProgressReporter::start(processor.probe(), report_interval_secs);
        let result = processor.write_coordinates(&mut reader);
        reporter.stop();
        let summary = result?;

        println!("nodes written:   {}", summary.nodes_seen);
        println!("coordinate file: {}", coords.display());

        store.close()?;
        Ok(())
    }

    /// Resolves one id against an existing coordinate file.
    pub fn lookup(&self, coords: &str, id: i64) -> Result<(), CliError> {
        let store = CoordinateStore::open_for_query(coords)?;
        match store.lookup(id)? {
            Some((lon, lat)) => println!("{} -> lon {:.7}, lat {:.7}", id, lon, lat),
            None => println!("{} -> not found", id),
        }
        Ok(())
    }

    /// Rebuilds the sparse index of a coordinate file with a new stride.
    pub fn resize(&self, coords: &str, block_size: u64) -> Result<(), CliError> {
        let mut store = CoordinateStore::open_for_query(coords)?;
        store.resize_sparse(block_size)?;

        println!(
            "sparse index rebuilt: stride {}, {} entries",
            store.block_size(),
            store.sparse_entries()
        );
        store.close()?;
        Ok(())
    }
}

fn coordinate_path(pbf_file: &str, coords: Option<String>) -> PathBuf {
    match coords {
        Some(path) => PathBuf::from(path),
        None => Path::new(pbf_file).with_extension("coords"),
    }
}

/// Samples the progress probe on an interval from a helper thread.
struct ProgressReporter {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ProgressReporter {
    /// Starts the reporter; an interval of 0 disables it.
    fn start(probe: Arc<ProgressProbe>, interval_secs: u64) -> Self {
        if interval_secs == 0 {
            return Self {
                stop: Arc::new(AtomicBool::new(true)),
                handle: None,
            };
        }

        let stop = Arc::new(AtomicBool::new(false));
        let stop_signal = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            let interval = Duration::from_secs(interval_secs);
            while !stop_signal.load(Ordering::Relaxed) {
                thread::sleep(interval);
                let (nodes, ways) = probe.snapshot();
                info!(nodes, ways, "progress");
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
