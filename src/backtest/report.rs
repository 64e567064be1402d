use crate::models::{Pair, Timeframe};
use crate::sr::ZoneList;
use crate::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Mutex;

/// Destination for the zone list produced at each recalibration
pub trait ZoneReportSink: Send + Sync {
    fn write(&self, pair: &Pair, timeframe: Timeframe, at: DateTime<Utc>, zones: &ZoneList) -> Result<()>;
}

/// Writes `<outdir>/srareas/<pair>.<tf>.<dd_mm_YYYY_HH_MM>.halist.txt`
#[derive(Debug, Clone)]
pub struct FileReportSink {
    outdir: PathBuf,
}

impl FileReportSink {
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
        }
    }

    pub fn report_path(&self, pair: &Pair, timeframe: Timeframe, at: DateTime<Utc>) -> PathBuf {
        self.outdir.join("srareas").join(format!(
            "{}.{}.{}.halist.txt",
            pair,
            timeframe,
            at.format("%d_%m_%Y_%H_%M")
        ))
    }
}

impl ZoneReportSink for FileReportSink {
    fn write(&self, pair: &Pair, timeframe: Timeframe, at: DateTime<Utc>, zones: &ZoneList) -> Result<()> {
        let path = self.report_path(pair, timeframe, at);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&path, zones.report())?;
        tracing::debug!("Zone report written to {}", path.display());
        Ok(())
    }
}

/// One recorded recalibration
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneReport {
    pub at: DateTime<Utc>,
    pub zones: ZoneList,
}

/// Keeps reports in memory; for tests and synthetic runs
#[derive(Debug, Default)]
pub struct MemoryReportSink {
    reports: Mutex<Vec<ZoneReport>>,
}

impl MemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ZoneReport> {
        self.reports.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ZoneReportSink for MemoryReportSink {
    fn write(&self, _pair: &Pair, _timeframe: Timeframe, at: DateTime<Utc>, zones: &ZoneList) -> Result<()> {
        self.reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ZoneReport {
                at,
                zones: zones.clone(),
            });
        Ok(())
    }
}

impl<T: ZoneReportSink + ?Sized> ZoneReportSink for std::sync::Arc<T> {
    fn write(&self, pair: &Pair, timeframe: Timeframe, at: DateTime<Utc>, zones: &ZoneList) -> Result<()> {
        (**self).write(pair, timeframe, at, zones)
    }
}
