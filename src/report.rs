use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::config::ReportFormat;
use crate::error::ScanError;
use crate::types::{ScanResult, ScanSummary};

const RULE_WIDTH: usize = 50;

/// One result as a single line, shared by the console and the text report.
pub fn format_line(r: &ScanResult) -> String {
    if r.is_open() {
        format!(
            "[+] {:<15} | Port: {:<5} | Banner: {:?}",
            r.address,
            r.port,
            r.banner.as_deref().unwrap_or("")
        )
    } else {
        format!(
            "[-] {:<15} | Port: {:<5} | Status: {}",
            r.address, r.port, r.status
        )
    }
}

/// Closing line of a run.
pub fn summary_line(s: &ScanSummary) -> String {
    let rounded = Duration::from_millis(s.duration.as_millis() as u64);
    format!(
        "[✓] Scan complete in {:?}. {} open ports found.",
        rounded, s.open
    )
}

#[derive(Serialize)]
struct SummaryRecord<'a> {
    summary: &'a ScanSummary,
}

/// Persisted report. Open ports are always recorded; closed ones only when
/// `verbose` is set.
#[derive(Debug)]
pub struct ReportWriter<W: Write = BufWriter<File>> {
    out: W,
    format: ReportFormat,
    verbose: bool,
}

impl ReportWriter<BufWriter<File>> {
    /// Create (or truncate) the report file. Called before any probing so a
    /// bad path fails the run up front.
    pub fn create(
        path: impl AsRef<Path>,
        format: ReportFormat,
        verbose: bool,
    ) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ScanError::ReportCreate {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file), format, verbose))
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W, format: ReportFormat, verbose: bool) -> Self {
        Self {
            out,
            format,
            verbose,
        }
    }

    pub fn write_header(
        &mut self,
        summary: &ScanSummary,
        started: OffsetDateTime,
    ) -> Result<(), ScanError> {
        if self.format == ReportFormat::Json {
            return Ok(());
        }
        let stamp = started
            .format(&Rfc2822)
            .unwrap_or_else(|_| started.unix_timestamp().to_string());
        writeln!(self.out, "PORTSWEEP SCAN REPORT - {stamp}")?;
        writeln!(
            self.out,
            "Target: {} | Ports: {}",
            summary.target, summary.ports_spec
        )?;
        writeln!(self.out, "{}", "-".repeat(RULE_WIDTH))?;
        Ok(())
    }

    /// Append one result if it belongs in the report.
    pub fn record(&mut self, r: &ScanResult) -> Result<(), ScanError> {
        if !r.is_open() && !self.verbose {
            return Ok(());
        }
        match self.format {
            ReportFormat::Text => writeln!(self.out, "{}", format_line(r))?,
            ReportFormat::Json => {
                serde_json::to_writer(&mut self.out, r)?;
                writeln!(self.out)?;
            }
        }
        Ok(())
    }

    /// Write the trailer, flush, and hand back the sink.
    pub fn finish(mut self, summary: &ScanSummary) -> Result<W, ScanError> {
        match self.format {
            ReportFormat::Text => {
                writeln!(self.out, "{}", "-".repeat(RULE_WIDTH))?;
                writeln!(self.out, "{}", summary_line(summary))?;
            }
            ReportFormat::Json => {
                serde_json::to_writer(&mut self.out, &SummaryRecord { summary })?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        Ok(self.out)
    }
}
