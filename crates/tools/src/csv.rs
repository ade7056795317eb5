use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use crate::ToolsError;

pub const CSV_HEADER: &str =
    "FPS,FrameTime(ms),AvgFrame(ms),CPUTime(ms),GPUWait(ms),DrawCalls,Triangles,VRAM(MB),Upload(KB)";

const COLUMNS: usize = 9;

/// One frame's row in the stats CSV.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerfSample {
    pub fps: f64,
    pub frame_ms: f64,
    pub avg_frame_ms: f64,
    pub cpu_ms: f64,
    pub gpu_wait_ms: f64,
    pub draw_calls: u32,
    pub triangles: u64,
    pub vram_mb: f64,
    pub upload_kb: f64,
}

impl PerfSample {
    fn to_row(&self) -> String {
        format!(
            "{:.3},{:.3},{:.3},{:.3},{:.3},{},{},{:.3},{:.3}",
            self.fps,
            self.frame_ms,
            self.avg_frame_ms,
            self.cpu_ms,
            self.gpu_wait_ms,
            self.draw_calls,
            self.triangles,
            self.vram_mb,
            self.upload_kb
        )
    }

    fn parse_row(line_no: usize, row: &str) -> Result<Self, ToolsError> {
        let fields: Vec<&str> = row.split(',').map(str::trim).collect();
        if fields.len() != COLUMNS {
            return Err(ToolsError::Parse {
                line: line_no,
                message: format!("expected {COLUMNS} columns, found {}", fields.len()),
            });
        }
        let float = |i: usize| -> Result<f64, ToolsError> {
            fields[i].parse().map_err(|e| ToolsError::Parse {
                line: line_no,
                message: format!("column {}: {e}", i + 1),
            })
        };
        let int = |i: usize| -> Result<u64, ToolsError> {
            fields[i].parse().map_err(|e| ToolsError::Parse {
                line: line_no,
                message: format!("column {}: {e}", i + 1),
            })
        };
        Ok(Self {
            fps: float(0)?,
            frame_ms: float(1)?,
            avg_frame_ms: float(2)?,
            cpu_ms: float(3)?,
            gpu_wait_ms: float(4)?,
            draw_calls: u32::try_from(int(5)?).map_err(|e| ToolsError::Parse {
                line: line_no,
                message: format!("column 6: {e}"),
            })?,
            triangles: int(6)?,
            vram_mb: float(7)?,
            upload_kb: float(8)?,
        })
    }
}

/// Append-only stats CSV. The header is written on creation; rows are
/// buffered and flushed on drop.
pub struct StatsCsv<W: Write = File> {
    out: BufWriter<W>,
    rows: usize,
}

impl StatsCsv<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ToolsError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ToolsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "writing frame stats");
        Self::from_writer(file)
    }
}

impl<W: Write> StatsCsv<W> {
    pub fn from_writer(writer: W) -> Result<Self, ToolsError> {
        let mut out = BufWriter::new(writer);
        writeln!(out, "{CSV_HEADER}")?;
        Ok(Self { out, rows: 0 })
    }

    pub fn append(&mut self, sample: &PerfSample) -> Result<(), ToolsError> {
        writeln!(self.out, "{}", sample.to_row())?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> Result<(), ToolsError> {
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Drop for StatsCsv<W> {
    fn drop(&mut self) {
        if let Err(e) = self.out.flush() {
            tracing::warn!("failed to flush stats csv: {e}");
        }
    }
}

/// Aggregate view of a stats CSV.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatsSummary {
    pub frames: usize,
    pub mean_fps: f64,
    pub min_fps: f64,
    pub max_fps: f64,
    pub mean_frame_ms: f64,
    pub mean_draw_calls: f64,
    pub peak_vram_mb: f64,
}

impl StatsSummary {
    /// Read a CSV written by [`StatsCsv`]. Blank lines are skipped.
    pub fn from_csv(reader: impl BufRead) -> Result<Self, ToolsError> {
        let mut lines = reader.lines();
        match lines.next() {
            Some(header) => {
                let header = header?;
                if header.trim() != CSV_HEADER {
                    return Err(ToolsError::Parse {
                        line: 1,
                        message: format!("unexpected header `{}`", header.trim()),
                    });
                }
            }
            None => {
                return Err(ToolsError::Parse {
                    line: 1,
                    message: "empty file".into(),
                });
            }
        }

        let mut summary = Self {
            min_fps: f64::INFINITY,
            ..Self::default()
        };
        let (mut fps_sum, mut frame_sum, mut draw_sum) = (0.0, 0.0, 0.0);
        for (i, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let sample = PerfSample::parse_row(i + 2, &line)?;
            summary.frames += 1;
            fps_sum += sample.fps;
            frame_sum += sample.frame_ms;
            draw_sum += f64::from(sample.draw_calls);
            summary.min_fps = summary.min_fps.min(sample.fps);
            summary.max_fps = summary.max_fps.max(sample.fps);
            summary.peak_vram_mb = summary.peak_vram_mb.max(sample.vram_mb);
        }

        if summary.frames == 0 {
            summary.min_fps = 0.0;
            return Ok(summary);
        }
        let n = summary.frames as f64;
        summary.mean_fps = fps_sum / n;
        summary.mean_frame_ms = frame_sum / n;
        summary.mean_draw_calls = draw_sum / n;
        Ok(summary)
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Frames:      {}", self.frames)?;
        writeln!(
            f,
            "FPS:         mean {:.1}, min {:.1}, max {:.1}",
            self.mean_fps, self.min_fps, self.max_fps
        )?;
        writeln!(f, "Frame time:  mean {:.2} ms", self.mean_frame_ms)?;
        writeln!(f, "Draw calls:  mean {:.1}", self.mean_draw_calls)?;
        write!(f, "Peak VRAM:   {:.2} MB", self.peak_vram_mb)
    }
}
