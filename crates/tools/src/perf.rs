use std::time::Instant;

use crate::csv::PerfSample;

/// Number of frame times kept for the moving average.
pub const HISTORY: usize = 100;

/// Work counted during one frame. Reset by [`PerfTracker::begin_frame`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCounters {
    pub draw_calls: u32,
    pub triangles: u64,
    pub shader_binds: u32,
    pub texture_binds: u32,
    pub upload_bytes: u64,
}

/// Frame stopwatch with a ring buffer of recent frame times.
#[derive(Debug, Clone)]
pub struct PerfTracker {
    history: [f64; HISTORY],
    frame_count: u64,
    frame_ms: f64,
    cpu_ms: f64,
    gpu_wait_ms: f64,
    avg_ms: f64,
    min_ms: f64,
    max_ms: f64,
    fps: f64,
    counters: FrameCounters,
    vram_bytes: u64,
    frame_start: Option<Instant>,
    cpu_start: Option<Instant>,
    cpu_measured: bool,
}

impl Default for PerfTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PerfTracker {
    pub fn new() -> Self {
        Self {
            history: [0.0; HISTORY],
            frame_count: 0,
            frame_ms: 0.0,
            cpu_ms: 0.0,
            gpu_wait_ms: 0.0,
            avg_ms: 0.0,
            min_ms: f64::INFINITY,
            max_ms: 0.0,
            fps: 0.0,
            counters: FrameCounters::default(),
            vram_bytes: 0,
            frame_start: None,
            cpu_start: None,
            cpu_measured: false,
        }
    }

    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        self.counters = FrameCounters::default();
        self.frame_start = Some(now);
        self.cpu_start = Some(now);
        self.cpu_measured = false;
    }

    /// Start of the CPU-side render section.
    pub fn begin_cpu(&mut self) {
        self.cpu_start = Some(Instant::now());
    }

    /// End of the CPU-side render section (before present).
    pub fn end_cpu(&mut self) {
        if let Some(start) = self.cpu_start {
            self.cpu_ms = start.elapsed().as_secs_f64() * 1000.0;
            self.cpu_measured = true;
        }
    }

    /// Close the frame and return its sample. Without a matching
    /// [`begin_frame`](Self::begin_frame) the frame time is zero.
    pub fn end_frame(&mut self) -> PerfSample {
        let frame_ms = self
            .frame_start
            .take()
            .map_or(0.0, |start| start.elapsed().as_secs_f64() * 1000.0);
        let cpu_ms = if self.cpu_measured { self.cpu_ms } else { frame_ms };
        self.record(frame_ms, cpu_ms)
    }

    /// Record one frame with externally measured times.
    pub fn record(&mut self, frame_ms: f64, cpu_ms: f64) -> PerfSample {
        self.frame_ms = frame_ms;
        self.cpu_ms = cpu_ms;
        self.gpu_wait_ms = (frame_ms - cpu_ms).max(0.0);

        self.history[(self.frame_count % HISTORY as u64) as usize] = frame_ms;
        self.frame_count += 1;

        let filled = self.filled();
        self.avg_ms = self.history[..filled].iter().sum::<f64>() / filled as f64;
        self.fps = if self.avg_ms > 0.0 { 1000.0 / self.avg_ms } else { 0.0 };
        self.min_ms = self.min_ms.min(frame_ms);
        self.max_ms = self.max_ms.max(frame_ms);

        self.sample()
    }

    fn filled(&self) -> usize {
        (self.frame_count as usize).min(HISTORY)
    }

    pub fn count_draw_call(&mut self) {
        self.counters.draw_calls += 1;
    }

    pub fn count_triangles(&mut self, tris: u64) {
        self.counters.triangles += tris;
    }

    pub fn count_shader_bind(&mut self) {
        self.counters.shader_binds += 1;
    }

    pub fn count_texture_bind(&mut self) {
        self.counters.texture_binds += 1;
    }

    pub fn count_upload(&mut self, bytes: u64) {
        self.counters.upload_bytes += bytes;
    }

    /// Fold a renderer's per-frame counts into this frame.
    pub fn add_counters(&mut self, c: FrameCounters) {
        self.counters.draw_calls += c.draw_calls;
        self.counters.triangles += c.triangles;
        self.counters.shader_binds += c.shader_binds;
        self.counters.texture_binds += c.texture_binds;
        self.counters.upload_bytes += c.upload_bytes;
    }

    pub fn track_alloc(&mut self, bytes: u64) {
        self.vram_bytes = self.vram_bytes.saturating_add(bytes);
    }

    pub fn track_free(&mut self, bytes: u64) {
        self.vram_bytes = self.vram_bytes.saturating_sub(bytes);
    }

    pub fn counters(&self) -> FrameCounters {
        self.counters
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frame_ms(&self) -> f64 {
        self.frame_ms
    }

    pub fn avg_ms(&self) -> f64 {
        self.avg_ms
    }

    /// Smallest frame time so far, 0 before the first frame.
    pub fn min_ms(&self) -> f64 {
        if self.frame_count == 0 { 0.0 } else { self.min_ms }
    }

    pub fn max_ms(&self) -> f64 {
        self.max_ms
    }

    pub fn cpu_ms(&self) -> f64 {
        self.cpu_ms
    }

    pub fn gpu_wait_ms(&self) -> f64 {
        self.gpu_wait_ms
    }

    pub fn vram_bytes(&self) -> u64 {
        self.vram_bytes
    }

    /// Current state as one CSV row.
    pub fn sample(&self) -> PerfSample {
        PerfSample {
            fps: self.fps,
            frame_ms: self.frame_ms,
            avg_frame_ms: self.avg_ms,
            cpu_ms: self.cpu_ms,
            gpu_wait_ms: self.gpu_wait_ms,
            draw_calls: self.counters.draw_calls,
            triangles: self.counters.triangles,
            vram_mb: self.vram_bytes as f64 / (1024.0 * 1024.0),
            upload_kb: self.counters.upload_bytes as f64 / 1024.0,
        }
    }

    pub fn summary_line(&self) -> String {
        format!(
            "FPS: {:.1} | Frame: {:.2} ms (avg: {:.2} ms, min: {:.2} ms, max: {:.2} ms) | CPU: {:.2} ms | DrawCalls: {} | Tris: {}",
            self.fps,
            self.frame_ms,
            self.avg_ms,
            self.min_ms(),
            self.max_ms,
            self.cpu_ms,
            self.counters.draw_calls,
            self.counters.triangles
        )
    }

    pub fn log_summary(&self) {
        tracing::debug!("{}", self.summary_line());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_covers_recorded_frames_only() {
        let mut perf = PerfTracker::new();
        perf.record(10.0, 4.0);
        perf.record(20.0, 4.0);
        assert!((perf.avg_ms() - 15.0).abs() < 1e-9);
        assert!((perf.fps() - 1000.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn ring_buffer_drops_old_frames() {
        let mut perf = PerfTracker::new();
        for _ in 0..HISTORY {
            perf.record(100.0, 0.0);
        }
        for _ in 0..HISTORY {
            perf.record(10.0, 0.0);
        }
        assert!((perf.avg_ms() - 10.0).abs() < 1e-9);
        assert_eq!(perf.frame_count(), 2 * HISTORY as u64);
    }

    #[test]
    fn min_max_track_extremes() {
        let mut perf = PerfTracker::new();
        assert_eq!(perf.min_ms(), 0.0);
        perf.record(16.0, 1.0);
        perf.record(5.0, 1.0);
        perf.record(30.0, 1.0);
        assert_eq!(perf.min_ms(), 5.0);
        assert_eq!(perf.max_ms(), 30.0);
    }

    #[test]
    fn gpu_wait_is_frame_minus_cpu() {
        let mut perf = PerfTracker::new();
        let sample = perf.record(16.0, 6.0);
        assert_eq!(sample.gpu_wait_ms, 10.0);
        let sample = perf.record(5.0, 6.0);
        assert_eq!(sample.gpu_wait_ms, 0.0);
    }

    #[test]
    fn zero_frame_time_gives_zero_fps() {
        let mut perf = PerfTracker::new();
        perf.record(0.0, 0.0);
        assert_eq!(perf.fps(), 0.0);
    }

    #[test]
    fn begin_frame_resets_counters() {
        let mut perf = PerfTracker::new();
        perf.begin_frame();
        perf.count_draw_call();
        perf.count_triangles(12);
        perf.count_shader_bind();
        perf.count_texture_bind();
        perf.count_upload(2048);
        assert_eq!(perf.counters().draw_calls, 1);
        assert_eq!(perf.counters().shader_binds, 1);
        assert_eq!(perf.sample().upload_kb, 2.0);

        perf.begin_frame();
        assert_eq!(perf.counters(), FrameCounters::default());
    }

    #[test]
    fn add_counters_accumulates() {
        let mut perf = PerfTracker::new();
        let c = FrameCounters {
            draw_calls: 3,
            triangles: 36,
            shader_binds: 2,
            texture_binds: 1,
            upload_bytes: 64,
        };
        perf.add_counters(c);
        perf.add_counters(c);
        assert_eq!(perf.counters().draw_calls, 6);
        assert_eq!(perf.counters().triangles, 72);
    }

    #[test]
    fn vram_saturates_on_free() {
        let mut perf = PerfTracker::new();
        perf.track_alloc(1024 * 1024);
        perf.track_free(4 * 1024 * 1024);
        assert_eq!(perf.vram_bytes(), 0);
        perf.track_alloc(2 * 1024 * 1024);
        assert_eq!(perf.sample().vram_mb, 2.0);
    }

    #[test]
    fn end_frame_measures_elapsed_time() {
        let mut perf = PerfTracker::new();
        perf.begin_frame();
        perf.begin_cpu();
        perf.end_cpu();
        let sample = perf.end_frame();
        assert!(sample.frame_ms >= 0.0);
        assert!(sample.cpu_ms <= sample.frame_ms);
        assert_eq!(perf.frame_count(), 1);
    }

    #[test]
    fn summary_line_format() {
        let mut perf = PerfTracker::new();
        perf.begin_frame();
        perf.count_draw_call();
        perf.count_triangles(36);
        perf.record(20.0, 5.0);
        assert_eq!(
            perf.summary_line(),
            "FPS: 50.0 | Frame: 20.00 ms (avg: 20.00 ms, min: 20.00 ms, max: 20.00 ms) | CPU: 5.00 ms | DrawCalls: 1 | Tris: 36"
        );
    }
}
