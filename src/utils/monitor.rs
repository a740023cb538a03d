#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

/// 單一掃描階段結束時的資源快照
#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub peak_memory_mb: u64,
    /// 自上一個階段結束以來的時間
    pub phase_time: Duration,
    pub total_time: Duration,
}

#[cfg(feature = "cli")]
struct MonitorState {
    system: System,
    peak_memory_mb: u64,
    last_phase: Instant,
    phases: usize,
}

/// 掃描各階段（開啟相機、擷取、辨識）的資源使用統計
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    state: Option<Mutex<MonitorState>>,
    pid: Option<Pid>,
    started: Instant,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let started = Instant::now();
        if !enabled {
            return Self {
                state: None,
                pid: None,
                started,
            };
        }

        let pid = sysinfo::get_current_pid().ok();
        if pid.is_none() {
            tracing::warn!("Unable to resolve current PID, scan stats disabled");
        }

        let system = System::new_with_specifics(
            RefreshKind::nothing().with_processes(ProcessRefreshKind::everything()),
        );

        Self {
            state: Some(Mutex::new(MonitorState {
                system,
                peak_memory_mb: 0,
                last_phase: started,
                phases: 0,
            })),
            pid,
            started,
        }
    }

    /// Closes the current phase and returns its snapshot.
    pub fn finish_phase(&self, phase: &str) -> Option<PhaseStats> {
        let pid = self.pid?;
        let mut state = self.state.as_ref()?.lock().ok()?;

        state
            .system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        let (cpu_usage, memory_mb) = {
            let process = state.system.process(pid)?;
            (process.cpu_usage(), process.memory() / 1024 / 1024)
        };

        state.peak_memory_mb = state.peak_memory_mb.max(memory_mb);
        let now = Instant::now();
        let phase_time = now.duration_since(state.last_phase);
        state.last_phase = now;
        state.phases += 1;

        Some(PhaseStats {
            phase: phase.to_string(),
            cpu_usage,
            memory_mb,
            peak_memory_mb: state.peak_memory_mb,
            phase_time,
            total_time: now.duration_since(self.started),
        })
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(stats) = self.finish_phase(phase) {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Phase: {:?}",
                stats.phase,
                stats.cpu_usage,
                stats.memory_mb,
                stats.peak_memory_mb,
                stats.phase_time
            );
        }
    }

    pub fn log_final_stats(&self) {
        let Some(state) = self.state.as_ref().and_then(|s| s.lock().ok()) else {
            return;
        };
        tracing::info!(
            "📊 Scan finished - {} phases, Total Time: {:?}, Peak Memory: {}MB",
            state.phases,
            self.started.elapsed(),
            state.peak_memory_mb
        );
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 非 CLI 環境的空實作
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_reports_nothing() {
        let monitor = SystemMonitor::new(false);
        assert!(!monitor.is_enabled());
        assert!(monitor.finish_phase("Camera started").is_none());
        monitor.log_final_stats();
    }

    #[test]
    fn test_phases_accumulate_total_time() {
        let monitor = SystemMonitor::new(true);
        assert!(monitor.is_enabled());

        let Some(first) = monitor.finish_phase("Dialog opened") else {
            return; // process table unavailable in this sandbox
        };
        std::thread::sleep(Duration::from_millis(5));
        let second = monitor.finish_phase("Frame captured").unwrap();

        assert_eq!(second.phase, "Frame captured");
        assert!(second.phase_time >= Duration::from_millis(5));
        assert!(second.total_time >= first.total_time + second.phase_time);
        assert!(second.peak_memory_mb >= first.memory_mb);
    }
}
