use std::collections::BTreeMap;
use sysinfo::{ProcessesToUpdate, System};

/// 当前进程的内存占用快照，单位 MB
///
/// `rss` 为常驻内存，`virtual` 为虚拟内存。取不到进程信息时返回空表。
pub fn snapshot() -> BTreeMap<String, String> {
    let pid = match sysinfo::get_current_pid() {
        Ok(pid) => pid,
        Err(e) => {
            tracing::debug!("Memory snapshot unavailable: {}", e);
            return BTreeMap::new();
        }
    };

    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    match sys.process(pid) {
        Some(process) => render(process.memory(), process.virtual_memory()),
        None => BTreeMap::new(),
    }
}

fn render(rss_bytes: u64, virtual_bytes: u64) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("rss".to_string(), megabytes(rss_bytes)),
        ("virtual".to_string(), megabytes(virtual_bytes)),
    ])
}

fn megabytes(bytes: u64) -> String {
    format!("{}MB", (bytes as f64 / 1_000_000.0).round() as u64)
}
