use sysinfo::System;
use tracing::info;

pub struct SystemDiagnostics;

impl SystemDiagnostics {
    pub fn log_startup_info() {
        let mut sys = System::new_all();
        sys.refresh_all();

        // OS
        let os_name = System::name().unwrap_or_else(|| "Unknown".to_string());
        let os_ver = System::os_version().unwrap_or_default();
        info!("os: {} {} (kernel {})", os_name, os_ver, System::kernel_version().unwrap_or_else(|| "Unknown".to_string()));

        // CPU
        let cpus = sys.cpus();
        if let Some(cpu) = cpus.first() {
            info!("cpu: {} ({} logical cores)", cpu.brand().trim(), cpus.len());
        }

        // RAM
        let gib = |bytes: u64| bytes as f32 / 1024.0 / 1024.0 / 1024.0;
        info!("memory: {:.2} GiB used / {:.2} GiB total", gib(sys.used_memory()), gib(sys.total_memory()));
    }

    pub fn log_gpu(adapter: &wgpu::AdapterInfo) {
        info!(
            "gpu: {} ({:?} backend, driver {}, vendor {:#06x})",
            adapter.name, adapter.backend, adapter.driver, adapter.vendor
        );
    }
}
