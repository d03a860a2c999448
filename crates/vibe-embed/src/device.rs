use candle_core::Device;

/// Accelerator for model inference. `APP_DEVICE=cpu` pins the CPU even when
/// an accelerator feature is compiled in.
pub fn select_device() -> Device {
    let force_cpu = std::env::var("APP_DEVICE").is_ok_and(|d| d.eq_ignore_ascii_case("cpu"));
    if !force_cpu {
        #[cfg(feature = "cuda")]
        match Device::new_cuda(0) {
            Ok(dev) => { tracing::info!(device = "cuda:0", "embedding device selected"); return dev; }
            Err(e) => tracing::warn!(error = %e, "CUDA unavailable, falling back"),
        }
        #[cfg(feature = "metal")]
        match Device::new_metal(0) {
            Ok(dev) => { tracing::info!(device = "metal:0", "embedding device selected"); return dev; }
            Err(e) => tracing::warn!(error = %e, "Metal unavailable, falling back"),
        }
    }
    tracing::info!(device = "cpu", "embedding device selected");
    Device::Cpu
}
