mod bootstrap;

use anyhow::{bail, Result};
use counts_core::settings::Settings;
use counts_runtime::audit::audit;
use counts_runtime::driver::Driver;

fn main() -> Result<()> {
    let settings = Settings::load()?;

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("wifi-counts v{} starting", env!("CARGO_PKG_VERSION"));

    if settings.audit {
        run_audit(&settings)
    } else {
        run_transform(&settings)
    }
}

fn run_transform(settings: &Settings) -> Result<()> {
    let driver = Driver::from_settings(settings)?;
    tracing::info!(
        "Format: {}, markers: {}, z threshold: {}",
        settings.format,
        settings.resolved_markers().join(" "),
        settings.z_threshold
    );

    let summary = driver.run()?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    summary.ensure_success()?;
    Ok(())
}

fn run_audit(settings: &Settings) -> Result<()> {
    let (Some(raw_dir), Some(transformed_dir)) = (&settings.input_dir, &settings.output_dir) else {
        bail!("audit needs both --input-dir and --output-dir");
    };

    let report = audit(raw_dir, transformed_dir, settings.extension.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
