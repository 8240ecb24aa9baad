//! Query and print the instrument's hardware configuration

use anyhow::Result;
use el406::El406;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let port = std::env::var("EL406_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());

    let mut device = El406::new(port);
    device.setup().await?;

    let serial = device.get_serial_number().await?;
    println!("Serial number:      {}", serial);

    let settings = device.get_instrument_settings().await?;
    println!("Washer manifold:    {:?}", settings.washer_manifold);
    println!("Syringe manifold:   {:?}", settings.syringe_manifold);
    println!("Syringe box:        {:?}", settings.syringe_box);
    println!("Peristaltic pump 1: {}", settings.peristaltic_pump_1);
    println!("Peristaltic pump 2: {}", settings.peristaltic_pump_2);

    let report = device.run_self_check().await?;
    println!("Self-check:         {}", report.message);

    device.stop().await?;
    Ok(())
}
