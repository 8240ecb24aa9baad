//! Wash a 96-well plate with the front-panel defaults

use el406::{El406, PlateFormat, ShakeParams, WashParams};

#[tokio::main]
async fn main() -> el406::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Change to your serial port
    let port = std::env::var("EL406_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());

    let mut device = El406::new(port);
    device.setup().await?;
    println!("Connected to {}", device.descriptor());

    let plate = PlateFormat::Well96;

    // Wash, then shake, inside a single batch so the carrier is
    // prepared only once
    device
        .batch(plate, async |dev| {
            dev.manifold_wash(plate, &WashParams::default()).await?;

            let shake = ShakeParams {
                duration_secs: 30,
                ..ShakeParams::default()
            };
            dev.shake(plate, &shake).await
        })
        .await?;

    println!("Wash complete");

    device.stop().await?;
    Ok(())
}
