//! Poll a receiver and print every snapshot.
//!
//! Usage: `cargo run --example poll -- config.json [seconds]`
//!
//! The config file holds the same options as the platform configuration, e.g.
//! `{"type": "Telnet", "host": "192.168.1.50", "port": 23}`.

use nad_control::{Receiver, ReceiverConfig};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or("usage: poll <config.json> [seconds]")?;
    let seconds: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(10);

    let config = ReceiverConfig::from_json(&std::fs::read_to_string(path)?)?;
    let receiver = Arc::new(Receiver::from_config(&config)?);
    println!(
        "{} ({:?}), sources: {:?}",
        receiver.name(),
        receiver.transport_kind(),
        receiver.source_list()
    );

    let mut updates = receiver.subscribe();
    let poller = receiver.spawn_poller(Duration::from_secs(seconds));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            update = updates.recv() => {
                let Some(snapshot) = update else { break };
                println!(
                    "main: {:?} muted={:?} volume={:?} source={:?} | zone2: {:?} | zone3: {:?}",
                    snapshot.main.power,
                    snapshot.main.muted,
                    snapshot.main.volume,
                    snapshot.main.source,
                    snapshot.zone2.power,
                    snapshot.zone3.power,
                );
                if !snapshot.available() {
                    println!("receiver unavailable");
                }
            }
        }
    }

    poller.stop().await;
    Ok(())
}
