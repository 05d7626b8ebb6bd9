// trxbridge -- bridge a PTY command channel to a serial-controlled transceiver.
//
// Usage:
//   trxbridge
//   trxbridge --serial-port /dev/ttyUSB1 --pty /tmp/remotetrx-trx2
//   trxbridge --rx-freq 433500000 --tx-freq 438100000 --tx-power 2
//   RUST_LOG=trxbridge_driver=debug trxbridge
//
// The PTY path is usually one end of a socat pair, e.g.
//   socat -d -d PTY,raw,echo=0,link=/tmp/remotetrx-trx2 PTY,raw,echo=0,link=/tmp/remotetrx-ctl
//
// Runs until SIGINT or SIGTERM; either device may come and go meanwhile.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trxbridge::{
    BridgeContext, DEFAULT_RX_FREQ_HZ, DEFAULT_TX_POWER, EventLoop, PtyBridgeBuilder,
    TransceiverBuilder,
};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Bridge a virtual serial endpoint (PTY) to a physical radio transceiver.
#[derive(Parser, Debug)]
#[command(name = "trxbridge", version, about)]
struct Cli {
    /// Serial port the transceiver is attached to.
    #[arg(long, env = "TRXBRIDGE_SERIAL_PORT", default_value = "/dev/ttyUSB0")]
    serial_port: String,

    /// Transceiver baud rate.
    #[arg(long, env = "TRXBRIDGE_BAUD", default_value_t = 9600)]
    baud: u32,

    /// PTY path the control application talks to.
    #[arg(long, env = "TRXBRIDGE_PTY", default_value = "/tmp/remotetrx-trx2")]
    pty: String,

    /// Initial receive frequency in Hz.
    #[arg(long, default_value_t = DEFAULT_RX_FREQ_HZ, value_parser = clap::value_parser!(u64).range(1..))]
    rx_freq: u64,

    /// Initial transmit frequency in Hz [default: the receive frequency].
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    tx_freq: Option<u64>,

    /// Initial transmit power level, passed to the transceiver unchanged.
    #[arg(long, default_value_t = DEFAULT_TX_POWER)]
    tx_power: u32,

    /// Log filter used when RUST_LOG is not set (e.g. info, debug,
    /// trxbridge_pty=trace).
    #[arg(long, default_value = "info")]
    log_level: String,
}

// ---------------------------------------------------------------------------
// Startup helpers
// ---------------------------------------------------------------------------

fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .with_context(|| format!("invalid log filter {default_filter:?}"))?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Cancel `token` on the first SIGINT or SIGTERM.
fn spawn_signal_handler(token: CancellationToken) -> Result<()> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("SIGINT received, shutting down"),
            _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
        }
        token.cancel();
    });
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    info!(
        serial = %cli.serial_port,
        baud = cli.baud,
        pty = %cli.pty,
        "trxbridge {} starting",
        env!("CARGO_PKG_VERSION")
    );

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone())?;

    let mut trx = TransceiverBuilder::new()
        .serial_port(&cli.serial_port)
        .baud_rate(cli.baud)
        .rx_freq(cli.rx_freq)
        .tx_power(cli.tx_power);
    if let Some(tx_freq) = cli.tx_freq {
        trx = trx.tx_freq(tx_freq);
    }
    let driver = trx
        .build()
        .await
        .context("invalid transceiver configuration")?;

    let bridge = PtyBridgeBuilder::new()
        .pty_path(&cli.pty)
        .build()
        .await
        .context("invalid PTY configuration")?;

    let mut ctx = BridgeContext::new(driver, bridge);
    EventLoop::new(cancel).run(&mut ctx).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["trxbridge"]).unwrap();
        assert_eq!(cli.baud, 9600);
        assert_eq!(cli.rx_freq, 145_500_000);
        assert_eq!(cli.tx_freq, None);
        assert_eq!(cli.tx_power, 0);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn zero_frequency_rejected() {
        assert!(Cli::try_parse_from(["trxbridge", "--rx-freq", "0"]).is_err());
        assert!(Cli::try_parse_from(["trxbridge", "--tx-freq", "0"]).is_err());
    }

    #[test]
    fn explicit_radio_settings() {
        let cli = Cli::try_parse_from([
            "trxbridge",
            "--rx-freq",
            "433500000",
            "--tx-freq",
            "438100000",
            "--tx-power",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.rx_freq, 433_500_000);
        assert_eq!(cli.tx_freq, Some(438_100_000));
        assert_eq!(cli.tx_power, 3);
    }
}
