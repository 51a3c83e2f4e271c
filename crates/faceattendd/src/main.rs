use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod dbus_interface;
mod session;

use config::Config;
use dbus_interface::AttendService;
use faceattend_client::RecognitionClient;
use faceattend_hw::Camera;
use session::{spawn_session, SessionConfig};

#[derive(Parser)]
#[command(name = "faceattendd", about = "FaceAttend face-attendance scanning daemon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the unattended entry kiosk surface
    Kiosk,
    /// Run the live classroom surface for one subject
    Classroom {
        /// Subject whose session is being recorded
        #[arg(short, long)]
        subject_id: i64,
    },
    /// List capture-capable camera devices
    Devices,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Devices => {
            for dev in Camera::enumerate() {
                println!("{}  {} ({})", dev.path, dev.name, dev.driver);
            }
            Ok(())
        }
        Commands::Kiosk => {
            let session_cfg = SessionConfig::kiosk(config.kiosk_interval, config.display_duration);
            run_surface(&config, config.kiosk_endpoint(), session_cfg).await
        }
        Commands::Classroom { subject_id } => {
            let session_cfg = SessionConfig::classroom(
                config.classroom_interval,
                config.display_duration,
                subject_id,
                config.feed_capacity,
            );
            run_surface(&config, config.classroom_endpoint(), session_cfg).await
        }
    }
}

async fn run_surface(config: &Config, endpoint: String, session_cfg: SessionConfig) -> Result<()> {
    tracing::info!(endpoint = %endpoint, "faceattendd starting");

    // Fail fast if the camera or client cannot be set up.
    let camera = Camera::open(&config.camera_device, config.warmup_frames)?;
    let client = RecognitionClient::new(endpoint, config.request_timeout)?;

    let handle = spawn_session(session_cfg, camera, client);

    let _connection = zbus::connection::Builder::session()?
        .name("org.faceattend.FaceAttend1")?
        .serve_at(
            "/org/faceattend/FaceAttend1",
            AttendService::new(handle.clone()),
        )?
        .build()
        .await?;

    tracing::info!("faceattendd ready");

    tokio::signal::ctrl_c().await?;

    tracing::info!("faceattendd shutting down");
    let _ = handle.stop().await;
    Ok(())
}
