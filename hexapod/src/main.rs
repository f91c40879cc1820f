use anyhow::Context;
use clap::Parser;
use follow::{FaceDetector, FollowConfig, Skill};
use hexapod::{AppState, FRAME_CAPACITY, app, init_logging, simulated_controller};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use vision::SeetaDetector;

#[derive(Parser)]
#[command(author, version, about = "Face-seeking hexapod skill")]
struct Cli {
    /// Address to bind the remote server
    #[arg(long, env = "HEXAPOD_ADDR", default_value = "127.0.0.1:3000")]
    addr: String,
    /// JSON behavior configuration
    #[arg(long, env = "HEXAPOD_CONFIG")]
    config: Option<PathBuf>,
    /// Sweep stops per rotation
    #[arg(long)]
    intervals: Option<u32>,
    /// Hold position when closer than this
    #[arg(long)]
    min_safe_distance: Option<f64>,
    /// SeetaFace model; the simulated detector is used without it
    #[arg(long, env = "HEXAPOD_MODEL")]
    model: Option<PathBuf>,
    /// Heading of the simulated face
    #[arg(long, default_value_t = 180.0)]
    face_at: f64,
    /// Starting distance to the simulated face
    #[arg(long, default_value_t = 300.0)]
    distance: f64,
    /// Begin seeking immediately
    #[arg(long)]
    seek: bool,
    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let (logs, _) = broadcast::channel(100);
    init_logging(logs.clone(), &cli.log);

    let mut config = match &cli.config {
        Some(path) => FollowConfig::load(path)?,
        None => FollowConfig::default(),
    };
    if let Some(intervals) = cli.intervals {
        config.intervals = intervals;
    }
    if cli.min_safe_distance.is_some() {
        config.min_safe_distance = cli.min_safe_distance;
    }
    config.validate()?;

    let detector: Option<Arc<dyn FaceDetector>> = match &cli.model {
        Some(path) => Some(Arc::new(
            SeetaDetector::from_path(path).context("loading face model")?,
        )),
        None => None,
    };

    let (frames, _) = broadcast::channel(FRAME_CAPACITY);
    let controller = Arc::new(simulated_controller(
        config,
        cli.face_at,
        cli.distance,
        detector,
        frames.clone(),
    ));
    controller.on_start().await.context("starting skill")?;
    if cli.seek {
        controller.on_recv_string("start").await;
    }

    let addr: SocketAddr = cli.addr.parse()?;
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let state = AppState::new(controller.clone(), frames, logs);
    axum::serve(listener, app(state).into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    controller.on_close().await;
    Ok(())
}
