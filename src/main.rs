use anyhow::Context;
use clap::Parser;
use std::sync::Arc;

use yolo_onnx_predict::adapters::{
    http::{router, state::HttpState, STATIC_PREFIX},
    imaging::annotator::BoxAnnotator,
    onnx::{classes::load_class_names, detector_pool::DetectorPool, model_catalog::OnnxModelCatalog},
    storage::static_store::StaticDirStore,
};
use yolo_onnx_predict::application::{ports::ModelCatalogPort, services::PredictionService};
use yolo_onnx_predict::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logs (RUST_LOG=info by default)
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let settings = Settings::parse();
    tracing::debug!(?settings, "settings loaded");

    // 2. Resolve the model artifact, fetching it if needed
    let catalog = OnnxModelCatalog::new().context("creating model catalog")?;
    let inference = settings.inference_config();
    let model_path = catalog
        .ensure_available(&inference.model)
        .await
        .context("resolving YOLO model")?;

    let classes: Arc<[String]> = load_class_names(settings.classes_path.as_deref())
        .context("reading class names")?
        .into();
    tracing::info!("🔧 {} classes", classes.len());

    // 3. Adapters. Session building is blocking work.
    let pool = {
        let inference = inference.clone();
        let (pool_size, intra_threads) = (settings.pool_size, settings.intra_threads);
        let classes = classes.clone();
        tokio::task::spawn_blocking(move || {
            DetectorPool::load(&inference, &model_path, classes, pool_size, intra_threads)
        })
        .await
        .context("model loading task")??
    };
    tracing::info!("🧠 Detector pool ready with {} session(s)", pool.size());
    let annotator = BoxAnnotator::new().context("loading label font")?;
    let store = StaticDirStore::new(&settings.static_dir, STATIC_PREFIX);
    tracing::info!("📂 Results written to '{}' and served under {}", store.dir().display(), STATIC_PREFIX);

    // 4. Use case + HTTP state
    let prediction = PredictionService::new(Arc::new(pool), Arc::new(annotator), Arc::new(store))
        .with_jpeg_quality(settings.jpeg_quality);
    let state = HttpState { prediction: Arc::new(prediction) };
    let app = router(state, &settings.router_config());

    // 5. Serve
    let addr = settings.addr();
    tracing::info!("🚀 YOLO predict server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
