use std::{path::Path, process, sync::Arc};

use favicons::{
    application::{
        documents,
        error::AppError,
        locator::PropertyLocator,
        pipeline::{IconPipeline, PipelineConfig},
        publish::{FaviconPublisher, PublishOutcome},
        repos::{BlobStore, ContentStore, SiteConfig},
        resolver::SettingsResolver,
    },
    cache::{CacheConfig, ObjectCache, SettingsCache, SettingsProvider},
    config,
    domain::settings::FaviconSettings,
    infra::{
        blobs::FsBlobStore, codec::ImageCrateCodec, error::InfraError, memory::MemoryContentStore,
        site_file, telemetry,
    },
    sync::{ChangeNotifier, EventBus, FaviconSync, InProcessEventBus},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, chain = ?error.chain(), "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, chain = ?error.chain(), "application error");
    });
}

struct ApplicationContext {
    site: Arc<dyn SiteConfig>,
    cache: SettingsCache,
    pipeline: IconPipeline,
    publisher: FaviconPublisher,
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;
    let app = build_application_context(&settings).await?;

    match cli_args.command {
        config::Command::Publish => run_publish(&app).await,
        config::Command::Clean => {
            app.pipeline.clean_up().await?;
            info!(target = "favicons::cli", "Removed generated icons");
            Ok(())
        }
        config::Command::Delete => {
            app.pipeline.delete().await?;
            info!(target = "favicons::cli", "Removed favicons folder");
            Ok(())
        }
        config::Command::Settings => {
            let settings = app.cache.get().await?;
            let json = serde_json::to_string_pretty(settings.as_ref())
                .map_err(|err| AppError::unexpected(err.to_string()))?;
            emit(&json, None).await
        }
        config::Command::Browserconfig(args) => {
            let settings = app.cache.get().await?;
            emit(&documents::browserconfig_xml(&settings), args.out.as_deref()).await
        }
        config::Command::Manifest(args) => {
            let settings = app.cache.get().await?;
            let json = documents::manifest_json(&settings)
                .map_err(|err| AppError::unexpected(err.to_string()))?;
            emit(&json, args.out.as_deref()).await
        }
    }
}

async fn build_application_context(
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let content = Arc::new(MemoryContentStore::new());
    let fs_blobs = FsBlobStore::new(settings.storage.output_root.clone()).map_err(InfraError::from)?;
    let blobs: Arc<dyn BlobStore> = Arc::new(fs_blobs);

    let loaded =
        site_file::load_site(&settings.site.content_file, &content, blobs.as_ref()).await?;
    let site: Arc<dyn SiteConfig> = Arc::new(loaded.site);
    let content: Arc<dyn ContentStore> = content;

    let locator = Arc::new(PropertyLocator::new(&loaded.content_types));
    let resolver = SettingsResolver::new(content.clone(), locator, site.clone());
    let cache_config = CacheConfig::from(&settings.cache);
    let provider: Arc<SettingsProvider> =
        Arc::new(ObjectCache::<Arc<FaviconSettings>>::new(&cache_config));
    let cache = SettingsCache::new(provider, resolver, site.clone(), cache_config);

    let pipeline = IconPipeline::new(
        content.clone(),
        blobs,
        Arc::new(ImageCrateCodec::new(settings.pipeline.resize_filter)),
        site.clone(),
        PipelineConfig {
            concurrency: settings.pipeline.concurrency.get(),
        },
    );

    let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::new());
    let notifier = Arc::new(ChangeNotifier::new(bus));
    notifier.on_announce(Arc::new(FaviconSync::new(
        content.clone(),
        site.clone(),
        cache.clone(),
        pipeline.clone(),
    )));

    let publisher = FaviconPublisher::new(
        content,
        site.clone(),
        cache.clone(),
        pipeline.clone(),
        settings.pipeline.timeout,
    )
    .with_notifier(notifier);

    Ok(ApplicationContext {
        site,
        cache,
        pipeline,
        publisher,
    })
}

async fn run_publish(app: &ApplicationContext) -> Result<(), AppError> {
    let outcome = app.publisher.handle_published(app.site.start_page()).await?;
    match &outcome {
        PublishOutcome::Generated { icons, splash } => info!(
            target = "favicons::cli",
            icons = icons.written.len(),
            icon_failures = icons.failed.len(),
            splash = splash.as_ref().map_or(0, |report| report.written.len()),
            path = app.site.favicons_path(),
            "Favicons generated"
        ),
        PublishOutcome::SourceUnavailable => {
            return Err(AppError::validation(
                "website icon could not be read; previous icons were removed",
            ));
        }
        PublishOutcome::TimedOut => {
            return Err(AppError::unexpected("favicon generation timed out"));
        }
        other => info!(
            target = "favicons::cli",
            outcome = other.as_str(),
            "Publish handled"
        ),
    }
    Ok(())
}

async fn emit(document: &str, out: Option<&Path>) -> Result<(), AppError> {
    match out {
        Some(path) => {
            tokio::fs::write(path, document)
                .await
                .map_err(InfraError::from)?;
            info!(target = "favicons::cli", path = %path.display(), "Wrote document");
        }
        None => println!("{document}"),
    }
    Ok(())
}
