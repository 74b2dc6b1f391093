use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use modstack_module::{BoxError, StackModule};
use modstack_runtime::{RuntimeFlags, StackBuilder, StackHost};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

struct CacheModule;

#[async_trait]
impl StackModule for CacheModule {
    fn name(&self) -> &str {
        "cache"
    }

    async fn start(&self, _cancel: CancellationToken) -> Result<(), BoxError> {
        // stand-in for warming a real cache
        tokio::time::sleep(Duration::from_millis(50)).await;
        info!("cache warmed");
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> Result<(), BoxError> {
        info!("cache flushed");
        Ok(())
    }
}

struct ApiModule;

#[async_trait]
impl StackModule for ApiModule {
    fn name(&self) -> &str {
        "api"
    }

    fn dependencies(&self) -> Vec<&str> {
        vec!["cache"]
    }

    async fn start(&self, _cancel: CancellationToken) -> Result<(), BoxError> {
        info!("api serving");
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> Result<(), BoxError> {
        info!("api drained");
        Ok(())
    }
}

struct NoopHost;

#[async_trait]
impl StackHost for NoopHost {
    async fn start(&self, _cancel: CancellationToken) -> Result<(), BoxError> {
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> Result<(), BoxError> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let stack = StackBuilder::new()
        .with_flags(RuntimeFlags {
            diagnostics: true,
            verbose: true,
        })
        .attach_module(Arc::new(CacheModule))?
        .attach_module(Arc::new(ApiModule))?
        .build(NoopHost);

    stack.start().await?;

    println!("\nStack is running. Press Ctrl+C to stop...");
    tokio::signal::ctrl_c().await?;

    stack.stop().await?;
    println!("Stack shutdown complete");

    Ok(())
}
