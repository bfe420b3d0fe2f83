use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use s3_retention::{
    app::{AppBuilder, AppConfig},
    config::EnvConfig,
    ports::services::{CleanupReport, RetentionService, SmartCleanupRequest},
    RetentionTarget, TimestampSource,
};
use serde::Serialize;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "s3-retention")]
#[command(about = "Tiered retention and cleanup for S3-compatible buckets", long_about = None)]
struct Cli {
    /// Log level, overridden by RUST_LOG when set
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Keys per bulk delete call (at most 1000)
    #[arg(long, env = "DELETE_BATCH_SIZE", global = true)]
    delete_batch_size: Option<usize>,

    /// Folders gathered before a partial delete batch is flushed
    #[arg(long, env = "PREFIX_BATCH_SIZE", global = true)]
    prefix_batch_size: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the buckets on the allow-list
    Buckets,

    /// List one page of folders and objects
    Ls {
        bucket: String,
        #[arg(short, long)]
        prefix: Option<String>,
        /// Continuation token from a previous page
        #[arg(short, long)]
        token: Option<String>,
    },

    /// Show what tiered retention would keep and delete
    Preview {
        bucket: String,
        #[command(flatten)]
        retention: RetentionArgs,
    },

    /// Apply tiered retention
    Cleanup {
        bucket: String,
        #[command(flatten)]
        retention: RetentionArgs,
        /// Compute the decision without deleting
        #[arg(long)]
        dry_run: bool,
    },

    /// Objects older than a number of days, without deleting
    Candidates {
        bucket: String,
        #[arg(short, long)]
        prefix: Option<String>,
        #[arg(short, long, default_value_t = 30)]
        days: u32,
    },

    /// Delete every object older than a number of days
    Expire {
        bucket: String,
        #[arg(short, long, default_value_t = 30)]
        days: u32,
    },

    /// Delete every object in a bucket
    Purge {
        bucket: String,
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Delete the given keys
    Rm {
        bucket: String,
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Print a presigned download URL
    Presign {
        bucket: String,
        key: String,
        /// Validity in seconds
        #[arg(short, long, default_value_t = 300)]
        expires: u64,
    },
}

#[derive(clap::Args, Debug)]
struct RetentionArgs {
    #[arg(short, long)]
    prefix: Option<String>,

    /// What to apply retention to
    #[arg(long, value_enum, default_value_t = Target::Auto)]
    target: Target,

    /// Timestamp of objects when targeting objects
    #[arg(long, value_enum, default_value_t = Source::LastModified)]
    timestamp_source: Source,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Target {
    Auto,
    Objects,
    Folders,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Source {
    LastModified,
    KeyName,
    KeyNameOrLastModified,
}

impl RetentionArgs {
    fn request(&self, bucket: &str, dry_run: bool) -> SmartCleanupRequest {
        let timestamp_source = match self.timestamp_source {
            Source::LastModified => TimestampSource::LastModified,
            Source::KeyName => TimestampSource::KeyName,
            Source::KeyNameOrLastModified => TimestampSource::KeyNameOrLastModified,
        };
        let target = match self.target {
            Target::Auto => RetentionTarget::Auto,
            Target::Objects => RetentionTarget::Objects { timestamp_source },
            Target::Folders => RetentionTarget::Folders,
        };

        SmartCleanupRequest::builder()
            .bucket(bucket)
            .maybe_prefix(self.prefix.clone())
            .target(target)
            .dry_run(dry_run)
            .build()
    }
}

impl Cli {
    fn to_app_config(&self) -> Result<AppConfig> {
        let env = EnvConfig::from_env().context("Invalid environment configuration")?;
        let mut config = AppConfig::from(env);

        if let Some(size) = self.delete_batch_size {
            anyhow::ensure!(
                (1..=1000).contains(&size),
                "--delete-batch-size must be between 1 and 1000"
            );
            config.delete_batch_size = size;
        }
        if let Some(size) = self.prefix_batch_size {
            anyhow::ensure!(size > 0, "--prefix-batch-size must be positive");
            config.prefix_batch_size = size;
        }
        Ok(config)
    }

    fn init_logging(&self) -> Result<()> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.log_level.to_lowercase()))
            .context("Invalid log level")?;

        // Logs go to stderr so stdout stays machine-readable.
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("Failed to install tracing subscriber")?;

        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

fn finish_deletion(report: &CleanupReport) -> Result<()> {
    print_json(report)?;
    anyhow::ensure!(
        report.errors.is_empty(),
        "{} key(s) could not be deleted",
        report.errors.len()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging()?;

    let config = cli.to_app_config()?;
    info!(
        candidates = config.clients.len(),
        buckets = config.allow_list.iter().count(),
        "Loaded configuration"
    );
    let service = AppBuilder::new()
        .with_config(config)
        .build()
        .context("Failed to build application")?;

    match cli.command {
        Commands::Buckets => {
            print_json(&serde_json::json!({ "buckets": service.allowed_buckets() }))?;
        }
        Commands::Ls {
            bucket,
            prefix,
            token,
        } => {
            let page = service
                .list_page(&bucket, prefix.as_deref(), token.as_deref())
                .await?;
            print_json(&page)?;
        }
        Commands::Preview { bucket, retention } => {
            let summary = service
                .smart_cleanup(retention.request(&bucket, true))
                .await?;
            print_json(&summary)?;
        }
        Commands::Cleanup {
            bucket,
            retention,
            dry_run,
        } => {
            let summary = service
                .smart_cleanup(retention.request(&bucket, dry_run))
                .await?;
            print_json(&summary)?;
            anyhow::ensure!(
                summary.errors.is_empty(),
                "{} key(s) could not be deleted",
                summary.errors.len()
            );
        }
        Commands::Candidates {
            bucket,
            prefix,
            days,
        } => {
            let report = service
                .cleanup_candidates(&bucket, prefix.as_deref(), days)
                .await?;
            print_json(&report)?;
        }
        Commands::Expire { bucket, days } => {
            finish_deletion(&service.cleanup_older_than(&bucket, days).await?)?;
        }
        Commands::Purge { bucket, yes } => {
            anyhow::ensure!(yes, "Refusing to delete every object in '{}' without --yes", bucket);
            finish_deletion(&service.delete_all(&bucket).await?)?;
        }
        Commands::Rm { bucket, keys } => {
            finish_deletion(&service.delete_keys(&bucket, keys).await?)?;
        }
        Commands::Presign {
            bucket,
            key,
            expires,
        } => {
            let url = service
                .presign_download(&bucket, &key, Some(Duration::from_secs(expires)))
                .await?;
            println!("{}", url);
        }
    }

    Ok(())
}
