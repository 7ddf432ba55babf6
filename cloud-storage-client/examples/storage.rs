/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time;

use aws_sdk_s3::error::DisplayErrorContext;
use aws_types::region::Region;
use clap::Parser;
use cloud_storage_client::backend::S3Backend;
use cloud_storage_client::config::loader::{DEFAULT_REGION, REGION_ENV_VAR};
use cloud_storage_client::io::InputStream;
use cloud_storage_client::types::{ConcurrencyMode, PartSize};

type BoxError = Box<dyn Error + Send + Sync>;

const ONE_MEGABYTE: u64 = 1000 * 1000;

#[derive(Debug, Clone, clap::Parser)]
#[command(name = "storage")]
#[command(about = "Manage objects in a bucket. The bucket is read from AWS_BUCKET_NAME unless --bucket is given.")]
pub struct Args {
    /// Bucket to operate on
    #[arg(long, global = true)]
    bucket: Option<String>,

    /// Region of the bucket (defaults to AWS_REGION, then us-east-1)
    #[arg(long, global = true)]
    region: Option<String>,

    /// Number of concurrent part uploads to perform.
    #[arg(long, global = true, default_value_t = 8)]
    concurrency: usize,

    /// Part size to use
    #[arg(long, global = true, default_value_t = 8388608)]
    part_size: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::Subcommand)]
enum Command {
    /// List object keys under a prefix
    Ls {
        #[arg(default_value = "")]
        prefix: String,
    },
    /// Upload a local file
    Put { source: PathBuf, key: String },
    /// Download an object to a local file
    Get { key: String, dest: PathBuf },
    /// Delete an object
    Rm { key: String },
    /// Create the bucket
    Mb,
    /// Delete the (empty) bucket
    Rb,
}

fn region(args: &Args) -> String {
    args.region
        .clone()
        .or_else(|| std::env::var(REGION_ENV_VAR).ok())
        .unwrap_or_else(|| DEFAULT_REGION.to_owned())
}

async fn client(args: &Args) -> Result<cloud_storage_client::Client, BoxError> {
    let mut loader = cloud_storage_client::from_env()
        .region(region(args))
        .concurrency(ConcurrencyMode::Explicit(args.concurrency))
        .part_size(PartSize::Target(args.part_size));
    if let Some(bucket) = &args.bucket {
        loader = loader.bucket(bucket);
    }
    let config = loader.load().await?;
    Ok(cloud_storage_client::Client::new(config))
}

async fn bucket_backend(args: &Args) -> Result<S3Backend, BoxError> {
    let bucket = match &args.bucket {
        Some(bucket) => bucket.clone(),
        None => std::env::var(cloud_storage_client::config::loader::BUCKET_NAME_ENV_VAR)?,
    };
    let config = aws_config::from_env()
        .region(Region::new(region(args)))
        .load()
        .await;
    Ok(S3Backend::new(aws_sdk_s3::Client::new(&config), bucket))
}

async fn do_upload(args: &Args, source: &Path, key: &str) -> Result<(), BoxError> {
    let tm = client(args).await?;
    let stream = InputStream::from_path(source)?;
    let obj_size_bytes = stream.size_hint().lower();

    println!("starting upload");
    let start = time::Instant::now();
    let output = tm.upload().key(key).body(stream).initiate()?.join().await?;
    let elapsed = start.elapsed();

    let obj_size_megabytes = obj_size_bytes as f64 / ONE_MEGABYTE as f64;
    let obj_size_megabits = obj_size_megabytes * 8f64;
    println!(
        "uploaded {obj_size_bytes} bytes ({obj_size_megabytes} MB) in {} parts in {elapsed:?}; Mb/s: {}",
        output.parts().len().max(1),
        obj_size_megabits / elapsed.as_secs_f64()
    );
    Ok(())
}

async fn run(args: Args) -> Result<(), BoxError> {
    match &args.command {
        Command::Ls { prefix } => {
            let tm = client(&args).await?;
            for object in tm.list_objects(prefix).await? {
                println!("{:>12}  {}", object.size(), object.key());
            }
        }
        Command::Put { source, key } => do_upload(&args, source, key).await?,
        Command::Get { key, dest } => {
            let tm = client(&args).await?;
            let start = time::Instant::now();
            tm.download_to_path(key, dest).await?;
            println!("downloaded {key} to {} in {:?}", dest.display(), start.elapsed());
        }
        Command::Rm { key } => {
            let tm = client(&args).await?;
            tm.delete_object(key).await?;
            println!("deleted {key}");
        }
        Command::Mb => {
            let backend = bucket_backend(&args).await?;
            backend.create_bucket(&region(&args)).await?;
            println!("created bucket {}", backend.bucket());
        }
        Command::Rb => {
            let backend = bucket_backend(&args).await?;
            backend.delete_bucket().await?;
            println!("deleted bucket {}", backend.bucket());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_ids(true)
        .init();

    let result = run(args).await;
    if let Err(ref err) = result {
        tracing::error!("command failed: {}", DisplayErrorContext(err.as_ref()));
    }
    result
}
