//! Batch consumption command
//!
//! Publishes newline-delimited command envelopes to an in-process queue and
//! runs the worker pool until every message is settled.

use clap::Args;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use storekeep_engine::{Consumer, Dispatcher, MemoryQueue, MessageQueue, ServiceConfig, StoreService};
use storekeep_store::SqliteBackend;

#[derive(Debug, Args)]
pub struct ConsumeArgs {
    /// File of JSON envelopes, one per line (stdin when omitted)
    #[arg(long)]
    pub input: Option<PathBuf>,
}

pub fn execute(args: ConsumeArgs, config: &ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };

    let backend = SqliteBackend::open(&config.database, config.retry)?;
    let dispatcher = Arc::new(Dispatcher::new(StoreService::new(backend)));
    let queue = Arc::new(MemoryQueue::new(config.consumer.queue_capacity));
    let consumer = Consumer::new(dispatcher, Arc::clone(&queue), &config.consumer);
    let worker = std::thread::spawn(move || consumer.run());

    let published = publish_lines(reader, queue.as_ref());
    queue.close();

    let stats = worker
        .join()
        .map_err(|_| "consumer thread panicked")??;
    let published = published?;

    tracing::info!(published, "Input consumed");
    println!(
        "published={} acked={} requeued={} rejected={} ignored={}",
        published, stats.acked, stats.requeued, stats.rejected, stats.ignored
    );
    Ok(())
}

fn publish_lines<R: BufRead>(reader: R, queue: &MemoryQueue) -> Result<u64, Box<dyn std::error::Error>> {
    let mut published = 0;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        queue.publish(line.into_bytes())?;
        published += 1;
    }
    Ok(published)
}
