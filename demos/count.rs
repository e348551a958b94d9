//! Counts the nodes, ways and relations of one or more `.osm.pbf` files.
//!
//! `cargo run --release --example count -- a.osm.pbf b.osm.pbf`

use std::time::Instant;

use log::{error, info};
use osmpbf_stream::{decode_files, Batch, DecoderConfig, Kind, Result};

fn main() {
    env_logger::init();

    let paths = std::env::args().skip(1).collect::<Vec<_>>();
    if paths.is_empty() {
        error!("Usage: count <file.osm.pbf>...");
        std::process::exit(2);
    }

    let config = DecoderConfig::from_env();
    let now = Instant::now();
    let (mut nodes, mut ways, mut relations) = (0usize, 0usize, 0usize);

    let mut sink = |batch: Batch| -> Result<()> {
        for element in &batch.elements {
            match element.kind() {
                Kind::Node => nodes += 1,
                Kind::Way => ways += 1,
                Kind::Relation => relations += 1,
            }
        }
        Ok(())
    };

    match decode_files(&paths, &config, &mut sink) {
        Ok(summary) => {
            for file in &summary.files {
                info!(
                    "{}: {} blobs, {} bytes, {} skipped nodes",
                    file.path.display(),
                    file.summary.blobs,
                    file.summary.bytes,
                    file.summary.stats.skipped_nodes
                );
            }

            println!("nodes={nodes} ways={ways} relations={relations}");
            println!("Time taken: {}ms", now.elapsed().as_millis());
        }
        Err(err) => {
            error!("Decoding failed: {err}");
            std::process::exit(1);
        }
    }
}
