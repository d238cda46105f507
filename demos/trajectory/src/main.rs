use std::path::PathBuf;

use argh::FromArgs;
use glam::DVec3;
use serde::Serialize;

use scangraph_dataset::{DatasetKind, DatasetView, Record, ViewMode};

#[derive(FromArgs)]
/// Print the propagated trajectory of a scan sequence.
struct Args {
    /// root folder holding the dataset directories
    #[argh(option, default = "PathBuf::from(\".\")")]
    folder: PathBuf,

    /// dataset name (RESSO, ETH, Sun3D, 7-Scenes, KITTI)
    #[argh(positional)]
    name: String,

    /// sequence directory inside the dataset
    #[argh(positional)]
    sequence: String,

    /// only report the scan at this position
    #[argh(option)]
    scan: Option<usize>,

    /// emit the trajectory as JSON instead of text
    #[argh(switch)]
    json: bool,
}

#[derive(Serialize)]
struct TrajectoryEntry {
    index: String,
    world_from_scan: [[f64; 4]; 4],
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let kind: DatasetKind = args.name.parse()?;
    let view = DatasetView::open(&args.folder, kind, &args.sequence, ViewMode::Scans)?;
    log::info!("{}/{}: {} scans", kind, args.sequence, view.len());

    let mut entries = Vec::new();
    let mut previous: Option<DVec3> = None;

    for (position, record) in view.records().enumerate() {
        if args.scan.is_some_and(|only| only != position) {
            continue;
        }
        let Record::Scan {
            index,
            cloud,
            world_from_scan,
        } = record?
        else {
            continue;
        };

        let center = world_from_scan.translation();
        if let (Some(min), Some(max), Some(centroid)) =
            (cloud.min_bound(), cloud.max_bound(), cloud.center())
        {
            let centroid =
                world_from_scan.transform_point(DVec3::new(centroid[0], centroid[1], centroid[2]));
            log::debug!(
                "scan {}: {} points, extent [{:.3} {:.3} {:.3}], centroid [{:.3} {:.3} {:.3}]",
                index,
                cloud.len(),
                max[0] - min[0],
                max[1] - min[1],
                max[2] - min[2],
                centroid.x,
                centroid.y,
                centroid.z
            );
        }

        if args.json {
            entries.push(TrajectoryEntry {
                index: index.to_string(),
                world_from_scan: world_from_scan.to_rows(),
            });
        } else {
            print!(
                "scan {}: t = [{:.4} {:.4} {:.4}]",
                index, center.x, center.y, center.z
            );
            match previous {
                Some(last) => println!("  segment {:.4}", center.distance(last)),
                None => println!(),
            }
        }
        previous = Some(center);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    }

    Ok(())
}
