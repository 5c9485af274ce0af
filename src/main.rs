use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use boat_pilot::compass::Point;
use boat_pilot::nmea_source::NmeaPositionSource;
use boat_pilot::waypoint::load_waypoints;
use boat_pilot::{GeoPoint, NavSessionConfig, Navigator, PositionFix, PositionSource, ToneEmulator};
use log::info;
use structopt::StructOpt;

/// Steer toward a stored waypoint, printing one status line per tick
#[derive(Debug, StructOpt)]
struct Opt {
    /// Settings JSON (app settings object or full session config)
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Waypoint list JSON, `[{"id":1,"name":"..","lat":..,"lng":..}]`
    #[structopt(long, parse(from_os_str))]
    waypoints: Option<PathBuf>,

    /// Id of the waypoint to steer toward
    #[structopt(long)]
    target: Option<u8>,

    /// NMEA source: serial device such as /dev/serial0, or a recorded log
    #[structopt(long, parse(from_os_str))]
    nmea: Option<PathBuf>,

    /// Delay between replayed NMEA fixes
    #[structopt(long)]
    replay_ms: Option<u64>,

    /// Initial latitude
    #[structopt(long, default_value = "41.282", allow_hyphen_values = true)]
    lat: f64,

    /// Initial longitude
    #[structopt(long, default_value = "9.408", allow_hyphen_values = true)]
    lng: f64,

    /// Initial heading, degrees true
    #[structopt(long)]
    heading: Option<f64>,

    /// Stop after this many ticks
    #[structopt(long, default_value = "600")]
    ticks: usize,

    /// Override the configured tick period
    #[structopt(long)]
    tick_ms: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opt = Opt::from_args();

    let mut config = match &opt.config {
        Some(path) => NavSessionConfig::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => NavSessionConfig::default(),
    };
    if let Some(tick_ms) = opt.tick_ms {
        config.tick_period_ms = tick_ms;
    }
    config.validate()?;

    let waypoints = match &opt.waypoints {
        Some(path) => load_waypoints(path)
            .with_context(|| format!("loading waypoints from {}", path.display()))?,
        None => Vec::new(),
    };
    let target = match opt.target {
        Some(id) => match waypoints.iter().find(|w| w.id == id) {
            Some(waypoint) => Some(waypoint.clone()),
            None => bail!("no waypoint with id {} ({} loaded)", id, waypoints.len()),
        },
        None => None,
    };

    let source: Option<Box<dyn PositionSource>> = match &opt.nmea {
        Some(path) => {
            let mut feed = NmeaPositionSource::open(path)
                .with_context(|| format!("opening NMEA feed {}", path.display()))?;
            if let Some(replay_ms) = opt.replay_ms {
                feed = feed.with_replay_interval(Duration::from_millis(replay_ms));
            }
            Some(Box::new(feed))
        }
        None => None,
    };

    let mut initial = PositionFix::new(GeoPoint::new(opt.lat, opt.lng));
    if let Some(heading) = opt.heading {
        initial = initial.with_heading(heading);
    }

    let period = config.tick_period();
    let (status_tx, status_rx) = mpsc::channel();
    let mut navigator = Navigator::new(ToneEmulator::new(config.ch1.center_ms));
    navigator.on_status(move |status| {
        println!("{}", status);
        let _ = status_tx.send(status.arrived);
    });
    navigator.start(initial, source, config)?;
    if let Some(waypoint) = target {
        info!(
            "Heading for {}, {} of the start",
            waypoint,
            Point::from_heading(GeoPoint::new(opt.lat, opt.lng).bearing_to(&waypoint.position)).name()
        );
        navigator.set_target(Some(waypoint))?;
    }

    let mut ticks = 0;
    while ticks < opt.ticks {
        match status_rx.recv_timeout(period * 5) {
            Ok(arrived) => {
                ticks += 1;
                if arrived {
                    info!("Target reached after {} ticks", ticks);
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) if navigator.is_active() => continue,
            Err(mpsc::RecvTimeoutError::Timeout) => break,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    let boat = navigator.boat();
    navigator.stop();
    info!(
        "Final position {} after {} ticks, {} track points",
        boat.position,
        ticks,
        boat.track.len()
    );
    Ok(())
}
