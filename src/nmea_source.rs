//! NMEA 0183 position feed.
//!
//! Reads sentences line by line from a GPS receiver (e.g. `/dev/serial0`) or
//! a recorded log and turns RMC/GGA sentences into [`PositionFix`]es.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use nmea::{Nmea, SentenceType};

use crate::error::FeedError;
use crate::geo::GeoPoint;
use crate::position_feed::{FixSink, PositionFix, PositionSource, SubscriptionId};

/// Iterator over the fixes contained in an NMEA stream.
///
/// Unparseable or unsupported sentences are skipped. The iterator ends at
/// end of input or on the first read error.
pub struct NmeaFixes<R> {
    lines: Lines<R>,
    parser: Nmea,
}

impl<R: BufRead> NmeaFixes<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            parser: Nmea::default(),
        }
    }

    fn fix_for(&self, sentence: SentenceType, raw: &str) -> Option<PositionFix> {
        // RMC carries course and speed; GGA only position
        let with_motion = match sentence {
            SentenceType::RMC => true,
            SentenceType::GGA => false,
            _ => return None,
        };
        if !reports_fix(sentence, raw) {
            debug!("No fix in {:?}, keeping last position", raw);
            return None;
        }
        let (Some(lat), Some(lng)) = (self.parser.latitude, self.parser.longitude) else {
            return None;
        };

        let mut fix = PositionFix::new(GeoPoint::new(lat, lng));
        if with_motion {
            if let Some(course) = self.parser.true_course {
                fix = fix.with_heading(course.into());
            }
            if let Some(speed) = self.parser.speed_over_ground {
                fix = fix.with_speed(speed.into());
            }
        }
        Some(fix)
    }
}

/// Whether the receiver had a fix when it sent `raw`.
///
/// The parser merges coordinates from void RMC (status `V`) and quality-0
/// GGA sentences too, so the status field is read from the sentence itself.
fn reports_fix(sentence: SentenceType, raw: &str) -> bool {
    let mut fields = raw.split('*').next().unwrap_or(raw).split(',');
    match sentence {
        SentenceType::RMC => fields.nth(2) == Some("A"),
        SentenceType::GGA => fields
            .nth(6)
            .is_some_and(|quality| !quality.is_empty() && quality != "0"),
        _ => false,
    }
}

impl<R: BufRead> Iterator for NmeaFixes<R> {
    type Item = PositionFix;

    fn next(&mut self) -> Option<PositionFix> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    warn!("Error reading NMEA stream: {}", e);
                    return None;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match self.parser.parse(trimmed) {
                Ok(sentence) => {
                    if let Some(fix) = self.fix_for(sentence, trimmed) {
                        return Some(fix);
                    }
                }
                Err(e) => debug!("Skipping sentence {:?}: {:?}", trimmed, e),
            }
        }
    }
}

/// [`PositionSource`] backed by an NMEA stream, pumped on its own thread.
///
/// The stream is consumed by the first subscription. With a replay interval
/// the pump sleeps between fixes, which paces a recorded log like a live
/// receiver.
pub struct NmeaPositionSource<R> {
    reader: Option<R>,
    replay_interval: Option<Duration>,
    next_id: u64,
    running: Option<(SubscriptionId, Arc<AtomicBool>)>,
}

impl NmeaPositionSource<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        info!("Opened NMEA feed {}", path.display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead + Send + 'static> NmeaPositionSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            replay_interval: None,
            next_id: 0,
            running: None,
        }
    }

    pub fn with_replay_interval(mut self, interval: Duration) -> Self {
        self.replay_interval = Some(interval);
        self
    }
}

impl<R: BufRead + Send + 'static> PositionSource for NmeaPositionSource<R> {
    fn subscribe(&mut self, sink: FixSink) -> Result<SubscriptionId, FeedError> {
        let reader = self.reader.take().ok_or(FeedError::Consumed)?;
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let interval = self.replay_interval;

        thread::spawn(move || {
            let mut delivered = 0usize;
            for fix in NmeaFixes::new(reader) {
                if !flag.load(Ordering::Relaxed) || !sink.is_open() {
                    break;
                }
                if sink.push(fix) {
                    delivered += 1;
                }
                if let Some(interval) = interval {
                    thread::sleep(interval);
                }
            }
            debug!("NMEA feed finished after {} fixes", delivered);
        });

        self.running = Some((id, running));
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        if let Some((running_id, flag)) = &self.running
            && *running_id == id
        {
            flag.store(false, Ordering::Relaxed);
        }
    }
}

impl<R> Drop for NmeaPositionSource<R> {
    fn drop(&mut self) {
        if let Some((_, flag)) = &self.running {
            flag.store(false, Ordering::Relaxed);
        }
    }
}
