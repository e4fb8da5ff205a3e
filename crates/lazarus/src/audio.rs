//! # Audio Worker
//!
//! The sound subsystem runs on its own thread and is driven by commands.
//!
//! ```text
//!   Game thread ──┐
//!   UI thread   ──┼──> [bounded command queue] ──> [audio thread] ──> active cues
//!                 │          (try_send)              (recv_timeout)
//!   SoundControl ─┘
//! ```
//!
//! Mixing and device output live behind the active-cue table; this module
//! owns the queue, the cue lifetimes and the statistics.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use lazarus_config::AudioSettings;
use lazarus_core::{StopSignal, Worker};
use parking_lot::Mutex;

/// Thread name of the audio worker.
pub const AUDIO_THREAD_NAME: &str = "lazarus-audio";

/// Sounds the game can trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Background ambience loop segment.
    Ambient,
    /// Player footstep.
    Footstep,
    /// Distant zombie groan.
    ZombieGroan,
    /// Zombie attack.
    ZombieBite,
    /// Player death.
    Scream,
}

impl SoundCue {
    /// How long the cue plays.
    #[must_use]
    pub fn duration(self) -> Duration {
        match self {
            Self::Ambient => Duration::from_millis(4000),
            Self::Footstep => Duration::from_millis(150),
            Self::ZombieGroan => Duration::from_millis(1200),
            Self::ZombieBite => Duration::from_millis(400),
            Self::Scream => Duration::from_millis(1500),
        }
    }
}

/// Commands accepted by the audio thread.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SoundCommand {
    /// Start playing a cue at `volume` (scaled by the master volume).
    Play {
        /// The cue.
        cue: SoundCue,
        /// Cue volume, 0.0 to 1.0.
        volume: f32,
    },
    /// Change the master volume.
    SetMasterVolume(f32),
    /// Silence every active cue.
    StopAll,
}

/// Audio statistics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SoundStats {
    /// Cues started.
    pub played: u64,
    /// Commands dropped because the queue was full.
    pub dropped: u64,
    /// Cues currently playing.
    pub active: usize,
    /// Current master volume.
    pub master_volume: f32,
}

/// Cloneable link to the running audio worker.
#[derive(Clone, Debug)]
pub struct SoundControl {
    sender: Sender<SoundCommand>,
    stats: Arc<Mutex<SoundStats>>,
}

impl SoundControl {
    /// Queues a command without blocking.
    ///
    /// Returns `false` if the command was dropped.
    pub fn send(&self, command: SoundCommand) -> bool {
        match self.sender.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(command)) => {
                self.stats.lock().dropped += 1;
                tracing::warn!(?command, "audio queue full, command dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Plays `cue` at full cue volume.
    pub fn play(&self, cue: SoundCue) -> bool {
        self.send(SoundCommand::Play { cue, volume: 1.0 })
    }

    /// Changes the master volume.
    pub fn set_master_volume(&self, volume: f32) -> bool {
        self.send(SoundCommand::SetMasterVolume(volume))
    }

    /// Silences every active cue.
    pub fn stop_all(&self) -> bool {
        self.send(SoundCommand::StopAll)
    }

    /// Snapshot of the audio statistics.
    #[must_use]
    pub fn stats(&self) -> SoundStats {
        self.stats.lock().clone()
    }

    /// Commands waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.sender.len()
    }
}

/// A cue that is currently playing.
#[derive(Clone, Copy, Debug)]
struct ActiveCue {
    cue: SoundCue,
    gain: f32,
    ends_at: Instant,
}

/// The audio subsystem, run on its own thread by the worker launcher.
pub struct SoundWorker {
    receiver: Receiver<SoundCommand>,
    control: SoundControl,
    master_volume: f32,
    idle_poll: Duration,
    drain_limit: usize,
    active: Vec<ActiveCue>,
}

impl SoundWorker {
    /// Builds the worker and its command queue. Does not start a thread.
    #[must_use]
    pub fn new(settings: &AudioSettings) -> Self {
        let capacity = settings.queue_capacity.max(1);
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        let master_volume = settings.master_volume.clamp(0.0, 1.0);
        let stats = Arc::new(Mutex::new(SoundStats {
            master_volume,
            ..SoundStats::default()
        }));

        Self {
            receiver,
            control: SoundControl { sender, stats },
            master_volume,
            idle_poll: settings.idle_poll(),
            drain_limit: capacity,
            active: Vec::with_capacity(16),
        }
    }

    fn apply(&mut self, command: SoundCommand, now: Instant) {
        match command {
            SoundCommand::Play { cue, volume } => {
                let gain = volume.clamp(0.0, 1.0) * self.master_volume;
                self.active.push(ActiveCue {
                    cue,
                    gain,
                    ends_at: now + cue.duration(),
                });
                self.control.stats.lock().played += 1;
                tracing::trace!(?cue, gain, "cue started");
            }
            SoundCommand::SetMasterVolume(volume) => {
                self.master_volume = volume.clamp(0.0, 1.0);
                self.control.stats.lock().master_volume = self.master_volume;
                tracing::debug!(volume = self.master_volume, "master volume changed");
            }
            SoundCommand::StopAll => {
                self.active.clear();
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        self.active.retain(|active| active.ends_at > now);
        self.control.stats.lock().active = self.active.len();
    }

    /// Loudest cue currently playing, if any.
    fn loudest(&self) -> Option<(SoundCue, f32)> {
        self.active
            .iter()
            .max_by(|a, b| a.gain.total_cmp(&b.gain))
            .map(|active| (active.cue, active.gain))
    }
}

impl Worker for SoundWorker {
    type Control = SoundControl;

    fn name(&self) -> &str {
        AUDIO_THREAD_NAME
    }

    fn control(&self) -> Self::Control {
        self.control.clone()
    }

    fn run(&mut self, stop: &StopSignal) {
        while !stop.is_stopped() {
            match self.receiver.recv_timeout(self.idle_poll) {
                Ok(command) => {
                    let now = Instant::now();
                    self.apply(command, now);
                    // Drain at most one queue's worth so a busy sender can't starve the stop check
                    for _ in 0..self.drain_limit {
                        let Ok(command) = self.receiver.try_recv() else {
                            break;
                        };
                        self.apply(command, now);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            self.expire(Instant::now());
        }

        if let Some((cue, gain)) = self.loudest() {
            tracing::debug!(?cue, gain, "silencing active cues on shutdown");
        }
        self.active.clear();
        self.control.stats.lock().active = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazarus_core::{WorkerExit, WorkerLauncher};
    use std::thread;

    fn settings(capacity: usize) -> AudioSettings {
        AudioSettings {
            master_volume: 0.5,
            queue_capacity: capacity,
            idle_poll_ms: 1,
        }
    }

    fn wait_for(control: &SoundControl, predicate: impl Fn(&SoundStats) -> bool) -> SoundStats {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let stats = control.stats();
            if predicate(&stats) || Instant::now() >= deadline {
                return stats;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_apply_scales_by_master_volume() {
        let mut worker = SoundWorker::new(&settings(8));
        let now = Instant::now();

        worker.apply(SoundCommand::Play { cue: SoundCue::ZombieGroan, volume: 0.8 }, now);
        let (cue, gain) = worker.loudest().unwrap();
        assert_eq!(cue, SoundCue::ZombieGroan);
        assert!((gain - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_cues_expire() {
        let mut worker = SoundWorker::new(&settings(8));
        let now = Instant::now();

        worker.apply(SoundCommand::Play { cue: SoundCue::Footstep, volume: 1.0 }, now);
        worker.apply(SoundCommand::Play { cue: SoundCue::Ambient, volume: 1.0 }, now);

        worker.expire(now + Duration::from_millis(200));
        assert_eq!(worker.control.stats().active, 1);
        assert_eq!(worker.loudest().map(|(cue, _)| cue), Some(SoundCue::Ambient));
    }

    #[test]
    fn test_busy_sender_does_not_block_stop() {
        let handle = WorkerLauncher::new().start(SoundWorker::new(&settings(4))).unwrap();
        assert!(handle.wait_until_running(Duration::from_secs(2)));

        let control = handle.control().clone();
        let flooding = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let flood_flag = Arc::clone(&flooding);
        let flooder = thread::spawn(move || {
            while flood_flag.load(std::sync::atomic::Ordering::Relaxed) {
                control.play(SoundCue::Footstep);
            }
        });

        thread::sleep(Duration::from_millis(20));
        let start = Instant::now();
        assert_eq!(handle.join(), WorkerExit::Completed);
        let elapsed = start.elapsed();

        flooding.store(false, std::sync::atomic::Ordering::Relaxed);
        flooder.join().unwrap();
        assert!(elapsed < Duration::from_secs(2), "stop took {elapsed:?}");
    }

    #[test]
    fn test_stop_all_clears_active() {
        let mut worker = SoundWorker::new(&settings(8));
        let now = Instant::now();

        worker.apply(SoundCommand::Play { cue: SoundCue::Scream, volume: 1.0 }, now);
        worker.apply(SoundCommand::StopAll, now);
        assert!(worker.loudest().is_none());
    }

    #[test]
    fn test_full_queue_drops_commands() {
        let worker = SoundWorker::new(&settings(2));
        let control = worker.control();

        assert!(control.play(SoundCue::Footstep));
        assert!(control.play(SoundCue::Footstep));
        assert!(!control.play(SoundCue::Footstep));

        assert_eq!(control.pending(), 2);
        assert_eq!(control.stats().dropped, 1);
    }

    #[test]
    fn test_worker_thread_processes_commands() {
        let handle = WorkerLauncher::new().start(SoundWorker::new(&settings(16))).unwrap();
        assert!(handle.wait_until_running(Duration::from_secs(2)));
        assert_eq!(handle.name(), AUDIO_THREAD_NAME);

        handle.control().play(SoundCue::ZombieGroan);
        handle.control().set_master_volume(0.25);

        let stats = wait_for(handle.control(), |s| {
            s.played == 1 && (s.master_volume - 0.25).abs() < 1e-6
        });
        assert_eq!(stats.played, 1);
        assert!((stats.master_volume - 0.25).abs() < 1e-6);

        let control = handle.control().clone();
        handle.join();
        assert_eq!(control.stats().active, 0);
    }

    #[test]
    fn test_stop_all_silences_running_worker() {
        let handle = WorkerLauncher::new().start(SoundWorker::new(&settings(16))).unwrap();
        assert!(handle.wait_until_running(Duration::from_secs(2)));

        handle.control().play(SoundCue::Ambient);
        handle.control().play(SoundCue::ZombieGroan);
        let stats = wait_for(handle.control(), |s| s.active == 2);
        assert_eq!(stats.active, 2);

        assert!(handle.control().stop_all());
        let stats = wait_for(handle.control(), |s| s.active == 0);
        assert_eq!(stats.active, 0);
        assert_eq!(stats.played, 2);

        assert_eq!(handle.join(), WorkerExit::Completed);
    }
}
