//! Matchmaking queue: a waiting list of players whose acceptable-rating
//! windows widen with time in the queue.
//!
//! The matcher is greedy, not optimal: a scan accepts the first candidate
//! with mutual window containment, preferring earlier-enqueued players.
//! That bounds an attempt at O(queue length) and, because the window
//! half-width grows without bound, guarantees any two waiting players
//! eventually match.
//!
//! # Concurrency
//!
//! One mutex around the whole queue; enqueue, dequeue, and matching never
//! interleave. The queue is not a hot path, so a global lock is enough.

use tokio::sync::Mutex;

use crate::domain::foundation::{ConnectionId, DomainError, Timestamp};
use crate::domain::player::PlayerProfile;

/// Inclusive rating range a queued player currently accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingWindow {
    pub min: i32,
    pub max: i32,
}

impl RatingWindow {
    fn contains(&self, rating: i32) -> bool {
        rating >= self.min && rating <= self.max
    }
}

/// One waiting player.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub conn: ConnectionId,
    pub profile: PlayerProfile,
    pub enqueued_at: Timestamp,
    pub window: RatingWindow,
}

/// FIFO queue with independently expanding rating windows.
pub struct MatchmakingQueue {
    entries: Mutex<Vec<QueueEntry>>,
    /// Initial window half-width.
    initial_range: i32,
    /// Half-width added per elapsed interval.
    expansion_step: i32,
    /// Seconds between expansions.
    expand_interval_secs: u64,
}

impl MatchmakingQueue {
    pub fn new(initial_range: i32, expansion_step: i32, expand_interval_secs: u64) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            initial_range,
            expansion_step,
            expand_interval_secs,
        }
    }

    /// Window half-width after `elapsed_secs` in the queue. Deterministic in
    /// elapsed time only, so re-computation never drifts and never shrinks.
    fn half_width(&self, elapsed_secs: u64) -> i32 {
        let expansions = (elapsed_secs / self.expand_interval_secs) as i32;
        self.initial_range + expansions * self.expansion_step
    }

    fn refresh_window(&self, entry: &mut QueueEntry, now: Timestamp) {
        let half = self.half_width(now.secs_since(&entry.enqueued_at));
        entry.window = RatingWindow {
            min: entry.profile.rating - half,
            max: entry.profile.rating + half,
        };
    }

    fn mutual_fit(a: &QueueEntry, b: &QueueEntry) -> bool {
        a.window.contains(b.profile.rating) && b.window.contains(a.profile.rating)
    }

    /// Adds a player to the queue with a fresh window.
    ///
    /// # Errors
    ///
    /// - `AlreadyQueued` when the connection is already waiting
    pub async fn enqueue(
        &self,
        conn: ConnectionId,
        profile: PlayerProfile,
    ) -> Result<(), DomainError> {
        let mut entries = self.entries.lock().await;
        if entries.iter().any(|e| e.conn == conn) {
            return Err(DomainError::AlreadyQueued);
        }

        let now = Timestamp::now();
        let half = self.half_width(0);
        tracing::debug!(conn = %conn, rating = profile.rating, "player queued");
        entries.push(QueueEntry {
            conn,
            profile: profile.clone(),
            enqueued_at: now,
            window: RatingWindow {
                min: profile.rating - half,
                max: profile.rating + half,
            },
        });
        Ok(())
    }

    /// Removes a player; no-op when absent. Returns whether it was present.
    pub async fn dequeue(&self, conn: ConnectionId) -> bool {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|e| e.conn != conn);
        entries.len() != before
    }

    pub async fn is_queued(&self, conn: ConnectionId) -> bool {
        self.entries.lock().await.iter().any(|e| e.conn == conn)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Tries to match one player against the rest of the queue.
    ///
    /// Refreshes the caller's window, then scans the queue in enqueue order
    /// (refreshing each candidate as it is visited) for the first mutual
    /// fit. Both entries are removed on a hit.
    pub async fn attempt_match(&self, conn: ConnectionId) -> Option<(QueueEntry, QueueEntry)> {
        self.attempt_match_at(conn, Timestamp::now()).await
    }

    async fn attempt_match_at(
        &self,
        conn: ConnectionId,
        now: Timestamp,
    ) -> Option<(QueueEntry, QueueEntry)> {
        let mut entries = self.entries.lock().await;

        let idx = entries.iter().position(|e| e.conn == conn)?;
        let mut me = entries[idx].clone();
        self.refresh_window(&mut me, now);
        entries[idx].window = me.window;

        let mut found = None;
        for (i, candidate) in entries.iter_mut().enumerate() {
            if i == idx {
                continue;
            }
            self.refresh_window(candidate, now);
            if Self::mutual_fit(&me, candidate) {
                found = Some(i);
                break;
            }
        }

        let other_idx = found?;
        let other = entries[other_idx].clone();
        // Remove the later index first so the earlier one stays valid.
        let (hi, lo) = if idx > other_idx { (idx, other_idx) } else { (other_idx, idx) };
        entries.remove(hi);
        entries.remove(lo);

        tracing::info!(
            a = %me.conn,
            b = %other.conn,
            gap = (me.profile.rating - other.profile.rating).abs(),
            "players matched"
        );
        Some((me, other))
    }

    /// Pairs as many waiting players as possible; used by the periodic
    /// sweep so players match even when nobody new arrives.
    pub async fn sweep_all(&self) -> Vec<(QueueEntry, QueueEntry)> {
        self.sweep_all_at(Timestamp::now()).await
    }

    async fn sweep_all_at(&self, now: Timestamp) -> Vec<(QueueEntry, QueueEntry)> {
        let mut entries = self.entries.lock().await;
        for entry in entries.iter_mut() {
            let mut e = entry.clone();
            self.refresh_window(&mut e, now);
            entry.window = e.window;
        }

        let mut pairs = Vec::new();
        // Greedy pairing repeated until no mutual fit remains.
        loop {
            let mut hit = None;
            'outer: for i in 0..entries.len() {
                for j in (i + 1)..entries.len() {
                    if Self::mutual_fit(&entries[i], &entries[j]) {
                        hit = Some((i, j));
                        break 'outer;
                    }
                }
            }

            match hit {
                Some((i, j)) => {
                    let b = entries.remove(j);
                    let a = entries.remove(i);
                    pairs.push((a, b));
                }
                None => break,
            }
        }

        pairs
    }

    /// Coarse wait estimate for the client, in seconds.
    pub async fn estimated_wait_secs(&self, conn: ConnectionId) -> u64 {
        let entries = self.entries.lock().await;
        if !entries.iter().any(|e| e.conn == conn) {
            return 0;
        }
        match entries.len() {
            0..=1 => 30,
            2..=5 => 15,
            _ => 5,
        }
    }
}
