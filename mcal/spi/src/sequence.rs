//! Sequences, jobs and their bookkeeping
//!
//! A sequence is an ordered list of jobs defined once in the driver
//! configuration. Each job carries its own bus configuration and transmit
//! data, and receives into a buffer owned by the driver.

use core::fmt;

use heapless::{Deque, Vec};
use mcal_core::{ClockGate, RegisterAccess};

use crate::config::{DataSize, SpiConfiguration};
use crate::error::{SpiError, SpiResult};
use crate::peripheral::SpiPeripheral;
use crate::registers::SpiRegister;
use crate::transfer;
use crate::unit::Waiter;

/// Number of sequences every sequence operation is bounded by
pub const NUM_OF_SPI_SEQUENCES: u8 = 5;

/// Maximum number of jobs in one sequence
pub const MAX_JOBS_PER_SEQUENCE: usize = 4;

/// Maximum transmit/receive length of one job, in bytes
pub const JOB_BUFFER_SIZE: usize = 32;

const SEQUENCE_SLOTS: usize = NUM_OF_SPI_SEQUENCES as usize;

/// Identifier of one configured sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SequenceId(u8);

impl SequenceId {
    /// Create a sequence id, rejecting ids past [`NUM_OF_SPI_SEQUENCES`]
    pub const fn new(id: u8) -> SpiResult<Self> {
        if id < NUM_OF_SPI_SEQUENCES {
            Ok(SequenceId(id))
        } else {
            Err(SpiError::InvalidSequence(id))
        }
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    /// Every valid sequence id, in order
    pub fn all() -> impl Iterator<Item = SequenceId> {
        (0..NUM_OF_SPI_SEQUENCES).map(SequenceId)
    }
}

impl TryFrom<u8> for SequenceId {
    type Error = SpiError;

    fn try_from(id: u8) -> SpiResult<Self> {
        SequenceId::new(id)
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SPI_Sequence_{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SequenceId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "SPI_Sequence_{}", self.0);
    }
}

/// Lifecycle of one sequence submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceState {
    /// Never submitted since init
    #[default]
    Idle,
    /// Submitted, no job started yet
    Pending,
    /// At least one job started
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl SequenceState {
    /// Completed, Cancelled or Failed
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            SequenceState::Completed | SequenceState::Cancelled | SequenceState::Failed
        )
    }

    /// Pending or Running
    pub const fn is_active(self) -> bool {
        matches!(self, SequenceState::Pending | SequenceState::Running)
    }
}

impl SequenceState {
    /// Name shared by the `Display` and `defmt` output
    pub const fn name(self) -> &'static str {
        match self {
            SequenceState::Idle => "SPI_SEQ_IDLE",
            SequenceState::Pending => "SPI_SEQ_PENDING",
            SequenceState::Running => "SPI_SEQ_RUNNING",
            SequenceState::Completed => "SPI_SEQ_OK",
            SequenceState::Cancelled => "SPI_SEQ_CANCELLED",
            SequenceState::Failed => "SPI_SEQ_FAILED",
        }
    }
}

impl fmt::Display for SequenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SequenceState {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=str}", self.name());
    }
}

/// Definition of one job: a bus configuration plus the bytes to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    config: SpiConfiguration,
    tx: Vec<u8, JOB_BUFFER_SIZE>,
}

impl JobConfig {
    /// Define a job sending `tx` with `config`.
    ///
    /// Jobs move bytes, so `config` must use 8-bit frames and `tx` must fit in
    /// [`JOB_BUFFER_SIZE`].
    pub fn new(config: SpiConfiguration, tx: &[u8]) -> SpiResult<Self> {
        if config.data_size != DataSize::Bits8 {
            return Err(SpiError::InvalidArgument);
        }
        let tx = Vec::from_slice(tx).map_err(|_| SpiError::InvalidArgument)?;
        Ok(Self { config, tx })
    }

    pub fn config(&self) -> &SpiConfiguration {
        &self.config
    }

    pub fn tx(&self) -> &[u8] {
        &self.tx
    }
}

/// Ordered list of jobs making up one sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceConfig {
    jobs: Vec<JobConfig, MAX_JOBS_PER_SEQUENCE>,
}

impl SequenceConfig {
    pub const fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Append a job, failing once [`MAX_JOBS_PER_SEQUENCE`] is reached
    pub fn push(&mut self, job: JobConfig) -> SpiResult<()> {
        self.jobs.push(job).map_err(|_| SpiError::InvalidArgument)
    }

    /// Builder form of [`push`](Self::push)
    pub fn with_job(mut self, job: JobConfig) -> SpiResult<Self> {
        self.push(job)?;
        Ok(self)
    }

    pub fn jobs(&self) -> &[JobConfig] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// A job as held by the driver, with its receive buffer
#[derive(Debug)]
pub(crate) struct Job {
    config: SpiConfiguration,
    tx: Vec<u8, JOB_BUFFER_SIZE>,
    rx: Vec<u8, JOB_BUFFER_SIZE>,
}

impl Job {
    fn from_config(job: &JobConfig) -> Self {
        let mut rx = Vec::new();
        // tx and rx share a capacity
        let _ = rx.resize(job.tx.len(), 0);
        Self {
            config: job.config,
            tx: job.tx.clone(),
            rx,
        }
    }

    pub(crate) fn config(&self) -> &SpiConfiguration {
        &self.config
    }

    pub(crate) fn rx(&self) -> &[u8] {
        &self.rx
    }

    /// Whether [`run`](Self::run) programs the peripheral; an empty job does not
    pub(crate) fn applies_config(&self) -> bool {
        !self.tx.is_empty()
    }

    /// Replace the transmit data; the receive buffer follows its length
    pub(crate) fn load_tx(&mut self, data: &[u8]) -> SpiResult<()> {
        self.tx = Vec::from_slice(data).map_err(|_| SpiError::InvalidArgument)?;
        self.rx.clear();
        self.rx
            .resize(self.tx.len(), 0)
            .map_err(|_| SpiError::InvalidArgument)
    }

    /// Apply the job configuration and exchange its whole transmit buffer
    pub(crate) fn run<R, C>(
        &mut self,
        hw: &mut SpiPeripheral<R, C>,
        waiter: &Waiter,
    ) -> SpiResult<()>
    where
        R: RegisterAccess<SpiRegister>,
        C: ClockGate,
    {
        self.rx.iter_mut().for_each(|byte| *byte = 0);
        if !self.applies_config() {
            return Ok(());
        }
        hw.apply(&self.config, waiter.mode());
        transfer::exchange(hw, &self.tx, &mut self.rx, waiter)
    }
}

/// One sequence slot: its jobs and the state of the current submission
#[derive(Debug, Default)]
pub(crate) struct Sequence {
    jobs: Vec<Job, MAX_JOBS_PER_SEQUENCE>,
    state: SequenceState,
    next_job: usize,
}

impl Sequence {
    pub(crate) fn from_config(config: &SequenceConfig) -> Self {
        let mut jobs = Vec::new();
        for job in config.jobs() {
            // same capacity on both sides
            let _ = jobs.push(Job::from_config(job));
        }
        Self {
            jobs,
            state: SequenceState::Idle,
            next_job: 0,
        }
    }

    pub(crate) fn state(&self) -> SequenceState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: SequenceState) {
        self.state = state;
    }

    /// Start a new submission at Pending
    pub(crate) fn submit(&mut self) {
        self.state = SequenceState::Pending;
        self.next_job = 0;
    }

    pub(crate) fn job(&self, index: usize) -> SpiResult<&Job> {
        self.jobs.get(index).ok_or(SpiError::InvalidArgument)
    }

    pub(crate) fn job_mut(&mut self, index: usize) -> SpiResult<&mut Job> {
        self.jobs.get_mut(index).ok_or(SpiError::InvalidArgument)
    }

    /// The job the next step will run, or `None` once every job has run
    pub(crate) fn next_job_mut(&mut self) -> Option<&mut Job> {
        self.jobs.get_mut(self.next_job)
    }

    pub(crate) fn advance(&mut self) {
        self.next_job += 1;
    }

    pub(crate) fn jobs_done(&self) -> bool {
        self.next_job >= self.jobs.len()
    }

    pub(crate) fn job_count(&self) -> usize {
        self.jobs.len()
    }
}

/// FIFO of asynchronously submitted sequences.
///
/// A sequence is queued at most once at a time, so the queue never holds more
/// entries than there are sequences.
#[derive(Debug, Default)]
pub(crate) struct SequenceQueue {
    queue: Deque<SequenceId, SEQUENCE_SLOTS>,
}

impl SequenceQueue {
    pub(crate) const fn new() -> Self {
        Self {
            queue: Deque::new(),
        }
    }

    pub(crate) fn post(&mut self, id: SequenceId) -> SpiResult<()> {
        self.queue
            .push_back(id)
            .map_err(|_| SpiError::SequencePending(id.raw()))
    }

    pub(crate) fn front(&self) -> Option<SequenceId> {
        self.queue.front().copied()
    }

    pub(crate) fn pop(&mut self) -> Option<SequenceId> {
        self.queue.pop_front()
    }

    /// Drop `id` from the queue, keeping the order of the others
    pub(crate) fn remove(&mut self, id: SequenceId) {
        let mut kept = Deque::new();
        while let Some(queued) = self.queue.pop_front() {
            if queued != id {
                let _ = kept.push_back(queued);
            }
        }
        self.queue = kept;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }
}
