//! SPI handler/driver
//!
//! [`SpiDriver`] owns one SPI controller for its whole life. It tracks the
//! active bus configuration, the async mode of every hardware unit and the
//! state of every configured sequence. All blocking is spinning on hardware
//! status flags with no timeout.

use core::fmt;

use mcal_core::{ClockGate, RegisterAccess, StdReturnType};

use crate::config::SpiConfiguration;
use crate::error::{SpiError, SpiResult};
use crate::peripheral::SpiPeripheral;
use crate::registers::SpiRegister;
use crate::sequence::{
    Sequence, SequenceConfig, SequenceId, SequenceQueue, SequenceState, NUM_OF_SPI_SEQUENCES,
};
use crate::transfer::{self, Word};
use crate::unit::{AsyncMode, HwUnit, Waiter, NUM_OF_SPI_HW_UNITS};

const SEQUENCE_SLOTS: usize = NUM_OF_SPI_SEQUENCES as usize;
const UNIT_SLOTS: usize = NUM_OF_SPI_HW_UNITS as usize;

/// Static driver configuration.
///
/// Names the hardware unit this driver instance drives, the sequence table
/// and the wait behaviour.
#[derive(Debug, Clone)]
pub struct SpiDriverConfig {
    pub hw_unit: HwUnit,
    pub async_mode: AsyncMode,
    /// Called between status polls while waiting in Interrupt mode
    pub idle_hook: Option<fn()>,
    pub sequences: [SequenceConfig; SEQUENCE_SLOTS],
}

impl Default for SpiDriverConfig {
    fn default() -> Self {
        Self {
            hw_unit: HwUnit::UNIT0,
            async_mode: AsyncMode::Polling,
            idle_hook: None,
            sequences: Default::default(),
        }
    }
}

impl SpiDriverConfig {
    /// Creates a new driver configuration builder.
    pub fn builder() -> SpiDriverConfigBuilder {
        SpiDriverConfigBuilder::default()
    }
}

/// Builder for ergonomic driver configuration construction.
#[derive(Debug, Clone, Default)]
pub struct SpiDriverConfigBuilder {
    config: SpiDriverConfig,
}

impl SpiDriverConfigBuilder {
    pub fn hw_unit(mut self, unit: HwUnit) -> Self {
        self.config.hw_unit = unit;
        self
    }

    /// Sets the async mode the driven unit starts in.
    pub fn async_mode(mut self, mode: AsyncMode) -> Self {
        self.config.async_mode = mode;
        self
    }

    /// Sets the idle hook.
    ///
    /// The hook runs between status polls in Interrupt mode, typically a
    /// wait-for-interrupt instruction.
    pub fn idle_hook(mut self, hook: fn()) -> Self {
        self.config.idle_hook = Some(hook);
        self
    }

    /// Defines the jobs of one sequence.
    pub fn sequence(mut self, id: SequenceId, sequence: SequenceConfig) -> Self {
        self.config.sequences[id.index()] = sequence;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> SpiDriverConfig {
        self.config
    }
}

/// Overall driver state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiStatus {
    /// Not initialized, or de-initialized
    Uninit,
    Idle,
    /// The peripheral is busy or a sequence is pending or running
    Busy,
}

impl fmt::Display for SpiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpiStatus::Uninit => write!(f, "SPI_UNINIT"),
            SpiStatus::Idle => write!(f, "SPI_IDLE"),
            SpiStatus::Busy => write!(f, "SPI_BUSY"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SpiStatus {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            SpiStatus::Uninit => defmt::write!(fmt, "SPI_UNINIT"),
            SpiStatus::Idle => defmt::write!(fmt, "SPI_IDLE"),
            SpiStatus::Busy => defmt::write!(fmt, "SPI_BUSY"),
        }
    }
}

/// SPI driver for one hardware unit
pub struct SpiDriver<R, C> {
    hw: SpiPeripheral<R, C>,
    unit: HwUnit,
    modes: [AsyncMode; UNIT_SLOTS],
    idle_hook: Option<fn()>,
    active: Option<SpiConfiguration>,
    sequences: [Sequence; SEQUENCE_SLOTS],
    queue: SequenceQueue,
}

impl<R: RegisterAccess<SpiRegister>, C: ClockGate> SpiDriver<R, C> {
    /// Create a driver over the register block `regs` gated by `clock`.
    ///
    /// Nothing is written to the hardware until [`init`](Self::init).
    pub fn new(regs: R, clock: C, config: SpiDriverConfig) -> Self {
        let mut modes = [AsyncMode::Polling; UNIT_SLOTS];
        modes[config.hw_unit.index()] = config.async_mode;

        Self {
            hw: SpiPeripheral::new(regs, clock),
            unit: config.hw_unit,
            modes,
            idle_hook: config.idle_hook,
            active: None,
            sequences: core::array::from_fn(|slot| Sequence::from_config(&config.sequences[slot])),
            queue: SequenceQueue::new(),
        }
    }

    /// Apply `config` to the peripheral and enable its clock.
    ///
    /// Replaces any previous configuration wholesale.
    pub fn init(&mut self, config: &SpiConfiguration) {
        self.configure(config);
        log::debug!("spi: {} initialized ({})", self.unit, config);
    }

    /// Return the peripheral to its unconfigured state.
    ///
    /// Sequence bookkeeping is cleared; [`init`](Self::init) must be called
    /// again before the next transfer.
    pub fn deinit(&mut self) {
        self.hw.shut_down();
        self.active = None;
        self.queue.clear();
        for sequence in self.sequences.iter_mut() {
            sequence.set_state(SequenceState::Idle);
        }
        log::debug!("spi: {} de-initialized", self.unit);
    }

    /// Write one unit once the transmit buffer is empty.
    ///
    /// Spins on TXE without timeout. The unit shifted in at the same time is
    /// left in the data register.
    pub fn write_immediate<W: Word>(&mut self, word: W) -> SpiResult<()> {
        let config = self.active_or_err()?;
        transfer::check_word::<W>(&config)?;
        let waiter = self.waiter();
        transfer::write_word(&mut self.hw, word, &waiter)?;
        log::trace!("spi: wrote {:#x}", word.into_u32());
        Ok(())
    }

    /// Re-apply `config`, then exchange `length` units from `src` into `dst`.
    ///
    /// Every unit is written, then its answer read, before the next one is
    /// sent. The first failure aborts the exchange: `dst` keeps the units
    /// received so far and nothing past the failing index is written.
    /// `length == 0` succeeds without touching the hardware.
    pub fn buffered_exchange<W: Word>(
        &mut self,
        config: &SpiConfiguration,
        src: &[W],
        dst: &mut [W],
        length: usize,
    ) -> SpiResult<()> {
        transfer::check_buffers::<W>(config, src.len(), dst.len(), length)?;
        if length == 0 {
            return Ok(());
        }

        self.configure(config);
        let waiter = self.waiter();
        transfer::exchange(&mut self.hw, &src[..length], &mut dst[..length], &waiter)
    }

    /// `NotOk` while the peripheral reports busy, `Ok` otherwise
    pub fn status(&self) -> StdReturnType {
        if self.hw.is_busy() {
            StdReturnType::NotOk
        } else {
            StdReturnType::Ok
        }
    }

    /// Completion of the last transfer: `Ok` once the peripheral is idle
    pub fn job_result(&self) -> StdReturnType {
        self.status()
    }

    /// Driver-level state, including queued sequences
    pub fn driver_status(&self) -> SpiStatus {
        if self.active.is_none() {
            SpiStatus::Uninit
        } else if self.hw.is_busy() || !self.queue.is_empty() {
            SpiStatus::Busy
        } else {
            SpiStatus::Idle
        }
    }

    /// Run every job of sequence `id` in order and return once all are done.
    ///
    /// A sequence without jobs completes immediately.
    pub fn sync_transmit(&mut self, id: SequenceId) -> SpiResult<()> {
        self.active_or_err()?;
        self.submit(id)?;
        log::debug!("spi: {} sync transmit", id);

        let waiter = self.waiter();
        loop {
            match self.step(id, &waiter) {
                Ok(SequenceState::Completed) => return Ok(()),
                Ok(_) => {}
                Err(err) => return Err(err),
            }
        }
    }

    /// Queue sequence `id` for [`main_function_handling`](Self::main_function_handling).
    ///
    /// No bus activity happens here.
    pub fn async_transmit(&mut self, id: SequenceId) -> SpiResult<()> {
        self.active_or_err()?;
        self.submit(id)?;
        if let Err(err) = self.queue.post(id) {
            self.sequences[id.index()].set_state(SequenceState::Idle);
            return Err(err);
        }
        log::debug!("spi: {} queued", id);
        Ok(())
    }

    /// Advance the oldest queued sequence by one job.
    ///
    /// Does nothing when no sequence is queued or the driver is not
    /// initialized.
    pub fn main_function_handling(&mut self) {
        if self.active.is_none() {
            return;
        }
        let Some(id) = self.queue.front() else {
            return;
        };

        let waiter = self.waiter();
        match self.step(id, &waiter) {
            Ok(SequenceState::Completed) | Err(_) => {
                self.queue.pop();
            }
            Ok(_) => {}
        }
    }

    /// Mark a pending or running sequence as cancelled.
    ///
    /// Has no effect on sequences in any other state. A unit already being
    /// shifted is not interrupted.
    pub fn cancel(&mut self, id: SequenceId) {
        let sequence = &mut self.sequences[id.index()];
        if sequence.state().is_active() {
            sequence.set_state(SequenceState::Cancelled);
            self.queue.remove(id);
            log::debug!("spi: {} cancelled", id);
        }
    }

    /// State of the last submission of sequence `id`
    pub fn sequence_result(&self, id: SequenceId) -> SequenceState {
        self.sequences[id.index()].state()
    }

    /// Record the async mode of `unit` for subsequent transfers.
    ///
    /// When `unit` is the one this driver drives and it is initialized, the
    /// interrupt and DMA enables are reprogrammed right away.
    pub fn set_async_mode(&mut self, unit: HwUnit, mode: AsyncMode) {
        self.modes[unit.index()] = mode;
        if unit == self.unit && self.active.is_some() {
            self.hw.set_async_mode(mode);
        }
        log::debug!("spi: {} set to {}", unit, mode);
    }

    pub fn async_mode(&self, unit: HwUnit) -> AsyncMode {
        self.modes[unit.index()]
    }

    /// Replace the transmit data of one job
    pub fn load_job_tx(&mut self, id: SequenceId, job: usize, data: &[u8]) -> SpiResult<()> {
        let sequence = &mut self.sequences[id.index()];
        if sequence.state().is_active() {
            return Err(SpiError::SequencePending(id.raw()));
        }
        sequence.job_mut(job)?.load_tx(data)
    }

    /// Data received by one job during its last run
    pub fn job_rx(&self, id: SequenceId, job: usize) -> SpiResult<&[u8]> {
        Ok(self.sequences[id.index()].job(job)?.rx())
    }

    /// The configuration last applied to the peripheral
    pub fn active_config(&self) -> Option<&SpiConfiguration> {
        self.active.as_ref()
    }

    /// Hardware unit driven by this instance
    pub fn hw_unit(&self) -> HwUnit {
        self.unit
    }

    pub fn peripheral(&self) -> &SpiPeripheral<R, C> {
        &self.hw
    }

    /// Release the register block and clock gate
    pub fn release(self) -> (R, C) {
        self.hw.release()
    }

    fn configure(&mut self, config: &SpiConfiguration) {
        let mode = self.modes[self.unit.index()];
        self.hw.apply(config, mode);
        self.active = Some(*config);
    }

    fn active_or_err(&self) -> SpiResult<SpiConfiguration> {
        self.active.ok_or(SpiError::Uninitialized)
    }

    pub(crate) fn waiter(&self) -> Waiter {
        Waiter::new(self.modes[self.unit.index()], self.idle_hook)
    }

    /// Active configuration, for word-level use by the bus interface
    pub(crate) fn bus_config(&self) -> SpiResult<SpiConfiguration> {
        self.active_or_err()
    }

    pub(crate) fn hw_mut(&mut self) -> &mut SpiPeripheral<R, C> {
        &mut self.hw
    }

    fn submit(&mut self, id: SequenceId) -> SpiResult<()> {
        let sequence = &mut self.sequences[id.index()];
        if sequence.state().is_active() {
            log::warn!("spi: {} already {}", id, sequence.state());
            return Err(SpiError::SequencePending(id.raw()));
        }
        sequence.submit();
        Ok(())
    }

    /// Run the next job of sequence `id`, completing it after its last job
    fn step(&mut self, id: SequenceId, waiter: &Waiter) -> SpiResult<SequenceState> {
        let sequence = &mut self.sequences[id.index()];
        if sequence.state() == SequenceState::Pending {
            sequence.set_state(SequenceState::Running);
        }

        if let Some(job) = sequence.next_job_mut() {
            let result = job.run(&mut self.hw, waiter);
            if job.applies_config() {
                self.active = Some(*job.config());
            }
            if let Err(err) = result {
                sequence.set_state(SequenceState::Failed);
                log::warn!("spi: {} failed: {}", id, err);
                return Err(err);
            }
            sequence.advance();
        }

        if sequence.jobs_done() {
            if let Err(err) = transfer::wait_idle(&self.hw, waiter) {
                sequence.set_state(SequenceState::Failed);
                return Err(err);
            }
            sequence.set_state(SequenceState::Completed);
            log::debug!("spi: {} completed ({} jobs)", id, sequence.job_count());
        }
        Ok(sequence.state())
    }
}

impl<R, C> fmt::Debug for SpiDriver<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpiDriver")
            .field("unit", &self.unit)
            .field("modes", &self.modes)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
