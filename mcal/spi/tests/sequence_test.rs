//! Sequence submission, scheduling and cancellation tests

use mcal_core::StdReturnType;
use mcal_spi::registers::{cr1, sr};
use mcal_spi::sim::{sim_clock, LoopbackSpi, SimClock};
use mcal_spi::{
    BitOrder, JobConfig, SequenceConfig, SequenceId, SequenceState, SpiConfiguration, SpiDriver,
    SpiDriverConfig, SpiError, SpiStatus, JOB_BUFFER_SIZE,
};

type SimSpi = SpiDriver<LoopbackSpi, SimClock>;

const TWO_JOBS: u8 = 0;
const EMPTY: u8 = 1;
const ONE_JOB: u8 = 2;
const LSB_JOB: u8 = 3;
const EMPTY_LSB_JOB: u8 = 4;

fn seq(id: u8) -> SequenceId {
    SequenceId::new(id).unwrap()
}

fn job(tx: &[u8]) -> JobConfig {
    JobConfig::new(SpiConfiguration::default(), tx).unwrap()
}

fn driver() -> SimSpi {
    let lsb = SpiConfiguration::builder().bit_order(BitOrder::LsbFirst).build();
    let config = SpiDriverConfig::builder()
        .sequence(
            seq(TWO_JOBS),
            SequenceConfig::new()
                .with_job(job(&[1, 2, 3]))
                .unwrap()
                .with_job(job(&[0xA0, 0xA1]))
                .unwrap(),
        )
        .sequence(seq(ONE_JOB), SequenceConfig::new().with_job(job(&[7])).unwrap())
        .sequence(
            seq(LSB_JOB),
            SequenceConfig::new()
                .with_job(JobConfig::new(lsb, &[0x80]).unwrap())
                .unwrap(),
        )
        .sequence(
            seq(EMPTY_LSB_JOB),
            SequenceConfig::new()
                .with_job(JobConfig::new(lsb, &[]).unwrap())
                .unwrap(),
        )
        .build();

    let mut spi = SpiDriver::new(LoopbackSpi::new(), sim_clock(), config);
    spi.init(&SpiConfiguration::default());
    spi
}

fn sim(spi: &SimSpi) -> &LoopbackSpi {
    spi.peripheral().regs()
}

#[test]
fn test_sequences_start_idle() {
    let spi = driver();
    for id in SequenceId::all() {
        assert_eq!(spi.sequence_result(id), SequenceState::Idle);
    }
}

#[test]
fn test_sync_transmit_runs_jobs_in_order() {
    let mut spi = driver();
    assert_eq!(spi.sync_transmit(seq(TWO_JOBS)), Ok(()));

    assert_eq!(spi.sequence_result(seq(TWO_JOBS)), SequenceState::Completed);
    assert_eq!(sim(&spi).transmitted(), &[1, 2, 3, 0xA0, 0xA1]);
    assert_eq!(spi.job_rx(seq(TWO_JOBS), 0), Ok(&[1u8, 2, 3][..]));
    assert_eq!(spi.job_rx(seq(TWO_JOBS), 1), Ok(&[0xA0u8, 0xA1][..]));
}

#[test]
fn test_sync_transmit_empty_sequence_completes() {
    let mut spi = driver();
    assert_eq!(spi.sync_transmit(seq(EMPTY)), Ok(()));
    assert_eq!(spi.sequence_result(seq(EMPTY)), SequenceState::Completed);
    assert_eq!(sim(&spi).units_sent(), 0);
}

#[test]
fn test_sync_transmit_requires_init() {
    let mut spi = driver();
    spi.deinit();
    assert_eq!(spi.sync_transmit(seq(ONE_JOB)), Err(SpiError::Uninitialized));
    assert_eq!(spi.sequence_result(seq(ONE_JOB)), SequenceState::Idle);
}

#[test]
fn test_sequence_never_completes_while_busy() {
    let mut spi = driver();
    sim(&spi).busy_after_write(6);

    assert_eq!(spi.sync_transmit(seq(ONE_JOB)), Ok(()));
    assert_eq!(spi.sequence_result(seq(ONE_JOB)), SequenceState::Completed);
    assert_eq!(spi.job_result(), StdReturnType::Ok);
}

#[test]
fn test_job_applies_its_configuration() {
    let mut spi = driver();
    spi.sync_transmit(seq(LSB_JOB)).unwrap();

    assert_ne!(sim(&spi).cr1() & cr1::LSBFIRST, 0);
    assert_eq!(
        spi.active_config().map(|config| config.bit_order),
        Some(BitOrder::LsbFirst)
    );
}

#[test]
fn test_state_display_uses_state_name() {
    for state in [
        SequenceState::Idle,
        SequenceState::Pending,
        SequenceState::Running,
        SequenceState::Completed,
        SequenceState::Cancelled,
        SequenceState::Failed,
    ] {
        assert_eq!(state.to_string(), state.name());
    }
    assert_eq!(SequenceState::Completed.to_string(), "SPI_SEQ_OK");
}

#[test]
fn test_empty_job_keeps_active_configuration() {
    let mut spi = driver();
    spi.sync_transmit(seq(EMPTY_LSB_JOB)).unwrap();

    assert_eq!(spi.sequence_result(seq(EMPTY_LSB_JOB)), SequenceState::Completed);
    assert_eq!(sim(&spi).cr1() & cr1::LSBFIRST, 0);
    assert_eq!(
        spi.active_config().map(|config| config.bit_order),
        Some(BitOrder::MsbFirst)
    );
    assert_eq!(sim(&spi).units_sent(), 0);
}

#[test]
fn test_failed_job_fails_sequence() {
    let mut spi = driver();
    sim(&spi).fail_after(1, sr::OVR);

    assert_eq!(spi.sync_transmit(seq(TWO_JOBS)), Err(SpiError::Overrun));
    assert_eq!(spi.sequence_result(seq(TWO_JOBS)), SequenceState::Failed);
    assert_eq!(sim(&spi).units_sent(), 1);
    assert_eq!(spi.job_rx(seq(TWO_JOBS), 0), Ok(&[0u8, 0, 0][..]));
}

#[test]
fn test_terminal_sequence_can_be_resubmitted() {
    let mut spi = driver();
    sim(&spi).fail_after(1, sr::OVR);
    assert!(spi.sync_transmit(seq(TWO_JOBS)).is_err());

    assert_eq!(spi.sync_transmit(seq(TWO_JOBS)), Ok(()));
    assert_eq!(spi.sequence_result(seq(TWO_JOBS)), SequenceState::Completed);

    assert_eq!(spi.sync_transmit(seq(TWO_JOBS)), Ok(()));
    assert_eq!(spi.sequence_result(seq(TWO_JOBS)), SequenceState::Completed);
}

#[test]
fn test_async_transmit_one_job_per_step() {
    let mut spi = driver();
    assert_eq!(spi.async_transmit(seq(TWO_JOBS)), Ok(()));
    assert_eq!(spi.sequence_result(seq(TWO_JOBS)), SequenceState::Pending);
    assert_eq!(sim(&spi).units_sent(), 0);
    assert_eq!(spi.driver_status(), SpiStatus::Busy);

    spi.main_function_handling();
    assert_eq!(spi.sequence_result(seq(TWO_JOBS)), SequenceState::Running);
    assert_eq!(sim(&spi).units_sent(), 3);

    spi.main_function_handling();
    assert_eq!(spi.sequence_result(seq(TWO_JOBS)), SequenceState::Completed);
    assert_eq!(sim(&spi).units_sent(), 5);
    assert_eq!(spi.driver_status(), SpiStatus::Idle);

    spi.main_function_handling();
    assert_eq!(sim(&spi).units_sent(), 5);
}

#[test]
fn test_async_queue_is_fifo() {
    let mut spi = driver();
    spi.async_transmit(seq(ONE_JOB)).unwrap();
    spi.async_transmit(seq(TWO_JOBS)).unwrap();

    while spi.driver_status() == SpiStatus::Busy {
        spi.main_function_handling();
    }
    assert_eq!(sim(&spi).transmitted(), &[7, 1, 2, 3, 0xA0, 0xA1]);
    assert_eq!(spi.sequence_result(seq(ONE_JOB)), SequenceState::Completed);
    assert_eq!(spi.sequence_result(seq(TWO_JOBS)), SequenceState::Completed);
}

#[test]
fn test_submit_while_pending_is_rejected() {
    let mut spi = driver();
    spi.async_transmit(seq(TWO_JOBS)).unwrap();

    assert_eq!(
        spi.async_transmit(seq(TWO_JOBS)),
        Err(SpiError::SequencePending(TWO_JOBS))
    );
    assert_eq!(
        spi.sync_transmit(seq(TWO_JOBS)),
        Err(SpiError::SequencePending(TWO_JOBS))
    );
    assert_eq!(spi.sequence_result(seq(TWO_JOBS)), SequenceState::Pending);
}

#[test]
fn test_cancel_pending_sequence() {
    let mut spi = driver();
    spi.async_transmit(seq(TWO_JOBS)).unwrap();
    spi.cancel(seq(TWO_JOBS));

    assert_eq!(spi.sequence_result(seq(TWO_JOBS)), SequenceState::Cancelled);
    spi.main_function_handling();
    assert_eq!(sim(&spi).units_sent(), 0);
    assert_eq!(spi.driver_status(), SpiStatus::Idle);
}

#[test]
fn test_cancel_between_jobs() {
    let mut spi = driver();
    spi.async_transmit(seq(TWO_JOBS)).unwrap();
    spi.main_function_handling();
    assert_eq!(spi.sequence_result(seq(TWO_JOBS)), SequenceState::Running);

    spi.cancel(seq(TWO_JOBS));
    assert_eq!(spi.sequence_result(seq(TWO_JOBS)), SequenceState::Cancelled);

    spi.main_function_handling();
    assert_eq!(sim(&spi).units_sent(), 3);
    assert_eq!(spi.sequence_result(seq(TWO_JOBS)), SequenceState::Cancelled);
}

#[test]
fn test_cancel_leaves_other_states_alone() {
    let mut spi = driver();
    spi.cancel(seq(EMPTY));
    assert_eq!(spi.sequence_result(seq(EMPTY)), SequenceState::Idle);

    spi.sync_transmit(seq(ONE_JOB)).unwrap();
    spi.cancel(seq(ONE_JOB));
    assert_eq!(spi.sequence_result(seq(ONE_JOB)), SequenceState::Completed);
}

#[test]
fn test_cancel_keeps_rest_of_queue() {
    let mut spi = driver();
    spi.async_transmit(seq(TWO_JOBS)).unwrap();
    spi.async_transmit(seq(ONE_JOB)).unwrap();
    spi.cancel(seq(TWO_JOBS));

    spi.main_function_handling();
    assert_eq!(spi.sequence_result(seq(ONE_JOB)), SequenceState::Completed);
    assert_eq!(sim(&spi).transmitted(), &[7]);
}

#[test]
fn test_load_job_tx() {
    let mut spi = driver();
    assert_eq!(spi.load_job_tx(seq(ONE_JOB), 0, &[9, 8]), Ok(()));
    spi.sync_transmit(seq(ONE_JOB)).unwrap();
    assert_eq!(spi.job_rx(seq(ONE_JOB), 0), Ok(&[9u8, 8][..]));

    assert_eq!(
        spi.load_job_tx(seq(ONE_JOB), 1, &[1]),
        Err(SpiError::InvalidArgument)
    );
    assert_eq!(
        spi.load_job_tx(seq(ONE_JOB), 0, &[0; JOB_BUFFER_SIZE + 1]),
        Err(SpiError::InvalidArgument)
    );
    assert_eq!(spi.job_rx(seq(EMPTY), 0), Err(SpiError::InvalidArgument));
}

#[test]
fn test_load_job_tx_while_pending() {
    let mut spi = driver();
    spi.async_transmit(seq(ONE_JOB)).unwrap();
    assert_eq!(
        spi.load_job_tx(seq(ONE_JOB), 0, &[1]),
        Err(SpiError::SequencePending(ONE_JOB))
    );
}

#[test]
fn test_deinit_clears_sequences() {
    let mut spi = driver();
    spi.sync_transmit(seq(ONE_JOB)).unwrap();
    spi.async_transmit(seq(TWO_JOBS)).unwrap();

    spi.deinit();
    assert_eq!(spi.sequence_result(seq(TWO_JOBS)), SequenceState::Idle);
    assert_eq!(spi.sequence_result(seq(ONE_JOB)), SequenceState::Idle);

    spi.main_function_handling();
    assert_eq!(sim(&spi).units_sent(), 1);
}
